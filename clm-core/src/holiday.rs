//! Derived holiday pay: the unused-holiday answer combined with a stored
//! arithmetic operation.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn all() -> &'static [Operation] {
        &[
            Operation::Add,
            Operation::Subtract,
            Operation::Multiply,
            Operation::Divide,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    pub fn next(&self) -> Operation {
        let all = Operation::all();
        let pos = all.iter().position(|op| op == self).unwrap_or(0);
        all[(pos + 1) % all.len()]
    }
}

impl FromStr for Operation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::all()
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// An operation and its operand, as kept in the local store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HolidayOperation {
    pub operation: Operation,
    pub value: f64,
}

impl HolidayOperation {
    /// Build from the stored strings. Either part missing or unparsable
    /// means there is no operation.
    pub fn from_stored(operation: Option<&str>, value: Option<&str>) -> Option<Self> {
        Some(Self {
            operation: operation?.parse().ok()?,
            value: parse_float(value?)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HolidayPay {
    Value(f64),
    /// Division by zero.
    Error,
}

impl fmt::Display for HolidayPay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolidayPay::Value(v) => f.write_str(&format_number(*v)),
            HolidayPay::Error => f.write_str("Error"),
        }
    }
}

/// Apply `op` to the answer, rounded to two decimals first. A malformed
/// answer yields `None`.
pub fn calculate(answer: &str, op: &HolidayOperation) -> Option<HolidayPay> {
    let days = round2(parse_float(answer)?);
    let pay = match op.operation {
        Operation::Add => HolidayPay::Value(days + op.value),
        Operation::Subtract => HolidayPay::Value(days - op.value),
        Operation::Multiply => HolidayPay::Value(days * op.value),
        Operation::Divide if op.value == 0.0 => HolidayPay::Error,
        Operation::Divide => HolidayPay::Value(days / op.value),
    };
    Some(pay)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Parse the leading number of `s`, ignoring trailing junk (`"12 days"` is
/// 12). `None` when there is no leading number.
pub fn parse_float(s: &str) -> Option<f64> {
    static LEADING_NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_NUMBER.get_or_init(|| {
        Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?")
            .expect("Invalid number pattern")
    });
    let m = re.find(s.trim_start())?;
    m.as_str().parse().ok().filter(|v: &f64| v.is_finite())
}

/// Shortest form: integers without a fraction, everything else as is.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        // no "-0"
        return "0".to_string();
    }
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(operation: Operation, value: f64) -> HolidayOperation {
        HolidayOperation { operation, value }
    }

    #[test]
    fn test_operations() {
        assert_eq!(calculate("10", &op(Operation::Add, 2.5)), Some(HolidayPay::Value(12.5)));
        assert_eq!(calculate("10", &op(Operation::Subtract, 4.0)), Some(HolidayPay::Value(6.0)));
        assert_eq!(calculate("10", &op(Operation::Multiply, 150.0)), Some(HolidayPay::Value(1500.0)));
        assert_eq!(calculate("10", &op(Operation::Divide, 4.0)), Some(HolidayPay::Value(2.5)));
    }

    #[test]
    fn test_divide_by_zero_is_error_sentinel() {
        let pay = calculate("10", &op(Operation::Divide, 0.0)).unwrap();
        assert_eq!(pay, HolidayPay::Error);
        assert_eq!(pay.to_string(), "Error");
    }

    #[test]
    fn test_answer_is_rounded_then_parsed_leniently() {
        assert_eq!(calculate("1.005 days", &op(Operation::Multiply, 1.0)), Some(HolidayPay::Value(1.0)));
        assert_eq!(calculate("2.499", &op(Operation::Add, 0.0)), Some(HolidayPay::Value(2.5)));
        assert_eq!(calculate("abc", &op(Operation::Add, 1.0)), None);
        assert_eq!(calculate("", &op(Operation::Add, 1.0)), None);
    }

    #[test]
    fn test_operation_from_stored_strings() {
        assert_eq!(
            HolidayOperation::from_stored(Some("Multiply"), Some("100")),
            Some(op(Operation::Multiply, 100.0))
        );
        assert_eq!(HolidayOperation::from_stored(Some("modulo"), Some("1")), None);
        assert_eq!(HolidayOperation::from_stored(Some("add"), None), None);
        assert_eq!(Operation::Divide.next(), Operation::Add);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(1500.0), "1500");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(HolidayPay::Value(3.0).to_string(), "3");
    }
}
