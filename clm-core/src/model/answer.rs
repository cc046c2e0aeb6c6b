use serde::{Deserialize, Serialize};

/// Currencies offered for the salary question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Inr,
    Sek,
    Aud,
    Jpy,
    Cad,
    Chf,
}

impl Currency {
    pub fn all() -> &'static [Currency] {
        &[
            Currency::Usd,
            Currency::Eur,
            Currency::Gbp,
            Currency::Inr,
            Currency::Sek,
            Currency::Aud,
            Currency::Jpy,
            Currency::Cad,
            Currency::Chf,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
            Currency::Sek => "SEK",
            Currency::Aud => "AUD",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
        }
    }

    /// Next currency in picker order, wrapping around.
    pub fn next(&self) -> Currency {
        let all = Currency::all();
        let pos = all.iter().position(|c| c == self).unwrap_or(0);
        all[(pos + 1) % all.len()]
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Usd
    }
}

/// Structured answer for the salary question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SalaryAnswer {
    pub amount: String,
    pub currency: Option<Currency>,
}

impl SalaryAnswer {
    pub fn new(amount: impl Into<String>, currency: Currency) -> Self {
        Self {
            amount: amount.into(),
            currency: Some(currency),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.amount.trim().is_empty() && self.currency.is_some()
    }
}

/// A stored answer. Serializes as `null`, a bool, a string, or
/// `{ "amount": ..., "currency": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Unset,
    Flag(bool),
    Text(String),
    Salary(SalaryAnswer),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AnswerValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_salary(&self) -> Option<&SalaryAnswer> {
        match self {
            AnswerValue::Salary(s) => Some(s),
            _ => None,
        }
    }

    /// Unset, blank text, or a salary missing amount or currency.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Unset => true,
            AnswerValue::Flag(_) => false,
            AnswerValue::Text(s) => s.is_empty(),
            AnswerValue::Salary(s) => !s.is_complete(),
        }
    }

    /// Short human-readable form for lists and summaries.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Unset => String::new(),
            AnswerValue::Flag(true) => "Yes".to_string(),
            AnswerValue::Flag(false) => "No".to_string(),
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Salary(s) => match s.currency {
                Some(c) if !s.amount.is_empty() => format!("{} {}", c.code(), s.amount),
                Some(c) => c.code().to_string(),
                None => s.amount.clone(),
            },
        }
    }
}

impl Default for AnswerValue {
    fn default() -> Self {
        AnswerValue::Unset
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Flag(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<SalaryAnswer> for AnswerValue {
    fn from(value: SalaryAnswer) -> Self {
        AnswerValue::Salary(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_wire_shape() {
        let salary = AnswerValue::Salary(SalaryAnswer::new("50000", Currency::Gbp));
        assert_eq!(
            serde_json::to_string(&salary).unwrap(),
            r#"{"amount":"50000","currency":"GBP"}"#
        );
        assert_eq!(serde_json::to_string(&AnswerValue::Unset).unwrap(), "null");
        assert_eq!(serde_json::to_string(&AnswerValue::Flag(true)).unwrap(), "true");

        let parsed: AnswerValue = serde_json::from_str(r#""Jane Doe""#).unwrap();
        assert_eq!(parsed, AnswerValue::text("Jane Doe"));
        let parsed: AnswerValue = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, AnswerValue::Unset);
    }

    #[test]
    fn test_emptiness() {
        assert!(AnswerValue::Unset.is_empty());
        assert!(AnswerValue::text("").is_empty());
        assert!(!AnswerValue::Flag(false).is_empty());
        assert!(AnswerValue::Salary(SalaryAnswer::new("", Currency::Usd)).is_empty());
        assert!(AnswerValue::Salary(SalaryAnswer {
            amount: "10".into(),
            currency: None
        })
        .is_empty());
        assert!(!AnswerValue::Salary(SalaryAnswer::new("10", Currency::Usd)).is_empty());
    }

    #[test]
    fn test_currency_cycle_wraps() {
        assert_eq!(Currency::Usd.next(), Currency::Eur);
        assert_eq!(Currency::Chf.next(), Currency::Usd);
    }
}
