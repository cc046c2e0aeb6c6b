//! Answers keyed by question identity, with advisory validation and the
//! Finish gate.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::classifier::SALARY;
use crate::error::SubmitRejection;
use crate::followup::{self, FollowUpRule};
use crate::model::{AnswerValue, Currency, InputType, QuestionEntry, QuestionIdentity, SalaryAnswer};

const NUMBER_PATTERN: &str = r"^[0-9]*\.?[0-9]*$";
const DATE_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const LIST_SEPARATOR_PATTERN: &str = r", and |, | and ";

struct Patterns {
    number: Regex,
    date: Regex,
    email: Regex,
    list_separator: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        number: Regex::new(NUMBER_PATTERN).expect("Invalid number pattern"),
        date: Regex::new(DATE_PATTERN).expect("Invalid date pattern"),
        email: Regex::new(EMAIL_PATTERN).expect("Invalid email pattern"),
        list_separator: Regex::new(LIST_SEPARATOR_PATTERN).expect("Invalid list pattern"),
    })
}

/// Check a raw value against its input type. Returns the message to show,
/// or an empty string when the value is acceptable. Empty input is always
/// acceptable.
pub fn validate(input_type: InputType, raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let p = patterns();
    let message = match input_type {
        InputType::Number if !p.number.is_match(raw) => "Please enter a valid number.",
        InputType::Date if !p.date.is_match(raw) => "Please enter a valid date in YYYY-MM-DD format.",
        InputType::Email if !p.email.is_match(raw) => "Please enter a valid email address.",
        _ => "",
    };
    message.to_string()
}

/// Split a list answer written in English list grammar.
pub fn split_list(raw: &str) -> Vec<String> {
    patterns()
        .list_separator
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// `A`, `A and B`, `A, B, and C`.
pub fn join_list(values: &[String]) -> String {
    match values {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Whether a kept answer still has the shape the question's type expects.
fn fits(entry: &QuestionEntry, value: &AnswerValue) -> bool {
    match value {
        AnswerValue::Salary(_) => entry.identity == SALARY,
        _ if entry.identity == SALARY => false,
        AnswerValue::Unset | AnswerValue::Flag(_) => entry.input_type == InputType::Radio,
        AnswerValue::Text(_) => entry.input_type != InputType::Radio,
    }
}

#[derive(Debug, Clone)]
pub struct AnswerStore {
    /// One slot per active identity, in question order.
    slots: Vec<(QuestionIdentity, AnswerValue)>,
    errors: BTreeMap<QuestionIdentity, String>,
    default_currency: Currency,
}

impl Default for AnswerStore {
    fn default() -> Self {
        Self::new(Currency::default())
    }
}

impl AnswerStore {
    pub fn new(default_currency: Currency) -> Self {
        Self {
            slots: Vec::new(),
            errors: BTreeMap::new(),
            default_currency,
        }
    }

    /// Answer a question starts with before the user touches it.
    pub fn default_for(&self, entry: &QuestionEntry) -> AnswerValue {
        if entry.identity == SALARY {
            AnswerValue::Salary(SalaryAnswer::new("", self.default_currency))
        } else if entry.input_type == InputType::Radio {
            AnswerValue::Unset
        } else {
            AnswerValue::text("")
        }
    }

    /// Make the slots match `entries`: one per identity, in entry order.
    /// Surviving answers are kept; follow-up answers stay while their parent
    /// is still asked.
    pub fn initialize(&mut self, entries: &[QuestionEntry]) {
        let mut previous = std::mem::take(&mut self.slots);
        let mut take = |identity: &str| {
            previous
                .iter()
                .position(|(id, _)| id == identity)
                .map(|pos| previous.remove(pos).1)
        };

        let mut slots = Vec::with_capacity(entries.len());
        for entry in entries {
            let value = take(&entry.identity)
                .filter(|value| fits(entry, value))
                .unwrap_or_else(|| self.default_for(entry));
            slots.push((entry.identity.clone(), value));
            for rule in followup::rules_for(&entry.identity) {
                if entries.iter().any(|e| e.identity == rule.follow_up) {
                    continue;
                }
                if let Some(value) = take(rule.follow_up) {
                    slots.push((rule.follow_up.to_string(), value));
                }
            }
        }

        self.slots = slots;
        self.errors
            .retain(|identity, _| self.slots.iter().any(|(id, _)| id == identity));
        debug!(count = self.slots.len(), "answer store initialized");
    }

    pub fn get(&self, identity: &str) -> Option<&AnswerValue> {
        self.slots
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, value)| value)
    }

    pub fn text(&self, identity: &str) -> Option<&str> {
        self.get(identity).and_then(AnswerValue::as_text)
    }

    pub fn flag(&self, identity: &str) -> Option<bool> {
        self.get(identity).and_then(AnswerValue::as_flag)
    }

    /// Whether `identity` is a follow-up whose parent is asked but not
    /// answered with the activating value. A follow-up whose parent is not
    /// asked at all stands on its own.
    pub fn is_dormant(&self, identity: &str) -> bool {
        followup::FOLLOW_UPS
            .iter()
            .filter(|rule| rule.follow_up == identity)
            .any(|rule| self.get(rule.parent).is_some() && self.flag(rule.parent) != Some(rule.on_value))
    }

    /// Stored answers in question order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.slots.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn upsert(&mut self, identity: &str, value: AnswerValue) -> Option<AnswerValue> {
        match self.slots.iter_mut().find(|(id, _)| id == identity) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.slots.push((identity.to_string(), value));
                None
            }
        }
    }

    /// Replace an answer. A yes/no answer that activates follow-up questions
    /// seeds them with their initial value.
    pub fn set_answer(&mut self, identity: &str, value: AnswerValue) {
        let previous = self.upsert(identity, value.clone());
        if previous.as_ref() == Some(&value) {
            return;
        }
        let Some(flag) = value.as_flag() else {
            return;
        };
        for rule in followup::rules_for(identity).filter(|rule| rule.on_value == flag) {
            debug!(parent = identity, follow_up = rule.follow_up, "seeding follow-up");
            self.upsert(rule.follow_up, AnswerValue::text(rule.initial_value));
        }
    }

    /// Store a typed string answer, recording its validation message.
    pub fn set_text_answer(&mut self, identity: &str, input_type: InputType, raw: &str) {
        self.record_error(identity, validate(input_type, raw));
        self.set_answer(identity, AnswerValue::text(raw));
    }

    pub fn set_salary_amount(&mut self, identity: &str, amount: &str) {
        self.record_error(identity, validate(InputType::Number, amount));
        let currency = self
            .get(identity)
            .and_then(AnswerValue::as_salary)
            .map_or(Some(self.default_currency), |s| s.currency);
        self.set_answer(
            identity,
            AnswerValue::Salary(SalaryAnswer {
                amount: amount.to_string(),
                currency,
            }),
        );
    }

    pub fn set_salary_currency(&mut self, identity: &str, currency: Currency) {
        let amount = self
            .get(identity)
            .and_then(AnswerValue::as_salary)
            .map(|s| s.amount.clone())
            .unwrap_or_default();
        self.set_answer(identity, AnswerValue::Salary(SalaryAnswer::new(amount, currency)));
    }

    /// Write `value` at `position` of a list answer such as the additional
    /// work locations, keeping English list grammar.
    pub fn append_list_answer(&mut self, identity: &str, value: &str, position: usize) {
        let current = match self.get(identity) {
            Some(AnswerValue::Text(s)) => s.clone(),
            Some(AnswerValue::Flag(b)) => b.to_string(),
            _ => String::new(),
        };

        let mut values = split_list(&current);
        if values.len() <= position {
            values.resize(position + 1, String::new());
        }
        values[position] = value.to_string();
        values.retain(|v| !v.trim().is_empty());

        self.set_answer(identity, AnswerValue::text(join_list(&values)));
    }

    fn record_error(&mut self, identity: &str, message: String) {
        if message.is_empty() {
            self.errors.remove(identity);
        } else {
            self.errors.insert(identity.to_string(), message);
        }
    }

    pub fn error(&self, identity: &str) -> Option<&str> {
        self.errors.get(identity).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|e| !e.is_empty())
    }

    /// Follow-up rules whose parent currently has the triggering answer.
    pub fn active_follow_ups(&self) -> Vec<&'static FollowUpRule> {
        followup::FOLLOW_UPS
            .iter()
            .filter(|rule| self.flag(rule.parent) == Some(rule.on_value))
            .collect()
    }

    /// The Finish gate: no outstanding validation errors and every required
    /// question answered.
    pub fn submit(&self, entries: &[QuestionEntry]) -> Result<(), SubmitRejection> {
        if self.has_errors() {
            info!("submission refused: input errors outstanding");
            return Err(SubmitRejection::InputErrors);
        }

        let missing: Vec<String> = entries
            .iter()
            .filter(|entry| entry.required)
            .filter(|entry| self.get(&entry.identity).map_or(true, AnswerValue::is_empty))
            .map(|entry| entry.identity.clone())
            .collect();

        if !missing.is_empty() {
            info!(missing = missing.len(), "submission refused: required answers missing");
            return Err(SubmitRejection::MissingRequired(missing));
        }

        info!(answers = self.slots.len(), "submission accepted");
        Ok(())
    }

    /// Answers as a JSON object, in question order.
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.slots
            .iter()
            .map(|(id, value)| {
                let json = serde_json::to_value(value).unwrap_or(Value::Null);
                (id.clone(), json)
            })
            .collect()
    }
}
