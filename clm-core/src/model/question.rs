use serde::{Deserialize, Serialize};

/// Canonical key naming a semantic question, e.g. "What's the annual salary?".
pub type QuestionIdentity = String;

/// How a question is answered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InputType {
    Text,
    Paragraph,
    Email,
    Radio,
    Number,
    Date,
}

impl InputType {
    pub fn all() -> &'static [InputType] {
        &[
            InputType::Text,
            InputType::Paragraph,
            InputType::Email,
            InputType::Radio,
            InputType::Number,
            InputType::Date,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "Text",
            InputType::Paragraph => "Paragraph",
            InputType::Email => "Email",
            InputType::Radio => "Radio",
            InputType::Number => "Number",
            InputType::Date => "Date",
        }
    }

    /// Free-form string answers (everything except yes/no).
    pub fn is_text_like(&self) -> bool {
        !matches!(self, InputType::Radio)
    }
}

impl Default for InputType {
    fn default() -> Self {
        InputType::Text
    }
}

/// One question in the questionnaire, derived from a highlighted fragment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    /// The highlighted fragment that first produced this identity.
    pub raw_text: String,
    pub identity: QuestionIdentity,
    pub input_type: InputType,
    /// User-editable question text; starts as the identity.
    pub label: String,
    pub required: bool,
    pub is_follow_up: bool,
    /// Set once the user has explicitly picked a type.
    #[serde(default)]
    pub type_locked: bool,
    /// Position in first-occurrence registration order.
    #[serde(default)]
    pub origin: usize,
}

impl QuestionEntry {
    pub fn new(raw_text: String, identity: QuestionIdentity, input_type: InputType) -> Self {
        Self {
            label: identity.clone(),
            raw_text,
            identity,
            input_type,
            required: false,
            is_follow_up: false,
            type_locked: false,
            origin: 0,
        }
    }

    /// Label shown to the user, falling back to the identity when blank.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.identity
        } else {
            &self.label
        }
    }
}
