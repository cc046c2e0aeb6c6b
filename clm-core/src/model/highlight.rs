use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TextRange;

/// A fragment of the agreement the user marked as a placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub id: Uuid,
    #[serde(flatten)]
    pub range: TextRange,
    pub text: String,
}

impl Highlight {
    pub fn new(range: TextRange, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            range,
            text,
        }
    }
}
