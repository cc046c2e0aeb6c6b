use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Highlight, TextRange};
use crate::markup;

/// The agreement being worked on, plus the fragments highlighted in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    /// Template markup the renderer works on.
    pub source: String,
    /// Plain text of `source`; highlight ranges index into this.
    pub content: String,
    /// In the order the user made them.
    pub highlights: Vec<Highlight>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(title: String, source: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content: markup::to_plain_text(&source),
            source,
            highlights: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The bundled employment agreement.
    pub fn employment_agreement() -> Self {
        Self::new(
            "Employment Agreement".to_string(),
            crate::template::EMPLOYMENT_AGREEMENT.to_string(),
        )
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Highlight the given range. Returns `None` for empty or invalid ranges.
    pub fn add_highlight(&mut self, range: TextRange) -> Option<&Highlight> {
        if range.is_empty() {
            return None;
        }
        let text = range.slice(&self.content)?.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.highlights.push(Highlight::new(range, text));
        self.updated_at = Utc::now();
        self.highlights.last()
    }

    pub fn remove_highlight(&mut self, id: Uuid) -> Option<Highlight> {
        let pos = self.highlights.iter().position(|h| h.id == id)?;
        self.updated_at = Utc::now();
        Some(self.highlights.remove(pos))
    }

    /// Highlight covering `offset`, most recent first.
    pub fn highlight_at(&self, offset: usize) -> Option<&Highlight> {
        self.highlights.iter().rev().find(|h| h.range.contains(offset))
    }

    /// Highlighted fragments in selection order.
    pub fn highlighted_texts(&self) -> Vec<String> {
        self.highlights.iter().map(|h| h.text.clone()).collect()
    }

    /// Highlights sorted by where they start in the document.
    pub fn highlights_sorted(&self) -> Vec<&Highlight> {
        let mut sorted: Vec<_> = self.highlights.iter().collect();
        sorted.sort_by_key(|h| h.range.start_offset);
        sorted
    }
}
