use serde::{Deserialize, Serialize};

/// A half-open byte range into a document's plain text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_offset: usize,
    pub end_offset: usize,
}

impl TextRange {
    /// Endpoints may be given in either order.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start_offset: start.min(end),
            end_offset: start.max(end),
        }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start_offset && offset < self.end_offset
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }

    /// The covered text, or `None` if the range falls outside `text` or
    /// splits a UTF-8 character.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start_offset..self.end_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalizes_and_slices() {
        let range = TextRange::new(9, 4);
        assert_eq!(range.start_offset, 4);
        assert!(range.contains(4));
        assert!(!range.contains(9));
        assert_eq!(range.slice("The [Job Title] is"), Some("[Job "));
        assert_eq!(TextRange::new(0, 50).slice("short"), None);
    }
}
