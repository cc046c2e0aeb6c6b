//! Term/definition matching exercise.
//!
//! Each item goes `Unselected -> Selected(term) -> Matched | MismatchShown`.
//! A wrong pairing draws a failure connector but locks nothing, so the user
//! can retry. Once every item is matched the exercise is complete for good.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchingItem {
    pub id: String,
    pub term: String,
    pub definition: String,
    pub is_matched: bool,
}

impl MatchingItem {
    pub fn new(id: &str, term: &str, definition: &str) -> Self {
        Self {
            id: id.to_string(),
            term: term.to_string(),
            definition: definition.to_string(),
            is_matched: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// No pending term, unknown id, or the definition is already matched.
    Ignored,
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Correct,
    Incorrect,
}

impl MatchOutcome {
    pub fn color_hex(&self) -> &'static str {
        match self {
            MatchOutcome::Correct => "#10B981",
            MatchOutcome::Incorrect => "#EF4444",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            MatchOutcome::Correct => (0x10, 0xB9, 0x81),
            MatchOutcome::Incorrect => (0xEF, 0x44, 0x44),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A box relative to the exercise container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right_middle(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height / 2.0)
    }

    pub fn left_middle(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }
}

/// Where terms and definitions currently sit on screen.
pub trait LayoutProbe {
    fn term_rect(&self, id: &str) -> Option<Rect>;
    fn definition_rect(&self, id: &str) -> Option<Rect>;
}

/// Shape of a drawn connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveStyle {
    /// Subtracted from both endpoints' x.
    pub offset: f64,
    /// Control point displacement per unit of vertical distance.
    pub curve_factor: f64,
}

impl CurveStyle {
    /// Pixel geometry of the browser exercise.
    pub fn svg() -> Self {
        Self {
            offset: 100.0,
            curve_factor: 0.3,
        }
    }

    /// Character-cell geometry, where endpoints are already outside the
    /// boxes.
    pub fn cells() -> Self {
        Self {
            offset: 0.0,
            curve_factor: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub term_id: String,
    pub definition_id: String,
    pub outcome: MatchOutcome,
    pub start: Point,
    pub end: Point,
}

impl Connector {
    /// Sample the cubic curve between the endpoints at `steps + 1` points.
    pub fn curve(&self, style: CurveStyle, steps: usize) -> Vec<Point> {
        let start = Point::new(self.start.x - style.offset, self.start.y);
        let end = Point::new(self.end.x - style.offset, self.end.y);
        let mid_x = (start.x + end.x) / 2.0;
        let bend = (end.y - start.y).abs() * style.curve_factor;
        let c1 = Point::new(mid_x + bend, start.y);
        let c2 = Point::new(mid_x - bend, end.y);

        let steps = steps.max(1);
        (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                let u = 1.0 - t;
                let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                Point::new(
                    a * start.x + b * c1.x + c * c2.x + d * end.x,
                    a * start.y + b * c1.y + c * c2.y + d * end.y,
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct MatchingExercise {
    items: Vec<MatchingItem>,
    selected_term: Option<String>,
    connectors: Vec<Connector>,
    completion_reported: bool,
}

impl MatchingExercise {
    pub fn new(items: Vec<MatchingItem>) -> Self {
        Self {
            items,
            selected_term: None,
            connectors: Vec::new(),
            completion_reported: false,
        }
    }

    pub fn items(&self) -> &[MatchingItem] {
        &self.items
    }

    pub fn selected_term(&self) -> Option<&str> {
        self.selected_term.as_deref()
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    fn item(&self, id: &str) -> Option<&MatchingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Select a term, or deselect it if it is already pending. Matched and
    /// unknown terms are ignored.
    pub fn select_term(&mut self, id: &str) {
        match self.item(id) {
            Some(item) if !item.is_matched => {
                if self.selected_term.as_deref() == Some(id) {
                    self.selected_term = None;
                } else {
                    self.selected_term = Some(id.to_string());
                }
            }
            _ => {}
        }
    }

    /// Pair the pending term with a definition.
    pub fn select_definition(&mut self, id: &str) -> MatchResult {
        let Some(term_id) = self.selected_term.clone() else {
            return MatchResult::Ignored;
        };
        match self.item(id) {
            Some(item) if !item.is_matched => {}
            _ => return MatchResult::Ignored,
        }

        let correct = term_id == id;
        let outcome = if correct {
            MatchOutcome::Correct
        } else {
            MatchOutcome::Incorrect
        };

        self.connectors.retain(|c| c.term_id != term_id);
        self.connectors.push(Connector {
            term_id: term_id.clone(),
            definition_id: id.to_string(),
            outcome,
            start: Point::default(),
            end: Point::default(),
        });
        self.selected_term = None;

        if correct {
            if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
                item.is_matched = true;
            }
            debug!(term = %term_id, "correct match");
            MatchResult::Correct
        } else {
            debug!(term = %term_id, definition = id, "incorrect match");
            MatchResult::Incorrect
        }
    }

    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.is_matched)
    }

    /// True exactly once, on the first call after completion.
    pub fn take_completion(&mut self) -> bool {
        if self.is_complete() && !self.completion_reported {
            self.completion_reported = true;
            info!(items = self.items.len(), "matching exercise complete");
            return true;
        }
        false
    }

    pub fn matched_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_matched).count()
    }

    /// Recompute connector endpoints from the current layout. Connectors
    /// whose boxes are not laid out keep their last position. Returns
    /// whether anything moved.
    pub fn refresh_connectors(&mut self, probe: &dyn LayoutProbe) -> bool {
        let mut changed = false;
        for connector in &mut self.connectors {
            let (Some(term), Some(definition)) = (
                probe.term_rect(&connector.term_id),
                probe.definition_rect(&connector.definition_id),
            ) else {
                continue;
            };
            let start = term.right_middle();
            let end = definition.left_middle();
            if start != connector.start || end != connector.end {
                connector.start = start;
                connector.end = end;
                changed = true;
            }
        }
        changed
    }
}

/// Coalesces bursts of layout events into one update `delay_ms` after the
/// last of them. Times are caller-supplied milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    /// Schedule an update, replacing any pending one.
    pub fn trigger(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    /// Whether the pending update is due. Fires once per schedule.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::jargon;
    use std::collections::HashMap;

    struct Grid(HashMap<String, (Rect, Rect)>);

    impl LayoutProbe for Grid {
        fn term_rect(&self, id: &str) -> Option<Rect> {
            self.0.get(id).map(|(t, _)| *t)
        }

        fn definition_rect(&self, id: &str) -> Option<Rect> {
            self.0.get(id).map(|(_, d)| *d)
        }
    }

    fn grid(row_height: f64) -> Grid {
        Grid(
            (1..=4)
                .map(|i| {
                    let y = i as f64 * row_height;
                    (
                        i.to_string(),
                        (Rect::new(0.0, y, 20.0, 3.0), Rect::new(40.0, y, 30.0, 3.0)),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_completes_only_after_all_correct_pairs() {
        let mut exercise = MatchingExercise::new(jargon());

        exercise.select_term("1");
        assert_eq!(exercise.select_definition("2"), MatchResult::Incorrect);
        exercise.select_term("1");
        assert_eq!(exercise.select_definition("3"), MatchResult::Incorrect);
        assert_eq!(exercise.connectors().len(), 1);
        assert_eq!(exercise.connectors()[0].outcome, MatchOutcome::Incorrect);

        for id in ["1", "2", "3"] {
            exercise.select_term(id);
            assert_eq!(exercise.select_definition(id), MatchResult::Correct);
            assert!(!exercise.is_complete());
            assert!(!exercise.take_completion());
        }

        exercise.select_term("4");
        assert_eq!(exercise.select_definition("4"), MatchResult::Correct);
        assert!(exercise.is_complete());
        assert!(exercise.take_completion());
        assert!(!exercise.take_completion());
        assert_eq!(exercise.matched_count(), 4);
        assert!(exercise
            .connectors()
            .iter()
            .all(|c| c.outcome == MatchOutcome::Correct));
    }

    #[test]
    fn test_selection_rules() {
        let mut exercise = MatchingExercise::new(jargon());
        assert_eq!(exercise.select_definition("1"), MatchResult::Ignored);

        exercise.select_term("2");
        exercise.select_term("2");
        assert_eq!(exercise.selected_term(), None);

        exercise.select_term("2");
        assert_eq!(exercise.select_definition("2"), MatchResult::Correct);

        exercise.select_term("2");
        assert_eq!(exercise.selected_term(), None);

        exercise.select_term("1");
        assert_eq!(exercise.select_definition("2"), MatchResult::Ignored);
        assert_eq!(exercise.selected_term(), Some("1"));
        assert_eq!(exercise.select_definition("99"), MatchResult::Ignored);
    }

    #[test]
    fn test_connectors_follow_layout() {
        let mut exercise = MatchingExercise::new(jargon());
        exercise.select_term("1");
        exercise.select_definition("3");

        assert!(exercise.refresh_connectors(&grid(4.0)));
        let c = &exercise.connectors()[0];
        assert_eq!(c.start, Point::new(20.0, 5.5));
        assert_eq!(c.end, Point::new(40.0, 13.5));
        assert!(!exercise.refresh_connectors(&grid(4.0)));
        assert!(exercise.refresh_connectors(&grid(5.0)));
    }

    #[test]
    fn test_curve_endpoints_and_bend() {
        let connector = Connector {
            term_id: "1".into(),
            definition_id: "2".into(),
            outcome: MatchOutcome::Correct,
            start: Point::new(100.0, 0.0),
            end: Point::new(300.0, 100.0),
        };
        let points = connector.curve(CurveStyle::svg(), 10);
        assert_eq!(points.len(), 11);
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[10], Point::new(200.0, 100.0));
        // symmetric control points put the middle sample on the midpoint
        assert!((points[5].x - 100.0).abs() < 1e-9);
        assert!((points[5].y - 50.0).abs() < 1e-9);
        assert_eq!(MatchOutcome::Incorrect.color_hex(), "#EF4444");
    }

    #[test]
    fn test_debouncer_coalesces_bursts() {
        let mut debouncer = Debouncer::default();
        assert!(!debouncer.poll(0));

        debouncer.trigger(0);
        debouncer.trigger(60);
        assert!(!debouncer.poll(120));
        assert!(debouncer.is_pending());
        assert!(debouncer.poll(160));
        assert!(!debouncer.poll(500));
    }
}
