//! The ordered, deduplicated question set built from highlighted fragments.
//!
//! Entries live in one `Vec`, so text, type, label and required flag can
//! never drift apart when questions are reordered.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::classifier::{self, is_bare_placeholder};
use crate::error::{ClmError, Result};
use crate::followup;
use crate::model::{InputType, QuestionEntry};

#[derive(Debug, Clone, Default)]
pub struct QuestionRegistry {
    entries: Vec<QuestionEntry>,
    suggest_types: bool,
}

impl QuestionRegistry {
    /// With `suggest_types` new questions take the classifier's input type,
    /// otherwise they start as `Text`.
    pub fn new(suggest_types: bool) -> Self {
        Self {
            entries: Vec::new(),
            suggest_types,
        }
    }

    /// Rebuild the question set from the highlighted fragments.
    ///
    /// Unknown fragments are skipped, and the first fragment to produce an
    /// identity wins. Identities already present keep their label, type,
    /// lock and required flag.
    pub fn register(&mut self, fragments: &[String]) -> &[QuestionEntry] {
        let selected: HashSet<&'static str> = fragments
            .iter()
            .filter_map(|f| classifier::classify(f).identity)
            .collect();

        let mut seen = HashSet::new();
        let mut next = Vec::new();

        for fragment in fragments {
            let classification = classifier::classify(fragment);
            let Some(identity) = classification.identity else {
                continue;
            };

            if followup::is_follow_up(identity) && !admits_follow_up(fragment, identity, &selected) {
                debug!(identity, "follow-up suppressed from top level");
                continue;
            }

            if !seen.insert(identity) {
                continue;
            }

            let mut entry = match self.entries.iter().find(|e| e.identity == identity) {
                Some(existing) => existing.clone(),
                None => {
                    let input_type = if self.suggest_types {
                        classification.input_type.unwrap_or_default()
                    } else {
                        InputType::Text
                    };
                    let mut entry =
                        QuestionEntry::new(fragment.clone(), identity.to_string(), input_type);
                    entry.is_follow_up = followup::is_follow_up(identity);
                    entry
                }
            };
            entry.origin = next.len();
            next.push(entry);
        }

        debug!(count = next.len(), "registered questions");
        self.entries = next;
        &self.entries
    }

    pub fn entries(&self) -> &[QuestionEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&QuestionEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, identity: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.identity == identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.index_of(identity).is_some()
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut QuestionEntry> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(ClmError::IndexOutOfRange { index, len })
    }

    /// Choose the input type. Allowed once per question.
    pub fn set_type(&mut self, index: usize, input_type: InputType) -> Result<()> {
        let entry = self.entry_mut(index)?;
        if entry.type_locked {
            warn!(index, identity = %entry.identity, "type change refused, already locked");
            return Err(ClmError::TypeLocked { index });
        }
        entry.input_type = input_type;
        entry.type_locked = true;
        Ok(())
    }

    pub fn set_label(&mut self, index: usize, label: &str) -> Result<()> {
        self.entry_mut(index)?.label = label.to_string();
        Ok(())
    }

    pub fn set_required(&mut self, index: usize, required: bool) -> Result<()> {
        self.entry_mut(index)?.required = required;
        Ok(())
    }

    /// Current order as registration origins, for persisting.
    pub fn order(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.origin).collect()
    }

    /// Reorder by registration origin. Unknown or repeated positions are
    /// ignored; entries the order does not mention follow in their current
    /// relative order.
    pub fn apply_order(&mut self, order: &[usize]) {
        let mut remaining: Vec<Option<QuestionEntry>> =
            std::mem::take(&mut self.entries).into_iter().map(Some).collect();
        let mut reordered = Vec::with_capacity(remaining.len());

        for &origin in order {
            if let Some(slot) = remaining
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|e| e.origin == origin))
            {
                reordered.extend(slot.take());
            }
        }
        reordered.extend(remaining.into_iter().flatten());
        self.entries = reordered;
    }

    /// Move one entry to a new position.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.entries.len();
        if from >= len {
            return Err(ClmError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(ClmError::IndexOutOfRange { index: to, len });
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Types and lock flags indexed by registration origin.
    pub fn types_by_origin(&self) -> (Vec<InputType>, Vec<bool>) {
        let mut types = vec![InputType::Text; self.entries.len()];
        let mut locks = vec![false; self.entries.len()];
        for entry in &self.entries {
            if let Some(slot) = types.get_mut(entry.origin) {
                *slot = entry.input_type;
            }
            if let Some(slot) = locks.get_mut(entry.origin) {
                *slot = entry.type_locked;
            }
        }
        (types, locks)
    }

    /// Restore types and locks saved with [`types_by_origin`]. Positions
    /// with no matching entry are ignored.
    ///
    /// [`types_by_origin`]: QuestionRegistry::types_by_origin
    pub fn restore_types(&mut self, types: &[InputType], locks: &[bool]) {
        for entry in &mut self.entries {
            if let Some(t) = types.get(entry.origin) {
                entry.input_type = *t;
            }
            if let Some(l) = locks.get(entry.origin) {
                entry.type_locked = *l;
            }
        }
    }
}

/// A follow-up stands on its own only when the user picked its bare
/// placeholder and did not also pick the clause it depends on.
fn admits_follow_up(fragment: &str, identity: &str, selected: &HashSet<&'static str>) -> bool {
    is_bare_placeholder(fragment)
        && followup::parent_of(identity).map_or(true, |parent| !selected.contains(parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{PROBATION_CLAUSE, PROBATION_LENGTH, SALARY};

    fn fragments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn identities(registry: &QuestionRegistry) -> Vec<&str> {
        registry.entries().iter().map(|e| e.identity.as_str()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let mut registry = QuestionRegistry::new(false);
        registry.register(&fragments(&[
            "[Job Title]",
            "governed by the laws",
            "[Annual Salary]",
            "Job Title",
            "[USD]",
            "[Employee Name]",
        ]));

        assert_eq!(
            identities(&registry),
            vec!["What's the job title?", SALARY, "What's the employee's name?"]
        );
        assert_eq!(registry.order(), vec![0, 1, 2]);
        assert_eq!(registry.get(1).unwrap().raw_text, "[Annual Salary]");
    }

    #[test]
    fn test_default_type_depends_on_policy() {
        let mut plain = QuestionRegistry::new(false);
        plain.register(&fragments(&["[Agreement Date]"]));
        assert_eq!(plain.get(0).unwrap().input_type, InputType::Text);

        let mut suggested = QuestionRegistry::new(true);
        suggested.register(&fragments(&["[Agreement Date]"]));
        assert_eq!(suggested.get(0).unwrap().input_type, InputType::Date);
        assert_eq!(suggested.get(0).unwrap().label, "What's the agreement date?");
    }

    #[test]
    fn test_follow_up_admitted_only_without_parent_clause() {
        let mut registry = QuestionRegistry::new(false);
        registry.register(&fragments(&["Probation Period Length"]));
        assert_eq!(identities(&registry), vec![PROBATION_LENGTH]);
        assert!(registry.get(0).unwrap().is_follow_up);

        let clause = "The first [Probation Period Length] of employment will be a probationary period.";
        registry.register(&fragments(&[clause, "Probation Period Length"]));
        assert_eq!(identities(&registry), vec![PROBATION_CLAUSE]);
    }

    #[test]
    fn test_type_is_locked_after_first_choice() {
        let mut registry = QuestionRegistry::new(false);
        registry.register(&fragments(&["[Company Car]"]));

        registry.set_type(0, InputType::Radio).unwrap();
        assert!(registry.get(0).unwrap().type_locked);
        assert!(matches!(
            registry.set_type(0, InputType::Text),
            Err(ClmError::TypeLocked { index: 0 })
        ));
        assert_eq!(registry.get(0).unwrap().input_type, InputType::Radio);
        assert!(registry.set_type(3, InputType::Text).is_err());
    }

    #[test]
    fn test_reregister_preserves_edits_and_appends() {
        let mut registry = QuestionRegistry::new(false);
        registry.register(&fragments(&["[Job Title]"]));
        registry.set_label(0, "Role?").unwrap();
        registry.set_required(0, true).unwrap();
        registry.set_type(0, InputType::Paragraph).unwrap();

        registry.register(&fragments(&["[Employee Name]", "[Job Title]"]));
        let job = &registry.entries()[1];
        assert_eq!(job.label, "Role?");
        assert!(job.required);
        assert!(job.type_locked);
        assert_eq!(job.input_type, InputType::Paragraph);
        assert_eq!(job.origin, 1);
    }

    #[test]
    fn test_apply_order_moves_everything_together() {
        let mut registry = QuestionRegistry::new(false);
        registry.register(&fragments(&["[Job Title]", "[Employee Name]", "[Notice Period]"]));
        registry.set_required(2, true).unwrap();

        registry.apply_order(&[2, 9, 0, 0]);
        let order: Vec<_> = registry.entries().iter().map(|e| (e.origin, e.required)).collect();
        assert_eq!(order, vec![(2, true), (0, false), (1, false)]);
    }

    #[test]
    fn test_move_entry_and_persisted_types() {
        let mut registry = QuestionRegistry::new(false);
        registry.register(&fragments(&["[Job Title]", "[Agreement Date]"]));
        registry.set_type(1, InputType::Date).unwrap();
        registry.move_entry(1, 0).unwrap();
        assert_eq!(registry.order(), vec![1, 0]);

        let (types, locks) = registry.types_by_origin();
        assert_eq!(types, vec![InputType::Text, InputType::Date]);
        assert_eq!(locks, vec![false, true]);

        let mut fresh = QuestionRegistry::new(false);
        fresh.register(&fragments(&["[Job Title]", "[Agreement Date]"]));
        fresh.restore_types(&types, &locks);
        fresh.apply_order(&[1, 0]);
        assert_eq!(fresh.entries()[0].input_type, InputType::Date);
        assert!(fresh.entries()[0].type_locked);
        assert!(fresh.move_entry(0, 5).is_err());
    }
}
