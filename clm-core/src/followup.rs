//! Follow-up questions: asked only while a parent yes/no question has a
//! given answer.

use crate::classifier::{
    HR_CONTACT, PENSION_CLAUSE, PROBATION_CLAUSE, PROBATION_EXTENSION, PROBATION_EXTENSION_LENGTH,
    PROBATION_LENGTH, SICK_PAY_CLAUSE, SICK_PAY_POLICY, SICK_PAY_WEEKS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpRule {
    pub parent: &'static str,
    /// Parent answer that activates the follow-up.
    pub on_value: bool,
    pub follow_up: &'static str,
    /// Answer the follow-up is seeded with when it activates.
    pub initial_value: &'static str,
}

const fn on_yes(parent: &'static str, follow_up: &'static str) -> FollowUpRule {
    FollowUpRule {
        parent,
        on_value: true,
        follow_up,
        initial_value: "",
    }
}

pub const FOLLOW_UPS: &[FollowUpRule] = &[
    on_yes(PROBATION_CLAUSE, PROBATION_LENGTH),
    on_yes(PROBATION_EXTENSION, PROBATION_EXTENSION_LENGTH),
    on_yes(SICK_PAY_CLAUSE, SICK_PAY_POLICY),
    on_yes(SICK_PAY_CLAUSE, SICK_PAY_WEEKS),
    on_yes(PENSION_CLAUSE, HR_CONTACT),
];

pub fn is_follow_up(identity: &str) -> bool {
    FOLLOW_UPS.iter().any(|rule| rule.follow_up == identity)
}

pub fn parent_of(identity: &str) -> Option<&'static str> {
    FOLLOW_UPS
        .iter()
        .find(|rule| rule.follow_up == identity)
        .map(|rule| rule.parent)
}

pub fn rules_for(parent: &str) -> impl Iterator<Item = &'static FollowUpRule> + '_ {
    FOLLOW_UPS.iter().filter(move |rule| rule.parent == parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(is_follow_up(PROBATION_LENGTH));
        assert!(!is_follow_up(PROBATION_CLAUSE));
        assert_eq!(parent_of(HR_CONTACT), Some(PENSION_CLAUSE));
        assert_eq!(rules_for(SICK_PAY_CLAUSE).count(), 2);
    }
}
