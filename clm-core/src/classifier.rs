//! Maps highlighted fragments to question identities.
//!
//! The catalog is fixed. A fragment is matched, in order, as a bare
//! placeholder (`[Employee Name]` or `Employee Name`), as a clause whose
//! context keywords it contains, or by the first catalog placeholder embedded
//! in it. Anything else is unknown and never becomes a question.

use tracing::debug;

use crate::model::InputType;

pub const SALARY: &str = "What's the annual salary?";
pub const PROBATION_CLAUSE: &str = "Is the clause of probationary period applicable?";
pub const PROBATION_LENGTH: &str = "What's the probation period length?";
pub const PROBATION_EXTENSION: &str = "Can the probation period be extended?";
pub const PROBATION_EXTENSION_LENGTH: &str = "What's the probation extension length?";
pub const PENSION_CLAUSE: &str = "Is the Pension clause applicable?";
pub const HR_CONTACT: &str = "Who is the HR/Relevant Contact?";
pub const SICK_PAY_CLAUSE: &str = "Is the sick pay policy applicable?";
pub const SICK_PAY_POLICY: &str = "What's the sick pay policy?";
pub const SICK_PAY_WEEKS: &str = "How many weeks?";
pub const TERMINATION_CLAUSE: &str = "Is the termination clause applicable?";
pub const NOTICE_PERIOD: &str = "What's the notice period?";
pub const PREVIOUS_SERVICE: &str = "Is the previous service applicable?";
pub const OVERTIME_PAID: &str = "Does the employee receive overtime payment?";
pub const OVERTIME_UNPAID: &str = "Should the employee not receive overtime payment?";
pub const ADDITIONAL_LOCATIONS_CLAUSE: &str =
    "Does the employee need to work at additional locations besides the normal place of work?";
pub const ADDITIONAL_LOCATION: &str = "What is the additional work location?";
pub const UNUSED_HOLIDAY: &str = "How many unused holiday days are paid out?";

/// Placeholder label of the derived holiday-pay value.
pub const HOLIDAY_PAY_PLACEHOLDER: &str = "Holiday Pay";
pub const UNUSED_HOLIDAY_PLACEHOLDER: &str = "Unused Holiday Days";

/// A catalog entry keyed by the bracketed label it stands for.
struct PlaceholderRule {
    /// Label inside the brackets in the template.
    label: &'static str,
    /// Other bare spellings that mean the same question.
    aliases: &'static [&'static str],
    identity: &'static str,
    input_type: InputType,
}

/// A catalog entry recognised by the words around it.
struct ClauseRule {
    /// All must occur in the lower-cased fragment.
    keywords: &'static [&'static str],
    identity: &'static str,
    input_type: InputType,
}

const fn placeholder(
    label: &'static str,
    identity: &'static str,
    input_type: InputType,
) -> PlaceholderRule {
    PlaceholderRule {
        label,
        aliases: &[],
        identity,
        input_type,
    }
}

const PLACEHOLDERS: &[PlaceholderRule] = &[
    placeholder("Agreement Date", "What's the agreement date?", InputType::Date),
    placeholder("Employer Name", "What's the employer's name?", InputType::Text),
    placeholder("Registered Address", "What's the employer's registered address?", InputType::Text),
    placeholder("Employee Name", "What's the employee's name?", InputType::Text),
    placeholder("Employee Address", "What's the employee's address?", InputType::Text),
    placeholder("Employee Email", "What's the employee's email address?", InputType::Email),
    placeholder("Employment Start Date", "What's the employment start date?", InputType::Date),
    placeholder("Previous Employment Start Date", "When did the previous employment start?", InputType::Date),
    placeholder("Job Title", "What's the job title?", InputType::Text),
    placeholder("Job Duties", "What are the employee's main duties?", InputType::Paragraph),
    placeholder("Line Manager", "Who is the employee's line manager?", InputType::Text),
    placeholder("Probation Period Length", PROBATION_LENGTH, InputType::Text),
    placeholder("Probation Extension Length", PROBATION_EXTENSION_LENGTH, InputType::Text),
    placeholder("Normal Place of Work", "What's the normal place of work?", InputType::Text),
    placeholder("Additional Work Locations", ADDITIONAL_LOCATION, InputType::Text),
    PlaceholderRule {
        label: "Annual Salary",
        aliases: &["USD", "Salary"],
        identity: SALARY,
        input_type: InputType::Number,
    },
    placeholder("Payment Frequency", "How often is the salary paid?", InputType::Text),
    placeholder("Overtime Pay Rate", "What's the overtime pay rate?", InputType::Number),
    placeholder("Company Car", "Is a company car provided?", InputType::Radio),
    placeholder("Working Hours", "How many hours per week does the employee work?", InputType::Number),
    placeholder("Holiday Entitlement", "How many days of paid holiday per year?", InputType::Number),
    placeholder(UNUSED_HOLIDAY_PLACEHOLDER, UNUSED_HOLIDAY, InputType::Number),
    placeholder("Sick Pay Weeks", SICK_PAY_WEEKS, InputType::Number),
    PlaceholderRule {
        label: "Details of Company Sick Pay Policy",
        aliases: &["Sick Pay Policy"],
        identity: SICK_PAY_POLICY,
        input_type: InputType::Paragraph,
    },
    placeholder("Pension Scheme Name", "What's the pension scheme?", InputType::Text),
    placeholder("HR/Relevant Contact", HR_CONTACT, InputType::Email),
    placeholder("Notice Period", NOTICE_PERIOD, InputType::Text),
];

const CLAUSES: &[ClauseRule] = &[
    ClauseRule {
        keywords: &["after the probationary period", "gross misconduct"],
        identity: TERMINATION_CLAUSE,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["extend the probationary period"],
        identity: PROBATION_EXTENSION,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["probationary period", "[probation period length]"],
        identity: PROBATION_CLAUSE,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["previous continuous service"],
        identity: PREVIOUS_SERVICE,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["not receive additional payment for overtime"],
        identity: OVERTIME_UNPAID,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["entitled to overtime pay"],
        identity: OVERTIME_PAID,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["company sick pay"],
        identity: SICK_PAY_CLAUSE,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["required to work at"],
        identity: ADDITIONAL_LOCATIONS_CLAUSE,
        input_type: InputType::Radio,
    },
    ClauseRule {
        keywords: &["pension"],
        identity: PENSION_CLAUSE,
        input_type: InputType::Radio,
    },
];

/// Result of classifying one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub identity: Option<&'static str>,
    /// `None` means the fragment is unknown.
    pub input_type: Option<InputType>,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            identity: None,
            input_type: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.identity.is_some()
    }
}

/// Classify a highlighted fragment. Pure: the same fragment always yields the
/// same identity.
pub fn classify(fragment: &str) -> Classification {
    let result = classify_bare(fragment)
        .or_else(|| classify_clause(fragment))
        .or_else(|| classify_embedded(fragment))
        .unwrap_or_else(Classification::unknown);
    debug!(fragment, identity = ?result.identity, "classified fragment");
    result
}

/// Whether `fragment` is exactly one catalog placeholder, with or without
/// brackets.
pub fn is_bare_placeholder(fragment: &str) -> bool {
    classify_bare(fragment).is_some()
}

/// Label substituted for `identity` by the renderer, if any.
pub fn placeholder_for(identity: &str) -> Option<&'static str> {
    PLACEHOLDERS
        .iter()
        .find(|rule| rule.identity == identity)
        .map(|rule| rule.label)
}

/// The catalog's suggested input type for `identity`.
pub fn input_type_for(identity: &str) -> Option<InputType> {
    PLACEHOLDERS
        .iter()
        .map(|rule| (rule.identity, rule.input_type))
        .chain(CLAUSES.iter().map(|rule| (rule.identity, rule.input_type)))
        .find(|(id, _)| *id == identity)
        .map(|(_, input_type)| input_type)
}

fn strip_brackets(fragment: &str) -> &str {
    let trimmed = fragment.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn lookup_label(label: &str) -> Option<&'static PlaceholderRule> {
    PLACEHOLDERS.iter().find(|rule| {
        rule.label.eq_ignore_ascii_case(label)
            || rule.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(label))
    })
}

fn from_placeholder(rule: &PlaceholderRule) -> Classification {
    Classification {
        identity: Some(rule.identity),
        input_type: Some(rule.input_type),
    }
}

fn classify_bare(fragment: &str) -> Option<Classification> {
    lookup_label(strip_brackets(fragment)).map(from_placeholder)
}

fn classify_clause(fragment: &str) -> Option<Classification> {
    let lower = fragment.to_lowercase();
    CLAUSES
        .iter()
        .find(|rule| rule.keywords.iter().all(|k| lower.contains(k)))
        .map(|rule| Classification {
            identity: Some(rule.identity),
            input_type: Some(rule.input_type),
        })
}

fn classify_embedded(fragment: &str) -> Option<Classification> {
    let mut rest = fragment;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let close = after.find(']')?;
        if let Some(rule) = lookup_label(after[..close].trim()) {
            return Some(from_placeholder(rule));
        }
        rest = &after[close + 1..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_placeholder_with_and_without_brackets() {
        let bracketed = classify("[Employee Name]");
        assert_eq!(bracketed.identity, Some("What's the employee's name?"));
        assert_eq!(bracketed.input_type, Some(InputType::Text));
        assert_eq!(classify("  employee name "), bracketed);
    }

    #[test]
    fn test_currency_token_maps_to_salary() {
        assert_eq!(classify("[USD]").identity, Some(SALARY));
        assert_eq!(classify("[Annual Salary]").input_type, Some(InputType::Number));
    }

    #[test]
    fn test_clause_context_beats_embedded_placeholder() {
        let fragment = "The first [Probation Period Length] of employment will be a probationary period.";
        let result = classify(fragment);
        assert_eq!(result.identity, Some(PROBATION_CLAUSE));
        assert_eq!(result.input_type, Some(InputType::Radio));
    }

    #[test]
    fn test_sick_pay_placeholder_is_not_the_clause() {
        assert_eq!(
            classify("[Details of Company Sick Pay Policy]").identity,
            Some(SICK_PAY_POLICY)
        );
        assert_eq!(
            classify("The Employee may also be entitled to Company sick pay of [Details of Company Sick Pay Policy]")
                .identity,
            Some(SICK_PAY_CLAUSE)
        );
    }

    #[test]
    fn test_termination_clause() {
        let fragment = "(After the probationary period, the Company may terminate employment without notice in cases of gross misconduct.)";
        assert_eq!(classify(fragment).identity, Some(TERMINATION_CLAUSE));
    }

    #[test]
    fn test_embedded_placeholder() {
        assert_eq!(
            classify("shall be employed as [Job Title].").identity,
            Some("What's the job title?")
        );
        assert_eq!(
            classify("[Nothing Here] and [Line Manager]").identity,
            Some("Who is the employee's line manager?")
        );
    }

    #[test]
    fn test_unknown_fragment() {
        let result = classify("governed by the laws of England");
        assert!(!result.is_known());
        assert_eq!(result.input_type, None);
        assert_eq!(classify("[Unclosed").identity, None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(placeholder_for(SALARY), Some("Annual Salary"));
        assert_eq!(placeholder_for(UNUSED_HOLIDAY), Some(UNUSED_HOLIDAY_PLACEHOLDER));
        assert_eq!(placeholder_for(SICK_PAY_POLICY), Some("Details of Company Sick Pay Policy"));
        assert_eq!(placeholder_for(TERMINATION_CLAUSE), None);
        assert_eq!(input_type_for(PENSION_CLAUSE), Some(InputType::Radio));
    }

    #[test]
    fn test_classification_is_stable() {
        let fragment = "[Notice Period]";
        assert_eq!(classify(fragment), classify(fragment));
    }
}
