//! Live document generation: the template with the current answers applied.
//!
//! Passes run in a fixed order over a copy of the template:
//! section gates, placeholder substitution, clause surgery, then the
//! derived holiday pay. The result depends only on the template, the
//! answers and the options.

mod clauses;

use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use tracing::debug;

use crate::answers::AnswerStore;
use crate::classifier::{self, PENSION_CLAUSE, PROBATION_CLAUSE, UNUSED_HOLIDAY};
use crate::holiday::{self, HolidayOperation, HolidayPay};
use crate::markup::escape_html;
use crate::model::{AnswerValue, SalaryAnswer};

/// Presentation inputs that are not answers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// CSS class of the span wrapping each filled-in value.
    pub highlight_class: String,
    /// Stored holiday-pay operation, if any.
    pub holiday: Option<HolidayOperation>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            highlight_class: crate::config::HighlightStyle::default().light,
            holiday: None,
        }
    }
}

/// Sections removed unless their gate question is answered yes.
const GATES: &[(&str, &str)] = &[
    (PROBATION_CLAUSE, "PROBATIONARY PERIOD"),
    (PENSION_CLAUSE, "PENSION"),
];

pub(crate) fn span(class: &str, content: &str) -> String {
    format!(r#"<span class="{}">{}</span>"#, escape_html(class), content)
}

fn placeholder_pattern(label: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\[{}\]", regex::escape(label))).ok()
}

fn line_pattern(label: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i).*{}.*", regex::escape(label))).ok()
}

fn section_pattern(heading: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"(?i)<h2[^>]*>[^<]*{}[^<]*</h2>\s*<p[^>]*>[\s\S]*?</p>",
        regex::escape(heading)
    ))
    .ok()
}

fn replace_all(text: &mut String, re: &Regex, with: &str) {
    let replaced = re.replace_all(text, NoExpand(with)).into_owned();
    *text = replaced;
}

/// Render `template` with `answers` applied.
pub fn render(template: &str, answers: &AnswerStore, options: &RenderOptions) -> String {
    let mut text = template.to_string();

    apply_gates(&mut text, answers);

    for (identity, value) in answers.iter().filter(|(identity, _)| !answers.is_dormant(identity)) {
        substitute(&mut text, identity, value, options);
    }

    for (identity, value) in answers.iter() {
        clauses::apply(&mut text, identity, value, answers, options);
    }

    if let Some(pay) = holiday_pay(answers, options) {
        if let Some(re) = placeholder_pattern(classifier::HOLIDAY_PAY_PLACEHOLDER) {
            replace_all(&mut text, &re, &span(&options.highlight_class, &pay.to_string()));
        }
    }

    debug!(answers = answers.len(), bytes = text.len(), "rendered document");
    text
}

/// Holiday pay derived from the unused-holiday answer, when that question is
/// asked, its answer is a number and an operation is stored.
pub fn holiday_pay(answers: &AnswerStore, options: &RenderOptions) -> Option<HolidayPay> {
    let answer = answers.text(UNUSED_HOLIDAY)?;
    holiday::calculate(answer, options.holiday.as_ref()?)
}

fn apply_gates(text: &mut String, answers: &AnswerStore) {
    for (gate, heading) in GATES {
        let closed = matches!(
            answers.get(gate),
            Some(AnswerValue::Unset) | Some(AnswerValue::Flag(false))
        );
        if !closed {
            continue;
        }
        if let Some(re) = section_pattern(heading) {
            let replaced = re.replace(text, "").into_owned();
            *text = replaced;
            debug!(gate, "section removed");
        }
    }
}

fn substitute(text: &mut String, identity: &str, value: &AnswerValue, options: &RenderOptions) {
    let Some(label) = classifier::placeholder_for(identity) else {
        return;
    };
    let class = options.highlight_class.as_str();

    match value {
        AnswerValue::Salary(salary) => substitute_salary(text, label, salary, class),
        AnswerValue::Flag(false) => {
            if let Some(re) = line_pattern(label) {
                replace_all(text, &re, "");
            }
        }
        AnswerValue::Flag(true) => {
            if let Some(re) = placeholder_pattern(label) {
                replace_all(text, &re, &span(class, "Yes"));
            }
        }
        AnswerValue::Text(answer) if !answer.trim().is_empty() => {
            if let Some(re) = placeholder_pattern(label) {
                replace_all(text, &re, &span(class, &escape_html(answer)));
            }
        }
        _ => {}
    }
}

/// Amount and currency fill `[Annual Salary]` and `[USD]` independently.
fn substitute_salary(text: &mut String, label: &str, salary: &SalaryAnswer, class: &str) {
    if !salary.amount.trim().is_empty() {
        if let Some(re) = placeholder_pattern(label) {
            replace_all(text, &re, &span(class, &escape_html(&salary.amount)));
        }
    }
    if let Some(currency) = salary.currency {
        if let Some(re) = placeholder_pattern("USD") {
            replace_all(text, &re, &span(class, currency.code()));
        }
    }
}

/// Whether `rendered` still has a section titled `heading`.
pub fn has_section(rendered: &str, heading: &str) -> bool {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    let re = HEADING
        .get_or_init(|| Regex::new(r"(?i)<h2[^>]*>([^<]*)</h2>").expect("Invalid heading pattern"));
    re.captures_iter(rendered)
        .any(|c| c[1].trim().eq_ignore_ascii_case(heading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::*;
    use crate::holiday::Operation;
    use crate::model::{Currency, InputType, QuestionEntry};
    use crate::registry::QuestionRegistry;
    use crate::template::EMPLOYMENT_AGREEMENT;

    const NAME: &str = "What's the employee's name?";
    const CLASS: &str = "hl";

    fn options() -> RenderOptions {
        RenderOptions {
            highlight_class: CLASS.to_string(),
            holiday: None,
        }
    }

    fn store(answers: &[(&str, AnswerValue)]) -> AnswerStore {
        let mut store = AnswerStore::default();
        for (identity, value) in answers {
            store.set_answer(identity, value.clone());
        }
        store
    }

    fn render_with(answers: &[(&str, AnswerValue)]) -> String {
        render(EMPLOYMENT_AGREEMENT, &store(answers), &options())
    }

    #[test]
    fn test_text_answer_fills_placeholder() {
        let out = render_with(&[(NAME, AnswerValue::text("Jane Doe"))]);
        assert!(out.contains(r#"<span class="hl">Jane Doe</span>, residing at"#));
        assert!(!out.contains("[Employee Name]"));
    }

    #[test]
    fn test_blank_answer_leaves_placeholder() {
        let out = render_with(&[(NAME, AnswerValue::text("  "))]);
        assert!(out.contains("[Employee Name]"));
        assert_eq!(render(EMPLOYMENT_AGREEMENT, &AnswerStore::default(), &options()), EMPLOYMENT_AGREEMENT);
    }

    #[test]
    fn test_answers_are_escaped() {
        let out = render_with(&[("What's the employer's name?", AnswerValue::text("<b>A&B $1</b>"))]);
        assert!(out.contains("&lt;b&gt;A&amp;B $1&lt;/b&gt;"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let store = store(&[
            (NAME, AnswerValue::text("Jane Doe")),
            (PROBATION_CLAUSE, AnswerValue::Flag(false)),
            (SICK_PAY_CLAUSE, AnswerValue::Flag(true)),
        ]);
        let first = render(EMPLOYMENT_AGREEMENT, &store, &options());
        let second = render(EMPLOYMENT_AGREEMENT, &store, &options());
        assert_eq!(first, second);
    }

    #[test]
    fn test_gates_remove_sections_unless_yes() {
        let unset = render_with(&[(PROBATION_CLAUSE, AnswerValue::Unset)]);
        assert!(!has_section(&unset, "PROBATIONARY PERIOD"));
        assert!(!unset.contains("[Probation Period Length]"));
        assert!(has_section(&unset, "PLACE OF WORK"));

        let no = render_with(&[(PENSION_CLAUSE, AnswerValue::Flag(false))]);
        assert!(!has_section(&no, "PENSION"));
        assert!(!no.contains("[Pension Scheme Name]"));

        let yes = render_with(&[(PENSION_CLAUSE, AnswerValue::Flag(true))]);
        assert!(has_section(&yes, "PENSION"));

        let never_asked = render_with(&[]);
        assert!(has_section(&never_asked, "PROBATIONARY PERIOD"));
    }

    #[test]
    fn test_flag_with_placeholder() {
        let car = "Is a company car provided?";
        let no = render_with(&[(car, AnswerValue::Flag(false))]);
        assert!(!no.to_lowercase().contains("company car"));

        let yes = render_with(&[(car, AnswerValue::Flag(true))]);
        assert!(yes.contains(r#"Company car provided: <span class="hl">Yes</span>"#));
    }

    #[test]
    fn test_salary_parts() {
        let out = render_with(&[(SALARY, AnswerValue::Salary(SalaryAnswer::new("50000", Currency::Gbp)))]);
        assert!(out.contains(r#"salary of <span class="hl">GBP</span> <span class="hl">50000</span>"#));

        let no_amount = render_with(&[(SALARY, AnswerValue::Salary(SalaryAnswer::new("", Currency::Eur)))]);
        assert!(no_amount.contains(r#"<span class="hl">EUR</span> [Annual Salary]"#));
    }

    #[test]
    fn test_sick_pay_clause() {
        let removed = render_with(&[(SICK_PAY_CLAUSE, AnswerValue::Flag(false))]);
        assert!(!removed.contains("Company sick pay"));
        assert!(removed.contains("[Sick Pay Weeks] weeks.</p>"));

        let kept = render_with(&[
            (SICK_PAY_CLAUSE, AnswerValue::Flag(true)),
            (SICK_PAY_POLICY, AnswerValue::text("full pay for 4 weeks")),
        ]);
        assert!(kept.contains(r#"Company sick pay of <span class="hl">full pay for 4 weeks</span>"#));
    }

    #[test]
    fn test_standalone_policy_question() {
        let mut registry = QuestionRegistry::new(true);
        registry.register(&["[Details of Company Sick Pay Policy]".to_string()]);
        assert_eq!(registry.get(0).map(|e| e.identity.as_str()), Some(SICK_PAY_POLICY));

        let mut store = AnswerStore::default();
        store.initialize(registry.entries());
        store.set_answer(SICK_PAY_POLICY, AnswerValue::text("Full pay for 4 weeks"));

        let out = render(EMPLOYMENT_AGREEMENT, &store, &options());
        assert!(out.contains(r#"<span class="hl">Full pay for 4 weeks</span>"#));
        assert!(!out.contains("[Details of Company Sick Pay Policy]"));
    }

    #[test]
    fn test_declined_parent_hides_follow_up_answer() {
        let mut store = AnswerStore::default();
        store.set_answer(SICK_PAY_CLAUSE, AnswerValue::Flag(true));
        store.set_answer(SICK_PAY_WEEKS, AnswerValue::text("6"));
        assert!(render(EMPLOYMENT_AGREEMENT, &store, &options()).contains(r#"<span class="hl">6</span> weeks"#));

        store.set_answer(SICK_PAY_CLAUSE, AnswerValue::Flag(false));
        assert!(store.active_follow_ups().is_empty());
        assert!(store.is_dormant(SICK_PAY_WEEKS));

        let out = render(EMPLOYMENT_AGREEMENT, &store, &options());
        assert!(!out.contains(r#"<span class="hl">6</span>"#));
        assert!(out.contains("[Sick Pay Weeks] weeks.</p>"));
    }

    #[test]
    fn test_termination_clause() {
        let removed = render_with(&[(TERMINATION_CLAUSE, AnswerValue::Flag(false))]);
        assert!(!removed.contains("gross misconduct"));
        assert!(removed.contains("written notice.</p>"));

        let filled = render_with(&[
            (TERMINATION_CLAUSE, AnswerValue::Flag(true)),
            (NOTICE_PERIOD, AnswerValue::text("one month")),
        ]);
        assert!(filled.contains("gross misconduct"));
        assert!(filled.contains(r#"giving <span class="hl">one month</span> written notice"#));
    }

    #[test]
    fn test_previous_service_and_overtime() {
        let out = render_with(&[
            ("When did the previous employment start?", AnswerValue::text("2020-01-01")),
            (PREVIOUS_SERVICE, AnswerValue::Flag(false)),
            (OVERTIME_PAID, AnswerValue::Flag(false)),
        ]);
        assert!(out.contains("shall commence on [Employment Start Date].</p>"));
        assert!(!out.contains("entitled to overtime pay"));
        assert!(out.contains("<p>{The Employee shall not receive additional payment for overtime worked}</p>"));

        let unpaid = render_with(&[(OVERTIME_UNPAID, AnswerValue::Flag(false))]);
        assert!(!unpaid.contains("shall not receive additional payment"));
        assert!(unpaid.contains("for authorized overtime work}</p>"));
    }

    #[test]
    fn test_extension_and_additional_locations() {
        let out = render_with(&[
            (PROBATION_CLAUSE, AnswerValue::Flag(true)),
            (PROBATION_EXTENSION, AnswerValue::Flag(false)),
            (ADDITIONAL_LOCATIONS_CLAUSE, AnswerValue::Flag(false)),
        ]);
        assert!(out.contains("will be a probationary period.</p>"));
        assert!(!out.contains("extend the probationary period"));
        assert!(!out.contains("required to work at"));
        assert!(out.contains("normal place of work is"));
    }

    #[test]
    fn test_holiday_pay() {
        let mut store = AnswerStore::default();
        store.initialize(&[QuestionEntry::new(
            "[Unused Holiday Days]".into(),
            UNUSED_HOLIDAY.into(),
            InputType::Number,
        )]);
        store.set_answer(UNUSED_HOLIDAY, AnswerValue::text("10"));

        let mut opts = options();
        assert!(render(EMPLOYMENT_AGREEMENT, &store, &opts).contains("[Holiday Pay]"));

        opts.holiday = Some(HolidayOperation { operation: Operation::Multiply, value: 120.0 });
        let out = render(EMPLOYMENT_AGREEMENT, &store, &opts);
        assert!(out.contains(r#"amounting to <span class="hl">1200</span>"#));

        opts.holiday = Some(HolidayOperation { operation: Operation::Divide, value: 0.0 });
        let out = render(EMPLOYMENT_AGREEMENT, &store, &opts);
        assert!(out.contains(r#"amounting to <span class="hl">Error</span>"#));
        assert_eq!(holiday_pay(&store, &opts), Some(HolidayPay::Error));

        store.set_answer(UNUSED_HOLIDAY, AnswerValue::text("lots"));
        assert!(render(EMPLOYMENT_AGREEMENT, &store, &opts).contains("[Holiday Pay]"));
    }
}
