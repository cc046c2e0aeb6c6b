//! Clause surgery for yes/no questions that have no placeholder of their
//! own. Each rule edits the working text independently of the others.
//!
//! Patterns tolerate an inner placeholder that has already been filled in,
//! since this pass runs after generic substitution.

use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use super::{span, RenderOptions};
use crate::answers::AnswerStore;
use crate::classifier::{
    ADDITIONAL_LOCATIONS_CLAUSE, NOTICE_PERIOD, OVERTIME_PAID, OVERTIME_UNPAID,
    PREVIOUS_SERVICE, PROBATION_EXTENSION, SICK_PAY_CLAUSE, TERMINATION_CLAUSE,
};
use crate::markup::escape_html;
use crate::model::AnswerValue;

struct Patterns {
    sick_pay: Regex,
    termination_section: Regex,
    gross_misconduct: Regex,
    notice_period: Regex,
    previous_service: Regex,
    overtime_paid: Regex,
    overtime_unpaid: Regex,
    probation_extension: Regex,
    additional_locations: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("Invalid clause pattern");
        Patterns {
            sick_pay: re(r"\s*\{The Employee may also be entitled to Company sick pay of .*?\}"),
            termination_section: re(r"(?i)<h2[^>]*>TERMINATION</h2>\s*<p[^>]*>[\s\S]*?</p>"),
            gross_misconduct: re(r"\s*\(After the probationary period.*?gross misconduct\.\)"),
            notice_period: re(r"(?i)\[Notice Period\]"),
            previous_service: re(
                r#"(?i)\s*or, if applicable, "on .*? with previous continuous service taken into account"\s*"#,
            ),
            overtime_paid: re(
                r"(?i)\s*\{The Employee is entitled to overtime pay at a rate of .*? for authorized overtime work\}\s*",
            ),
            overtime_unpaid: re(
                r"(?i)\s*\{The Employee shall not receive additional payment for overtime worked\}\s*",
            ),
            probation_extension: re(
                r"(?i)\s*\{The Company may extend the probationary period by up to .*? at its discretion\}",
            ),
            additional_locations: re(r"(?i).*required to work at.*"),
        }
    })
}

/// Apply the named surgery for `identity`, if it has one.
pub(super) fn apply(
    text: &mut String,
    identity: &str,
    value: &AnswerValue,
    answers: &AnswerStore,
    options: &RenderOptions,
) {
    let Some(flag) = value.as_flag() else {
        return;
    };
    let p = patterns();

    match (identity, flag) {
        (SICK_PAY_CLAUSE, false) => replace_first(text, &p.sick_pay, ""),
        (TERMINATION_CLAUSE, false) => {
            let Some(section) = p.termination_section.find(text) else {
                return;
            };
            let range = section.range();
            let trimmed = p.gross_misconduct.replace(section.as_str(), "").into_owned();
            text.replace_range(range, &trimmed);
        }
        (TERMINATION_CLAUSE, true) => {
            if let Some(notice) = non_blank(answers, NOTICE_PERIOD) {
                let filled = span(&options.highlight_class, &escape_html(notice));
                replace_all(text, &p.notice_period, &filled);
            }
        }
        (PREVIOUS_SERVICE, false) => replace_all(text, &p.previous_service, ""),
        (OVERTIME_PAID, false) => replace_all(text, &p.overtime_paid, ""),
        (OVERTIME_UNPAID, false) => replace_all(text, &p.overtime_unpaid, ""),
        (PROBATION_EXTENSION, false) => replace_all(text, &p.probation_extension, ""),
        (ADDITIONAL_LOCATIONS_CLAUSE, false) => replace_all(text, &p.additional_locations, ""),
        _ => {}
    }
}

fn non_blank<'a>(answers: &'a AnswerStore, identity: &str) -> Option<&'a str> {
    answers.text(identity).filter(|s| !s.trim().is_empty())
}

fn replace_first(text: &mut String, re: &Regex, with: &str) {
    let replaced = re.replace(text, NoExpand(with)).into_owned();
    *text = replaced;
}

fn replace_all(text: &mut String, re: &Regex, with: &str) {
    let replaced = re.replace_all(text, NoExpand(with)).into_owned();
    *text = replaced;
}
