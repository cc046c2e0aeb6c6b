use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::App;
use crate::classifier;
use crate::error::Result;
use crate::markup;
use crate::model::{Highlight, QuestionEntry};

/// Snapshot of a finished session, written as JSON by the front ends.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSession {
    pub title: String,
    pub level: u8,
    pub highlights: Vec<ExportHighlight>,
    pub questions: Vec<ExportQuestion>,
    pub answers: Map<String, Value>,
    pub rendered_text: String,
    pub holiday_pay: Option<String>,
    pub matched_terms: usize,
    pub total_terms: usize,
    pub summary: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportHighlight {
    pub id: String,
    pub text: String,
    pub identity: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuestion {
    pub identity: String,
    pub label: String,
    pub input_type: String,
    pub required: bool,
}

impl From<&Highlight> for ExportHighlight {
    fn from(h: &Highlight) -> Self {
        Self {
            id: h.id.to_string(),
            text: h.text.clone(),
            identity: classifier::classify(&h.text).identity.map(str::to_string),
            start_offset: h.range.start_offset,
            end_offset: h.range.end_offset,
        }
    }
}

impl From<&QuestionEntry> for ExportQuestion {
    fn from(entry: &QuestionEntry) -> Self {
        Self {
            identity: entry.identity.clone(),
            label: entry.display_label().to_string(),
            input_type: entry.input_type.as_str().to_string(),
            required: entry.required,
        }
    }
}

impl From<&App> for ExportSession {
    fn from(app: &App) -> Self {
        let highlights = app
            .document
            .as_ref()
            .map(|doc| doc.highlights_sorted().into_iter().map(ExportHighlight::from).collect())
            .unwrap_or_default();

        Self {
            title: app.title(),
            level: app.level.suffix(),
            highlights,
            questions: app.registry.entries().iter().map(ExportQuestion::from).collect(),
            answers: app.answers.to_json_map(),
            rendered_text: markup::to_plain_text(&app.rendered),
            holiday_pay: app.holiday_pay().map(|pay| pay.to_string()),
            matched_terms: app.exercise.matched_count(),
            total_terms: app.exercise.items().len(),
            summary: generate_summary(app),
        }
    }
}

pub fn to_json(app: &App) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ExportSession::from(app))?)
}

/// Human-readable recap shown on the Finish page.
pub fn generate_summary(app: &App) -> String {
    let mut summary = String::new();

    summary.push_str(&format!("## {}\n\n", app.title()));

    let entries = app.registry.entries();
    if entries.is_empty() {
        summary.push_str("No questions were generated.\n");
    } else {
        summary.push_str(&format!("### Answers ({} questions)\n\n", entries.len()));
        for entry in entries {
            let answer = app
                .answers
                .get(&entry.identity)
                .map(|v| v.display())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "(no answer)".to_string());
            summary.push_str(&format!("- {}: {}\n", entry.display_label(), answer));
        }
        summary.push('\n');
    }

    if let Some(pay) = app.holiday_pay() {
        summary.push_str(&format!("Holiday pay: {}\n\n", pay));
    }

    summary.push_str(&format!(
        "Matching exercise: {}/{} terms matched\n",
        app.exercise.matched_count(),
        app.exercise.items().len()
    ));

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::model::TextRange;

    fn app_with_name() -> App {
        let mut app = App::new();
        let content = app.document.as_ref().unwrap().content.clone();
        let start = content.find("[Employee Name]").unwrap();
        app.highlight_range(TextRange::new(start, start + "[Employee Name]".len()));
        app.set_page(crate::app::Page::LiveGeneration);
        app.dispatch(Action::Activate);
        for c in "Jane Doe".chars() {
            app.dispatch(Action::InputChar(c));
        }
        app.dispatch(Action::Submit);
        app
    }

    #[test]
    fn test_export_session_format() {
        let app = app_with_name();
        let json = to_json(&app).unwrap();

        assert!(json.contains("\"renderedText\""));
        assert!(json.contains("\"startOffset\""));
        assert!(json.contains("\"identity\": \"What's the employee's name?\""));
        assert!(json.contains("\"What's the employee's name?\": \"Jane Doe\""));
        assert!(json.contains("\"inputType\": \"Text\""));
        assert!(json.contains("\"totalTerms\": 4"));
    }

    #[test]
    fn test_rendered_text_is_plain() {
        let app = app_with_name();
        let session = ExportSession::from(&app);
        assert!(session.rendered_text.contains("Employee: Jane Doe, residing at"));
        assert!(!session.rendered_text.contains("<span"));
    }

    #[test]
    fn test_summary_lists_answers() {
        let app = app_with_name();
        let summary = generate_summary(&app);
        assert!(summary.starts_with("## Employment Agreement"));
        assert!(summary.contains("- What's the employee's name?: Jane Doe"));
        assert!(summary.contains("Matching exercise: 0/4 terms matched"));

        let empty = generate_summary(&App::new());
        assert!(empty.contains("No questions were generated."));
    }
}
