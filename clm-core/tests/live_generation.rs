use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use clm_core::classifier::{HR_CONTACT, PENSION_CLAUSE, PROBATION_LENGTH, SALARY};
use clm_core::render::has_section;
use clm_core::template::EMPLOYMENT_AGREEMENT;
use clm_core::{
    render, Action, AnswerRow, AnswerStore, App, Config, Currency, InputType, KeyValueStore, Level,
    MemoryStore, Page, QuestionRegistry, RenderOptions, Result, TextRange,
};

/// Store whose contents stay visible to the test after the app takes it.
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<BTreeMap<String, String>>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.0.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.0.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.0.borrow_mut().remove(key);
        Ok(())
    }
}

fn level_three_app(local: SharedStore) -> App {
    let config = Config {
        level: Level::Three,
        ..Config::default()
    };
    App::with_stores(config, Box::new(MemoryStore::new()), Box::new(local))
}

fn highlight(app: &mut App, needle: &str) {
    let content = app.document.as_ref().unwrap().content.clone();
    let start = content.find(needle).unwrap();
    app.highlight_range(TextRange::new(start, start + needle.len()));
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.dispatch(Action::InputChar(c));
    }
    app.dispatch(Action::Submit);
}

#[test]
fn test_agreement_generated_from_answers() {
    let mut app = level_three_app(SharedStore::default());
    highlight(&mut app, "[Employee Name]");
    highlight(&mut app, "[Annual Salary]");
    highlight(&mut app, "The Employee will be enrolled in [Pension Scheme Name].");

    let identities: Vec<_> = app.registry.entries().iter().map(|e| e.identity.as_str()).collect();
    assert_eq!(identities, vec!["What's the employee's name?", SALARY, PENSION_CLAUSE]);

    app.dispatch(Action::NextPage);
    app.dispatch(Action::NextPage);
    assert_eq!(app.page, Page::LiveGeneration);
    assert!(!has_section(&app.rendered, "PENSION"));

    app.dispatch(Action::Activate);
    type_text(&mut app, "Jane Doe");

    app.dispatch(Action::Down);
    app.dispatch(Action::Activate);
    type_text(&mut app, "60000");
    app.dispatch(Action::CycleCurrency);
    app.dispatch(Action::CycleCurrency);

    app.dispatch(Action::Down);
    app.dispatch(Action::AnswerYes);
    assert_eq!(
        app.answer_rows().last(),
        Some(&AnswerRow::FollowUp {
            parent: 2,
            identity: HR_CONTACT
        })
    );

    app.dispatch(Action::Down);
    app.dispatch(Action::Activate);
    type_text(&mut app, "hr@example.com");

    assert!(app.rendered.contains(">Jane Doe</span>"));
    assert!(app.rendered.contains(">GBP</span> <span"));
    assert!(app.rendered.contains(">60000</span>"));
    assert!(has_section(&app.rendered, "PENSION"));
    assert!(app.rendered.contains(">hr@example.com</span>"));

    app.dispatch(Action::Finish);
    assert_eq!(app.page, Page::Finish);

    let json = clm_core::to_json(&app).unwrap();
    assert!(json.contains("\"level\": 3"));
    assert!(json.contains("\"currency\": \"GBP\""));
}

#[test]
fn test_declined_gate_removes_section_and_follow_up() {
    let mut app = level_three_app(SharedStore::default());
    highlight(&mut app, "The Employee will be enrolled in [Pension Scheme Name].");
    app.set_page(Page::LiveGeneration);

    app.dispatch(Action::AnswerYes);
    app.dispatch(Action::Down);
    app.dispatch(Action::Activate);
    type_text(&mut app, "hr@example.com");
    assert!(app.rendered.contains("hr@example.com"));

    app.dispatch(Action::Up);
    app.dispatch(Action::AnswerNo);
    assert!(!has_section(&app.rendered, "PENSION"));
    assert!(!app.rendered.contains("hr@example.com"));
    assert_eq!(app.answer_rows(), vec![AnswerRow::Question(0)]);
}

#[test]
fn test_render_without_app() {
    let mut registry = QuestionRegistry::new(true);
    registry.register(&["[Probation Period Length]".to_string(), "[Job Title]".to_string()]);
    assert_eq!(registry.get(0).unwrap().identity, PROBATION_LENGTH);

    let mut answers = AnswerStore::new(Currency::Usd);
    answers.initialize(registry.entries());
    answers.set_text_answer(PROBATION_LENGTH, InputType::Text, "3 months");
    answers.set_text_answer("What's the job title?", InputType::Text, "Engineer & Lead");

    let rendered = render(EMPLOYMENT_AGREEMENT, &answers, &RenderOptions::default());

    // the probation gate was never asked, so its section stays
    assert!(has_section(&rendered, "PROBATIONARY PERIOD"));
    assert!(rendered.contains(">3 months</span> of employment"));
    assert!(rendered.contains(">Engineer &amp; Lead</span>"));
    assert!(rendered.contains("[Employee Name]"));
    assert_eq!(rendered, render(EMPLOYMENT_AGREEMENT, &answers, &RenderOptions::default()));
}

#[test]
fn test_holiday_result_written_to_local_store() {
    let local = SharedStore::default();
    local.clone().set("operationType", "subtract").unwrap();
    local.clone().set("operationValue", "2").unwrap();

    let mut app = level_three_app(local.clone());
    highlight(&mut app, "[Unused Holiday Days]");
    app.set_page(Page::LiveGeneration);
    app.dispatch(Action::Activate);
    type_text(&mut app, "5.5");

    assert_eq!(local.get("calculatedValue").unwrap().as_deref(), Some("3.5"));
    assert!(app.rendered.contains(">3.5</span>"));
}

#[test]
fn test_level_two_has_no_calculation() {
    let local = SharedStore::default();
    local.clone().set("operationType", "add").unwrap();
    local.clone().set("operationValue", "1").unwrap();

    let mut app = App::with_stores(Config::default(), Box::new(MemoryStore::new()), Box::new(local.clone()));
    highlight(&mut app, "[Unused Holiday Days]");
    app.set_page(Page::LiveGeneration);
    assert_eq!(app.answer_rows(), vec![AnswerRow::Question(0)]);

    app.dispatch(Action::Activate);
    type_text(&mut app, "4");
    assert!(app.rendered.contains("[Holiday Pay]"));
    assert_eq!(local.get("calculatedValue").unwrap().as_deref(), Some("0"));
}
