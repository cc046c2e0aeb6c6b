use tracing::{info, warn};

use crate::actions::{self, Action};
use crate::answers::AnswerStore;
use crate::classifier::{
    self, Classification, ADDITIONAL_LOCATION, ADDITIONAL_LOCATIONS_CLAUSE, SALARY, UNUSED_HOLIDAY,
};
use crate::config::{Config, Level, Theme};
use crate::cursor::CursorState;
use crate::error::Result;
use crate::holiday::{HolidayOperation, HolidayPay, Operation};
use crate::matching::{LayoutProbe, MatchResult, MatchingExercise};
use crate::model::{AnswerValue, Document, Highlight, InputType, QuestionEntry, TextRange};
use crate::registry::QuestionRegistry;
use crate::render::{self, RenderOptions};
use crate::storage::{self, KeyValueStore, MemoryStore};
use crate::template;

/// Screens of the trainer, in the order the user normally visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Document,
    Questionnaire,
    LiveGeneration,
    Matching,
    Finish,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Document => "Document",
            Page::Questionnaire => "Questionnaire",
            Page::LiveGeneration => "Live Generation",
            Page::Matching => "Matching Exercise",
            Page::Finish => "Finish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Visual,
    Input,
    TypePicker,
    Help,
}

/// Focus area on the Document page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Sidebar,
}

/// What the text being typed is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    Label(usize),
    Answer(usize),
    FollowUp(&'static str),
    ExtraLocation(usize),
    OperationValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchColumn {
    Terms,
    Definitions,
}

/// One selectable row on the Live Generation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerRow {
    /// Registry index.
    Question(usize),
    FollowUp {
        parent: usize,
        identity: &'static str,
    },
    /// Extra work location input; its answer position is `slot + 1`.
    ExtraLocation(usize),
    AddLocation,
    HolidayOperation,
}

/// Platform-agnostic application state
pub struct App {
    pub config: Config,
    pub level: Level,
    pub theme: Theme,
    pub page: Page,
    pub mode: Mode,
    pub focus: Focus,
    pub running: bool,

    // Document page
    pub document: Option<Document>,
    pub cursor: CursorState,
    pub selection_start: Option<(usize, usize)>,
    pub selection_end: Option<(usize, usize)>,
    pub sidebar_selected: usize,

    // Questionnaire
    pub registry: QuestionRegistry,
    pub question_selected: usize,
    pub type_selected: usize,

    // Live generation
    pub answers: AnswerStore,
    pub row_selected: usize,
    pub additional_locations: Vec<String>,
    pub rendered: String,

    // Matching
    pub exercise: MatchingExercise,
    pub match_column: MatchColumn,
    pub term_selected: usize,
    pub definition_selected: usize,
    /// Connector endpoints need recomputing from the next drawn layout.
    pub connectors_stale: bool,
    debouncer: crate::matching::Debouncer,

    // Input state
    pub input_buffer: String,
    pub input_target: InputTarget,

    /// Blocking message; the next action only dismisses it.
    pub alert: Option<String>,
    pub status_message: Option<String>,

    session: Box<dyn KeyValueStore>,
    local: Box<dyn KeyValueStore>,
}

impl App {
    pub fn new() -> Self {
        Self::with_stores(
            Config::default(),
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
        )
    }

    /// Build the app on the given session and local stores and open the
    /// bundled agreement.
    pub fn with_stores(
        config: Config,
        session: Box<dyn KeyValueStore>,
        local: Box<dyn KeyValueStore>,
    ) -> Self {
        let mut app = Self {
            level: config.level,
            theme: config.theme,
            page: Page::Document,
            mode: Mode::Normal,
            focus: Focus::Editor,
            running: true,

            document: None,
            cursor: CursorState::new(),
            selection_start: None,
            selection_end: None,
            sidebar_selected: 0,

            registry: QuestionRegistry::new(config.level.suggests_types()),
            question_selected: 0,
            type_selected: 0,

            answers: AnswerStore::new(config.default_currency),
            row_selected: 0,
            additional_locations: Vec::new(),
            rendered: String::new(),

            exercise: MatchingExercise::new(template::jargon()),
            match_column: MatchColumn::Terms,
            term_selected: 0,
            definition_selected: 0,
            connectors_stale: false,
            debouncer: crate::matching::Debouncer::new(config.line_debounce_ms),

            input_buffer: String::new(),
            input_target: InputTarget::Label(0),

            alert: None,
            status_message: None,

            config,
            session,
            local,
        };

        let entered = storage::enter_level(app.session.as_mut(), app.level);
        app.check_storage(entered);
        app.load_document(Document::employment_agreement());
        app
    }

    pub fn load_document(&mut self, doc: Document) {
        self.cursor.set_content(&doc.content);
        self.document = Some(doc);
        self.sidebar_selected = 0;
        self.sync_questions();
    }

    pub fn title(&self) -> String {
        self.document
            .as_ref()
            .map(|d| d.title.clone())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    pub fn content_lines(&self) -> Vec<&str> {
        self.document
            .as_ref()
            .map(|d| d.content.split('\n').collect())
            .unwrap_or_default()
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    fn check_storage(&mut self, result: Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "storage write failed");
            self.set_status(&format!("Storage error: {}", e));
        }
    }

    // ----------------------------------------------------------------------
    // Dispatch

    /// Apply one user action. The document is re-rendered before this
    /// returns whenever an answer changed.
    pub fn dispatch(&mut self, action: Action) {
        if self.alert.is_some() {
            self.alert = None;
            return;
        }

        match self.mode {
            Mode::Help => self.mode = Mode::Normal,
            Mode::Input => self.handle_input(action),
            Mode::TypePicker => self.handle_type_picker(action),
            Mode::Visual => self.handle_visual(action),
            Mode::Normal => self.handle_normal(action),
        }
    }

    fn handle_normal(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit(),
            Action::ShowHelp => self.mode = Mode::Help,
            Action::ToggleTheme => self.toggle_theme(),
            Action::OpenMatching => self.set_page(Page::Matching),
            Action::NextPage => self.next_page(),
            Action::PrevPage => self.prev_page(),
            Action::Finish if self.page == Page::LiveGeneration => {
                self.finish();
            }
            _ => match self.page {
                Page::Document => self.handle_document(action),
                Page::Questionnaire => self.handle_questionnaire(action),
                Page::LiveGeneration => self.handle_live(action),
                Page::Matching => self.handle_matching(action),
                Page::Finish => {}
            },
        }
    }

    fn handle_input(&mut self, action: Action) {
        match action {
            Action::InputChar(c) => {
                self.input_buffer.push(c);
                self.apply_input();
            }
            Action::Backspace => {
                self.input_buffer.pop();
                self.apply_input();
            }
            Action::Submit | Action::Dismiss => {
                self.input_buffer.clear();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn handle_type_picker(&mut self, action: Action) {
        let len = InputType::all().len();
        match action {
            Action::Down => self.type_selected = (self.type_selected + 1) % len,
            Action::Up => self.type_selected = (self.type_selected + len - 1) % len,
            Action::Submit | Action::Activate => {
                let input_type = InputType::all()[self.type_selected % len];
                self.choose_type(input_type);
                self.mode = Mode::Normal;
            }
            Action::Dismiss => self.mode = Mode::Normal,
            _ => {}
        }
    }

    fn handle_visual(&mut self, action: Action) {
        match action {
            Action::Dismiss => {
                self.mode = Mode::Normal;
                self.selection_start = None;
                self.selection_end = None;
            }
            Action::Highlight | Action::Submit => {
                self.highlight_selection();
            }
            other => {
                if self.move_cursor(other) {
                    self.update_selection();
                }
            }
        }
    }

    // ----------------------------------------------------------------------
    // Pages

    pub fn set_page(&mut self, page: Page) {
        if page == Page::LiveGeneration {
            self.restore_questionnaire();
            self.answers.initialize(self.registry.entries());
            self.refresh_render();
            self.row_selected = self.row_selected.min(self.answer_rows().len().saturating_sub(1));
        }
        if page == Page::Questionnaire {
            self.question_selected = self.question_selected.min(self.registry.len().saturating_sub(1));
        }
        if page == Page::Matching {
            self.connectors_stale = true;
        }
        info!(page = page.title(), "page change");
        self.page = page;
    }

    fn next_page(&mut self) {
        match self.page {
            Page::Document => self.set_page(Page::Questionnaire),
            Page::Questionnaire => self.set_page(Page::LiveGeneration),
            Page::LiveGeneration => {
                self.finish();
            }
            Page::Matching | Page::Finish => {}
        }
    }

    fn prev_page(&mut self) {
        match self.page {
            Page::Questionnaire | Page::Matching => self.set_page(Page::Document),
            Page::LiveGeneration => self.set_page(Page::Questionnaire),
            Page::Finish => self.set_page(Page::LiveGeneration),
            Page::Document => {}
        }
    }

    /// Try to leave the Live Generation page. Refusals become a blocking
    /// alert.
    pub fn finish(&mut self) -> bool {
        match self.answers.submit(self.registry.entries()) {
            Ok(()) => {
                self.set_page(Page::Finish);
                true
            }
            Err(rejection) => {
                self.alert = Some(rejection.to_string());
                false
            }
        }
    }

    pub fn quit(&mut self) {
        let cleared = storage::exit_level(self.session.as_mut(), self.level);
        self.check_storage(cleared);
        self.running = false;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.refresh_render();
    }

    // ----------------------------------------------------------------------
    // Document page

    fn move_cursor(&mut self, action: Action) -> bool {
        match action {
            Action::Up => self.cursor.move_up(),
            Action::Down => self.cursor.move_down(),
            Action::Left => self.cursor.move_left(),
            Action::Right => self.cursor.move_right(),
            Action::Top => self.cursor.move_to_top(),
            Action::Bottom => self.cursor.move_to_bottom(),
            Action::WordForward => self.cursor.move_word_forward(),
            Action::WordEnd => self.cursor.move_word_end(),
            Action::WordBack => self.cursor.move_word_back(),
            Action::LineStart => self.cursor.move_to_start(),
            Action::LineEnd => self.cursor.move_to_end(),
            _ => return false,
        }
        true
    }

    fn handle_document(&mut self, action: Action) {
        match action {
            Action::ToggleFocus => self.toggle_focus(),
            Action::NextHighlight => self.next_highlight(),
            Action::PrevHighlight => self.prev_highlight(),
            Action::StartSelection => self.enter_visual_mode(),
            Action::RemoveHighlight => {
                self.delete_selected_highlight();
            }
            Action::Down if self.focus == Focus::Sidebar => self.next_highlight(),
            Action::Up if self.focus == Focus::Sidebar => self.prev_highlight(),
            other => {
                self.move_cursor(other);
            }
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor => Focus::Sidebar,
            Focus::Sidebar => Focus::Editor,
        };
    }

    pub fn cursor_pos(&self) -> (usize, usize) {
        self.cursor.cursor()
    }

    pub fn enter_visual_mode(&mut self) {
        self.mode = Mode::Visual;
        let cursor = self.cursor.cursor();
        self.selection_start = Some(cursor);
        self.selection_end = Some(cursor);
    }

    pub fn update_selection(&mut self) {
        if self.mode == Mode::Visual {
            self.selection_end = Some(self.cursor.cursor());
        }
    }

    /// Selected byte range, both ends inclusive of the character under them.
    pub fn get_selection_range(&self) -> Option<(usize, usize)> {
        if self.mode != Mode::Visual {
            return None;
        }
        let start = self.selection_start?;
        let end = self.selection_end?;

        let a = self.cursor.cursor_to_offset(start.0, start.1);
        let b = self.cursor.cursor_to_offset(end.0, end.1);
        let (lo, hi) = (a.min(b), a.max(b));

        let content = self.document.as_ref().map(|d| d.content.as_str()).unwrap_or("");
        let hi = content
            .get(hi..)
            .and_then(|rest| rest.chars().next())
            .map_or(hi, |c| hi + c.len_utf8());
        Some((lo, hi))
    }

    /// Highlight the visual selection and leave visual mode.
    pub fn highlight_selection(&mut self) {
        let range = self.get_selection_range();
        self.mode = Mode::Normal;
        self.selection_start = None;
        self.selection_end = None;
        if let Some((start, end)) = range {
            self.highlight_range(TextRange::new(start, end));
        }
    }

    /// Highlight `range` of the document and rebuild the questions. Returns
    /// how the highlighted text classified, or `None` if nothing was added.
    pub fn highlight_range(&mut self, range: TextRange) -> Option<Classification> {
        let doc = self.document.as_mut()?;
        let text = doc.add_highlight(range)?.text.clone();
        let classification = classifier::classify(&text);

        match classification.identity {
            Some(identity) => self.set_status(&format!("Highlighted: {}", identity)),
            None => self.set_status("Highlighted, but not a known placeholder"),
        }
        self.sync_questions();
        Some(classification)
    }

    pub fn selected_highlight(&self) -> Option<&Highlight> {
        let doc = self.document.as_ref()?;
        doc.highlights_sorted().get(self.sidebar_selected).copied()
    }

    pub fn next_highlight(&mut self) {
        if let Some(doc) = &self.document {
            let count = doc.highlights.len();
            if count > 0 {
                self.sidebar_selected = (self.sidebar_selected + 1) % count;
                if let Some(offset) = actions::highlight_offset_by_index(doc, self.sidebar_selected) {
                    self.cursor.set_cursor_offset(offset);
                }
            }
        }
    }

    pub fn prev_highlight(&mut self) {
        if let Some(doc) = &self.document {
            let count = doc.highlights.len();
            if count > 0 {
                self.sidebar_selected = if self.sidebar_selected == 0 {
                    count - 1
                } else {
                    self.sidebar_selected - 1
                };
                if let Some(offset) = actions::highlight_offset_by_index(doc, self.sidebar_selected) {
                    self.cursor.set_cursor_offset(offset);
                }
            }
        }
    }

    pub fn delete_selected_highlight(&mut self) -> bool {
        let Some(id) = self.selected_highlight().map(|h| h.id) else {
            return false;
        };
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        if doc.remove_highlight(id).is_none() {
            return false;
        }
        let count = doc.highlights.len();
        if self.sidebar_selected >= count && count > 0 {
            self.sidebar_selected = count - 1;
        }
        self.set_status("Highlight removed");
        self.sync_questions();
        true
    }

    /// Rebuild the question set after the highlights changed. Any saved
    /// question order no longer applies.
    fn sync_questions(&mut self) {
        let fragments = self
            .document
            .as_ref()
            .map(Document::highlighted_texts)
            .unwrap_or_default();
        self.registry.register(&fragments);

        let removed = self.session.remove(&storage::question_order_key(self.level));
        self.check_storage(removed);
        self.persist_types();

        self.answers.initialize(self.registry.entries());
        self.refresh_render();
    }

    // ----------------------------------------------------------------------
    // Questionnaire

    fn handle_questionnaire(&mut self, action: Action) {
        let len = self.registry.len();
        match action {
            Action::Down if len > 0 => self.question_selected = (self.question_selected + 1) % len,
            Action::Up if len > 0 => self.question_selected = (self.question_selected + len - 1) % len,
            Action::EditLabel | Action::Activate => {
                if let Some(entry) = self.registry.get(self.question_selected) {
                    self.input_buffer = entry.label.clone();
                    self.input_target = InputTarget::Label(self.question_selected);
                    self.mode = Mode::Input;
                }
            }
            Action::PickType => self.open_type_picker(),
            Action::ToggleRequired => {
                if let Some(required) = self.registry.get(self.question_selected).map(|e| e.required) {
                    if let Err(e) = self.registry.set_required(self.question_selected, !required) {
                        self.set_status(&e.to_string());
                    }
                }
            }
            Action::MoveQuestionUp if self.question_selected > 0 => {
                self.move_question(self.question_selected, self.question_selected - 1);
            }
            Action::MoveQuestionDown if self.question_selected + 1 < len => {
                self.move_question(self.question_selected, self.question_selected + 1);
            }
            _ => {}
        }
    }

    fn open_type_picker(&mut self) {
        let Some(entry) = self.registry.get(self.question_selected) else {
            return;
        };
        if entry.type_locked {
            self.set_status("The type of this question has already been chosen");
            return;
        }
        self.type_selected = InputType::all()
            .iter()
            .position(|t| *t == entry.input_type)
            .unwrap_or(0);
        self.mode = Mode::TypePicker;
    }

    fn choose_type(&mut self, input_type: InputType) {
        match self.registry.set_type(self.question_selected, input_type) {
            Ok(()) => {
                self.persist_types();
                self.set_status(&format!("Type set to {}", input_type.as_str()));
            }
            Err(e) => self.set_status(&e.to_string()),
        }
    }

    fn move_question(&mut self, from: usize, to: usize) {
        if self.registry.move_entry(from, to).is_ok() {
            self.question_selected = to;
            let order = self.registry.order();
            let saved = storage::set_json(
                self.session.as_mut(),
                &storage::question_order_key(self.level),
                &order,
            );
            self.check_storage(saved);
        }
    }

    fn persist_types(&mut self) {
        let (types, locks) = self.registry.types_by_origin();
        let level = self.level;
        let saved = storage::set_json(self.session.as_mut(), &storage::selected_types_key(level), &types)
            .and_then(|()| storage::set_json(self.session.as_mut(), &storage::type_changed_key(level), &locks));
        self.check_storage(saved);
    }

    /// Re-apply the types and order saved in the session store.
    fn restore_questionnaire(&mut self) {
        let level = self.level;
        let session = self.session.as_ref();
        let types = storage::get_json::<Vec<InputType>>(session, &storage::selected_types_key(level));
        let locks = storage::get_json::<Vec<bool>>(session, &storage::type_changed_key(level));
        let order = storage::get_json::<Vec<usize>>(session, &storage::question_order_key(level));

        match (types, locks, order) {
            (Ok(types), Ok(locks), Ok(order)) => {
                if let (Some(types), Some(locks)) = (types, locks) {
                    self.registry.restore_types(&types, &locks);
                }
                if let Some(order) = order {
                    self.registry.apply_order(&order);
                }
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                warn!(error = %e, "could not read questionnaire state");
            }
        }
    }

    // ----------------------------------------------------------------------
    // Live generation

    /// Whether the additional-location question is shown. It hides once its
    /// clause has been asked and not answered yes.
    fn location_question_visible(&self) -> bool {
        match self.answers.get(ADDITIONAL_LOCATIONS_CLAUSE) {
            None | Some(AnswerValue::Flag(true)) => true,
            Some(_) => false,
        }
    }

    pub fn answer_rows(&self) -> Vec<AnswerRow> {
        let mut rows = Vec::new();
        let active = self.answers.active_follow_ups();

        for (index, entry) in self.registry.entries().iter().enumerate() {
            let is_location = entry.identity == ADDITIONAL_LOCATION;
            if is_location && !self.location_question_visible() {
                continue;
            }
            rows.push(AnswerRow::Question(index));

            for rule in active.iter().filter(|rule| rule.parent == entry.identity) {
                if !self.registry.contains(rule.follow_up) {
                    rows.push(AnswerRow::FollowUp {
                        parent: index,
                        identity: rule.follow_up,
                    });
                }
            }

            if is_location && self.answers.flag(ADDITIONAL_LOCATIONS_CLAUSE) == Some(true) {
                rows.extend((0..self.additional_locations.len()).map(AnswerRow::ExtraLocation));
                rows.push(AnswerRow::AddLocation);
            }

            if entry.identity == UNUSED_HOLIDAY && self.level.has_calculations() {
                rows.push(AnswerRow::HolidayOperation);
            }
        }
        rows
    }

    pub fn selected_row(&self) -> Option<AnswerRow> {
        self.answer_rows().get(self.row_selected).copied()
    }

    fn selected_question(&self) -> Option<(usize, &QuestionEntry)> {
        match self.selected_row()? {
            AnswerRow::Question(index) => self.registry.get(index).map(|e| (index, e)),
            _ => None,
        }
    }

    fn handle_live(&mut self, action: Action) {
        let len = self.answer_rows().len();
        match action {
            Action::Down if len > 0 => self.row_selected = (self.row_selected + 1) % len,
            Action::Up if len > 0 => self.row_selected = (self.row_selected + len - 1) % len,
            Action::Activate => self.activate_row(),
            Action::AnswerYes => self.answer_flag(true),
            Action::AnswerNo => self.answer_flag(false),
            Action::CycleCurrency => {
                let Some((_, entry)) = self.selected_question() else {
                    return;
                };
                if entry.identity != SALARY {
                    return;
                }
                let current = self
                    .answers
                    .get(SALARY)
                    .and_then(AnswerValue::as_salary)
                    .and_then(|s| s.currency)
                    .unwrap_or(self.config.default_currency);
                self.answers.set_salary_currency(SALARY, current.next());
                self.refresh_render();
            }
            Action::CycleOperation if self.selected_row() == Some(AnswerRow::HolidayOperation) => {
                let next = self.holiday_operation_type().map_or(Operation::Add, |op| op.next());
                let saved = self.local.set(storage::OPERATION_TYPE_KEY, next.as_str());
                self.check_storage(saved);
                self.refresh_render();
            }
            _ => {}
        }
    }

    fn activate_row(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        match row {
            AnswerRow::Question(index) => {
                let Some(entry) = self.registry.get(index) else {
                    return;
                };
                if entry.input_type == InputType::Radio && entry.identity != SALARY {
                    let next = self.answers.flag(&entry.identity) != Some(true);
                    self.answer_flag(next);
                    return;
                }
                self.input_buffer = self.answer_text(&entry.identity);
                self.input_target = InputTarget::Answer(index);
                self.mode = Mode::Input;
            }
            AnswerRow::FollowUp { identity, .. } => {
                self.input_buffer = self.answers.text(identity).unwrap_or_default().to_string();
                self.input_target = InputTarget::FollowUp(identity);
                self.mode = Mode::Input;
            }
            AnswerRow::ExtraLocation(slot) => {
                self.input_buffer = self.additional_locations.get(slot).cloned().unwrap_or_default();
                self.input_target = InputTarget::ExtraLocation(slot);
                self.mode = Mode::Input;
            }
            AnswerRow::AddLocation => {
                self.additional_locations.push(String::new());
                if let Some(pos) = self
                    .answer_rows()
                    .iter()
                    .position(|r| *r == AnswerRow::ExtraLocation(self.additional_locations.len() - 1))
                {
                    self.row_selected = pos;
                }
            }
            AnswerRow::HolidayOperation => {
                self.input_buffer = self.holiday_operation_value().unwrap_or_default();
                self.input_target = InputTarget::OperationValue;
                self.mode = Mode::Input;
            }
        }
    }

    /// Editable text of an answer.
    fn answer_text(&self, identity: &str) -> String {
        match self.answers.get(identity) {
            Some(AnswerValue::Text(s)) => {
                if identity == ADDITIONAL_LOCATION {
                    answers_first_item(s)
                } else {
                    s.clone()
                }
            }
            Some(AnswerValue::Salary(s)) => s.amount.clone(),
            _ => String::new(),
        }
    }

    fn answer_flag(&mut self, flag: bool) {
        let Some((_, entry)) = self.selected_question() else {
            return;
        };
        if entry.input_type != InputType::Radio {
            return;
        }
        let identity = entry.identity.clone();
        self.answers.set_answer(&identity, AnswerValue::Flag(flag));
        self.refresh_render();
    }

    /// Push the input buffer into whatever it is editing.
    fn apply_input(&mut self) {
        let value = self.input_buffer.clone();
        match self.input_target {
            InputTarget::Label(index) => {
                if let Err(e) = self.registry.set_label(index, &value) {
                    self.set_status(&e.to_string());
                }
            }
            InputTarget::Answer(index) => {
                let Some(entry) = self.registry.get(index) else {
                    return;
                };
                let identity = entry.identity.clone();
                let input_type = entry.input_type;
                if identity == SALARY {
                    self.answers.set_salary_amount(&identity, &value);
                } else if identity == ADDITIONAL_LOCATION {
                    self.answers.append_list_answer(&identity, &value, 0);
                } else {
                    self.answers.set_text_answer(&identity, input_type, &value);
                }
                self.refresh_render();
            }
            InputTarget::FollowUp(identity) => {
                self.answers.set_answer(identity, AnswerValue::text(value));
                self.refresh_render();
            }
            InputTarget::ExtraLocation(slot) => {
                if let Some(location) = self.additional_locations.get_mut(slot) {
                    location.clone_from(&value);
                }
                self.answers.append_list_answer(ADDITIONAL_LOCATION, &value, slot + 1);
                self.refresh_render();
            }
            InputTarget::OperationValue => {
                let saved = self.local.set(storage::OPERATION_VALUE_KEY, &value);
                self.check_storage(saved);
                self.refresh_render();
            }
        }
    }

    pub fn holiday_operation_type(&self) -> Option<Operation> {
        self.local
            .get(storage::OPERATION_TYPE_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
    }

    pub fn holiday_operation_value(&self) -> Option<String> {
        self.local.get(storage::OPERATION_VALUE_KEY).ok().flatten()
    }

    fn holiday_operation(&self) -> Option<HolidayOperation> {
        if !self.level.has_calculations() {
            return None;
        }
        let operation = self.local.get(storage::OPERATION_TYPE_KEY).ok().flatten();
        let value = self.holiday_operation_value();
        HolidayOperation::from_stored(operation.as_deref(), value.as_deref())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            highlight_class: self.config.highlight.class_for(self.theme).to_string(),
            holiday: self.holiday_operation(),
        }
    }

    /// Current derived holiday pay, if it can be computed.
    pub fn holiday_pay(&self) -> Option<HolidayPay> {
        render::holiday_pay(&self.answers, &self.render_options())
    }

    /// Re-render the document from the current answers and record the
    /// derived holiday pay in the local store.
    pub fn refresh_render(&mut self) {
        let options = self.render_options();
        let source = self
            .document
            .as_ref()
            .map(|d| d.source.as_str())
            .unwrap_or(template::EMPLOYMENT_AGREEMENT);
        self.rendered = render::render(source, &self.answers, &options);

        if self.answers.text(UNUSED_HOLIDAY).is_some() {
            let calculated = render::holiday_pay(&self.answers, &options)
                .map_or_else(|| "0".to_string(), |pay| pay.to_string());
            let saved = self.local.set(storage::CALCULATED_VALUE_KEY, &calculated);
            self.check_storage(saved);
        }
    }

    /// Identity shown for a row, with its display label.
    pub fn row_label(&self, row: AnswerRow) -> String {
        match row {
            AnswerRow::Question(index) => self
                .registry
                .get(index)
                .map(|e| e.display_label().to_string())
                .unwrap_or_default(),
            AnswerRow::FollowUp { identity, .. } => identity.to_string(),
            AnswerRow::ExtraLocation(slot) => format!("Additional location {}", slot + 2),
            AnswerRow::AddLocation => "+ Add more locations".to_string(),
            AnswerRow::HolidayOperation => "Holiday pay calculation".to_string(),
        }
    }

    // ----------------------------------------------------------------------
    // Matching

    fn handle_matching(&mut self, action: Action) {
        let len = self.exercise.items().len();
        if len == 0 {
            return;
        }
        match action {
            Action::Left | Action::Right | Action::ToggleFocus => {
                self.match_column = match self.match_column {
                    MatchColumn::Terms => MatchColumn::Definitions,
                    MatchColumn::Definitions => MatchColumn::Terms,
                };
            }
            Action::Down => match self.match_column {
                MatchColumn::Terms => self.term_selected = (self.term_selected + 1) % len,
                MatchColumn::Definitions => self.definition_selected = (self.definition_selected + 1) % len,
            },
            Action::Up => match self.match_column {
                MatchColumn::Terms => self.term_selected = (self.term_selected + len - 1) % len,
                MatchColumn::Definitions => {
                    self.definition_selected = (self.definition_selected + len - 1) % len
                }
            },
            Action::Select | Action::Activate => self.select_match(),
            Action::Dismiss => self.set_page(Page::Document),
            _ => {}
        }
    }

    fn select_match(&mut self) {
        match self.match_column {
            MatchColumn::Terms => {
                if let Some(id) = self.exercise.items().get(self.term_selected).map(|i| i.id.clone()) {
                    self.exercise.select_term(&id);
                    if self.exercise.selected_term().is_some() {
                        self.match_column = MatchColumn::Definitions;
                    }
                }
            }
            MatchColumn::Definitions => {
                let Some(id) = self
                    .exercise
                    .items()
                    .get(self.definition_selected)
                    .map(|i| i.id.clone())
                else {
                    return;
                };
                match self.exercise.select_definition(&id) {
                    MatchResult::Correct => {
                        self.set_status("Correct!");
                        self.match_column = MatchColumn::Terms;
                    }
                    MatchResult::Incorrect => {
                        self.set_status("Not quite, try again");
                        self.match_column = MatchColumn::Terms;
                    }
                    MatchResult::Ignored => {}
                }
                self.connectors_stale = true;
                if self.exercise.take_completion() {
                    self.set_status("Well done! All terms matched.");
                }
            }
        }
    }

    /// The exercise area moved or resized; recompute connectors once the
    /// burst settles.
    pub fn layout_changed(&mut self, now_ms: u64) {
        self.debouncer.trigger(now_ms);
    }

    /// Drive time-based work. Call regularly from the front end.
    pub fn tick(&mut self, now_ms: u64) {
        if self.debouncer.poll(now_ms) {
            self.connectors_stale = true;
        }
    }

    pub fn refresh_connectors(&mut self, probe: &dyn LayoutProbe) -> bool {
        self.connectors_stale = false;
        self.exercise.refresh_connectors(probe)
    }
}

/// First entry of a list answer such as `"A, B, and C"`.
fn answers_first_item(list: &str) -> String {
    crate::answers::split_list(list).into_iter().next().unwrap_or_default()
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{PROBATION_CLAUSE, SICK_PAY_CLAUSE, SICK_PAY_POLICY};
    use crate::model::Currency;
    use crate::render::has_section;

    fn level_three() -> App {
        let config = Config {
            level: Level::Three,
            ..Config::default()
        };
        App::with_stores(config, Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
    }

    fn highlight(app: &mut App, needle: &str) -> Option<Classification> {
        let content = app.document.as_ref().unwrap().content.clone();
        let start = content.find(needle).unwrap();
        app.highlight_range(TextRange::new(start, start + needle.len()))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.dispatch(Action::InputChar(c));
        }
        app.dispatch(Action::Submit);
    }

    #[test]
    fn test_label_edit_on_missing_question_reports_error() {
        let mut app = App::new();
        assert_eq!(app.registry.len(), 0);
        app.input_target = InputTarget::Label(3);
        app.mode = Mode::Input;

        app.dispatch(Action::InputChar('x'));
        assert_eq!(
            app.status_message.as_deref(),
            Some("Index 3 is out of range (len 0)")
        );
    }

    fn select_row(app: &mut App, row: AnswerRow) {
        app.row_selected = app.answer_rows().iter().position(|r| *r == row).unwrap();
    }

    #[test]
    fn test_highlight_to_rendered_answer() {
        let mut app = App::new();
        let classification = highlight(&mut app, "[Employee Name]").unwrap();
        assert_eq!(classification.identity, Some("What's the employee's name?"));
        assert_eq!(app.registry.len(), 1);
        assert_eq!(app.registry.get(0).unwrap().input_type, InputType::Text);

        app.dispatch(Action::NextPage);
        app.dispatch(Action::NextPage);
        assert_eq!(app.page, Page::LiveGeneration);

        app.dispatch(Action::Activate);
        assert_eq!(app.mode, Mode::Input);
        type_text(&mut app, "Jane Doe");

        assert!(app.rendered.contains(">Jane Doe</span>"));
        assert!(!app.rendered.contains("[Employee Name]"));
    }

    #[test]
    fn test_visual_selection_is_inclusive() {
        let mut app = App::new();
        let content = app.document.as_ref().unwrap().content.clone();
        let start = content.find("[Job Title]").unwrap();

        app.cursor.set_cursor_offset(start);
        app.dispatch(Action::StartSelection);
        app.cursor.set_cursor_offset(start + "[Job Title]".len() - 1);
        app.update_selection();
        app.dispatch(Action::Highlight);

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(
            app.document.as_ref().unwrap().highlighted_texts(),
            vec!["[Job Title]".to_string()]
        );
        assert_eq!(app.registry.get(0).unwrap().identity, "What's the job title?");
    }

    #[test]
    fn test_required_question_blocks_finish() {
        let mut app = App::new();
        highlight(&mut app, "[Job Title]");
        app.set_page(Page::Questionnaire);
        app.dispatch(Action::ToggleRequired);

        app.set_page(Page::LiveGeneration);
        app.dispatch(Action::Finish);
        assert_eq!(
            app.alert.as_deref(),
            Some("Please answer all required questions: What's the job title?")
        );
        assert_eq!(app.page, Page::LiveGeneration);

        // the alert swallows the next action
        app.dispatch(Action::Activate);
        assert!(app.alert.is_none());
        assert_eq!(app.mode, Mode::Normal);

        app.dispatch(Action::Activate);
        type_text(&mut app, "Engineer");
        app.dispatch(Action::Finish);
        assert_eq!(app.page, Page::Finish);
    }

    #[test]
    fn test_input_errors_block_finish() {
        let mut app = level_three();
        highlight(&mut app, "[Employee Email]");
        app.set_page(Page::LiveGeneration);
        app.dispatch(Action::Activate);
        type_text(&mut app, "not-an-email");

        assert!(app.answers.error("What's the employee's email address?").is_some());
        assert!(!app.finish());
        assert_eq!(
            app.alert.as_deref(),
            Some("Please correct all input errors before finishing.")
        );
    }

    #[test]
    fn test_type_is_chosen_once() {
        let mut app = App::new();
        highlight(&mut app, "[Company Car]");
        app.set_page(Page::Questionnaire);

        app.dispatch(Action::PickType);
        assert_eq!(app.mode, Mode::TypePicker);
        // Text -> Paragraph -> Email -> Radio
        for _ in 0..3 {
            app.dispatch(Action::Down);
        }
        app.dispatch(Action::Submit);
        assert_eq!(app.registry.get(0).unwrap().input_type, InputType::Radio);

        app.dispatch(Action::PickType);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.status_message.is_some());

        let saved = app.session.get("typeChangedStates_2").unwrap().unwrap();
        assert_eq!(saved, "[true]");
    }

    #[test]
    fn test_gate_and_follow_up_rows() {
        let mut app = level_three();
        highlight(
            &mut app,
            "The first [Probation Period Length] of employment will be a probationary period.",
        );
        highlight(&mut app, "[Probation Period Length]");
        highlight(&mut app, "{The Employee may also be entitled to Company sick pay of [Details of Company Sick Pay Policy]}");
        assert_eq!(app.registry.len(), 2);

        app.set_page(Page::LiveGeneration);
        assert!(!has_section(&app.rendered, "PROBATIONARY PERIOD"));

        app.dispatch(Action::AnswerYes);
        assert!(has_section(&app.rendered, "PROBATIONARY PERIOD"));
        assert!(app.answer_rows().contains(&AnswerRow::FollowUp {
            parent: 0,
            identity: crate::classifier::PROBATION_LENGTH
        }));

        select_row(&mut app, AnswerRow::Question(1));
        assert_eq!(app.registry.get(1).unwrap().identity, SICK_PAY_CLAUSE);
        app.dispatch(Action::Activate);
        assert_eq!(app.answers.flag(SICK_PAY_CLAUSE), Some(true));

        select_row(
            &mut app,
            AnswerRow::FollowUp {
                parent: 1,
                identity: SICK_PAY_POLICY,
            },
        );
        app.dispatch(Action::Activate);
        type_text(&mut app, "full pay");
        assert!(app.rendered.contains(">full pay</span>"));

        select_row(&mut app, AnswerRow::Question(0));
        app.dispatch(Action::AnswerNo);
        assert_eq!(app.answers.flag(PROBATION_CLAUSE), Some(false));
        assert!(!has_section(&app.rendered, "PROBATIONARY PERIOD"));
    }

    #[test]
    fn test_additional_locations() {
        let mut app = level_three();
        highlight(&mut app, "The Employee may also be required to work at [Additional Work Locations].");
        highlight(&mut app, "[Additional Work Locations]");
        app.set_page(Page::LiveGeneration);

        // clause unanswered: the location question is hidden
        assert_eq!(app.answer_rows(), vec![AnswerRow::Question(0)]);

        app.dispatch(Action::AnswerYes);
        assert_eq!(
            app.answer_rows(),
            vec![AnswerRow::Question(0), AnswerRow::Question(1), AnswerRow::AddLocation]
        );

        select_row(&mut app, AnswerRow::Question(1));
        app.dispatch(Action::Activate);
        type_text(&mut app, "London");

        select_row(&mut app, AnswerRow::AddLocation);
        app.dispatch(Action::Activate);
        assert_eq!(app.selected_row(), Some(AnswerRow::ExtraLocation(0)));
        app.dispatch(Action::Activate);
        type_text(&mut app, "Leeds");

        assert_eq!(app.answers.text(ADDITIONAL_LOCATION), Some("London and Leeds"));
        assert!(app.rendered.contains(">London and Leeds</span>"));
    }

    #[test]
    fn test_salary_and_currency() {
        let mut app = App::new();
        highlight(&mut app, "[Annual Salary]");
        app.set_page(Page::LiveGeneration);

        app.dispatch(Action::CycleCurrency);
        app.dispatch(Action::Activate);
        type_text(&mut app, "52000");

        let salary = app.answers.get(SALARY).and_then(AnswerValue::as_salary).unwrap();
        assert_eq!(salary.currency, Some(Currency::Eur));
        assert_eq!(salary.amount, "52000");
        assert!(app.rendered.contains(">EUR</span> <span"));
    }

    #[test]
    fn test_holiday_calculation_uses_local_store() {
        let mut app = level_three();
        highlight(&mut app, "[Unused Holiday Days]");
        app.set_page(Page::LiveGeneration);
        assert_eq!(
            app.answer_rows(),
            vec![AnswerRow::Question(0), AnswerRow::HolidayOperation]
        );

        app.dispatch(Action::Activate);
        type_text(&mut app, "5");
        assert_eq!(app.local.get("calculatedValue").unwrap().as_deref(), Some("0"));

        app.dispatch(Action::Down);
        app.dispatch(Action::CycleOperation);
        app.dispatch(Action::CycleOperation);
        app.dispatch(Action::CycleOperation);
        assert_eq!(app.holiday_operation_type(), Some(Operation::Multiply));
        app.dispatch(Action::Activate);
        type_text(&mut app, "200");

        assert_eq!(app.local.get("calculatedValue").unwrap().as_deref(), Some("1000"));
        assert!(app.rendered.contains(">1000</span>"));

        app.dispatch(Action::CycleOperation);
        app.dispatch(Action::Activate);
        app.input_buffer.clear();
        app.dispatch(Action::InputChar('0'));
        app.dispatch(Action::Submit);
        assert_eq!(app.holiday_pay(), Some(HolidayPay::Error));
        assert!(app.rendered.contains(">Error</span>"));
    }

    #[test]
    fn test_reorder_is_persisted_and_reset_by_new_highlights() {
        let mut app = App::new();
        highlight(&mut app, "[Job Title]");
        highlight(&mut app, "[Employee Name]");
        app.set_page(Page::Questionnaire);
        app.dispatch(Action::MoveQuestionDown);

        assert_eq!(app.session.get("questionOrder_2").unwrap().as_deref(), Some("[1,0]"));
        app.set_page(Page::LiveGeneration);
        assert_eq!(app.registry.order(), vec![1, 0]);

        highlight(&mut app, "[Line Manager]");
        assert_eq!(app.session.get("questionOrder_2").unwrap(), None);
        assert_eq!(app.registry.order(), vec![0, 1, 2]);
    }

    #[test]
    fn test_quit_clears_session_keys() {
        let mut app = App::new();
        highlight(&mut app, "[Job Title]");
        assert_eq!(app.session.get("level").unwrap().as_deref(), Some("/Level-Two-Part-Two"));

        app.dispatch(Action::Quit);
        assert!(!app.running);
        assert_eq!(app.session.get("level").unwrap(), None);
        assert_eq!(app.session.get("selectedQuestionTypes_2").unwrap(), None);
    }

    #[test]
    fn test_theme_switches_highlight_class() {
        let mut app = App::new();
        highlight(&mut app, "[Job Title]");
        app.set_page(Page::LiveGeneration);
        app.dispatch(Action::Activate);
        type_text(&mut app, "Engineer");
        assert!(app.rendered.contains("bg-teal-200/70"));

        app.dispatch(Action::ToggleTheme);
        assert!(app.rendered.contains("bg-teal-600/70"));
    }

    #[test]
    fn test_matching_flow() {
        let mut app = App::new();
        app.dispatch(Action::OpenMatching);
        assert_eq!(app.page, Page::Matching);

        for i in 0..4 {
            app.term_selected = i;
            app.match_column = MatchColumn::Terms;
            app.dispatch(Action::Select);
            assert_eq!(app.match_column, MatchColumn::Definitions);
            app.definition_selected = i;
            app.dispatch(Action::Select);
        }
        assert!(app.exercise.is_complete());
        assert_eq!(app.status_message.as_deref(), Some("Well done! All terms matched."));
        assert!(app.connectors_stale);
    }

    #[test]
    fn test_debounced_connector_refresh() {
        let mut app = App::new();
        app.connectors_stale = false;
        app.layout_changed(0);
        app.layout_changed(50);
        app.tick(120);
        assert!(!app.connectors_stale);
        app.tick(150);
        assert!(app.connectors_stale);
    }
}
