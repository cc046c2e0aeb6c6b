//! User intents. Front ends translate key events into these and hand them
//! to [`App::dispatch`](crate::App::dispatch); what each one does depends on
//! the current page and mode.

use crate::model::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ShowHelp,
    /// Close whatever overlay (help, alert, picker, input) is open.
    Dismiss,

    // Pages
    NextPage,
    PrevPage,
    OpenMatching,
    Finish,

    // Movement. Up/Down also move through lists and pickers.
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
    WordForward,
    WordEnd,
    WordBack,
    LineStart,
    LineEnd,
    ToggleFocus,
    NextHighlight,
    PrevHighlight,

    // Document page
    StartSelection,
    Highlight,
    RemoveHighlight,

    // Questionnaire
    EditLabel,
    PickType,
    ToggleRequired,
    MoveQuestionUp,
    MoveQuestionDown,

    // Live generation
    /// Start editing the selected row, or press it if it is a button.
    Activate,
    AnswerYes,
    AnswerNo,
    CycleCurrency,
    CycleOperation,
    ToggleTheme,

    // Matching
    /// Select the term or definition under the cursor.
    Select,

    // Text input
    InputChar(char),
    Backspace,
    Submit,
}

/// Start offset of the highlight at `index` in document order.
pub fn highlight_offset_by_index(doc: &Document, index: usize) -> Option<usize> {
    doc.highlights_sorted()
        .get(index)
        .map(|h| h.range.start_offset)
}
