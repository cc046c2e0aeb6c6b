//! CLM Core - contract lifecycle management trainer
//!
//! Highlighted fragments of an employment agreement are classified into
//! questions, answered, and rendered back into the agreement. This crate
//! holds all of that logic plus the matching exercise, and is shared by the
//! native CLI and the WASM build.

pub mod actions;
pub mod answers;
pub mod app;
pub mod classifier;
pub mod config;
pub mod cursor;
pub mod error;
pub mod export;
pub mod followup;
pub mod holiday;
pub mod markup;
pub mod matching;
pub mod model;
pub mod registry;
pub mod render;
pub mod storage;
pub mod template;

pub use actions::Action;
pub use answers::AnswerStore;
pub use app::{AnswerRow, App, Focus, InputTarget, MatchColumn, Mode, Page};
pub use classifier::{classify, Classification};
pub use config::{Config, Level, Theme};
pub use cursor::CursorState;
pub use error::{ClmError, Result, SubmitRejection};
pub use export::{generate_summary, to_json, ExportSession};
pub use holiday::{HolidayOperation, HolidayPay, Operation};
pub use matching::{
    Connector, CurveStyle, LayoutProbe, MatchOutcome, MatchResult, MatchingExercise, MatchingItem, Point,
    Rect,
};
pub use model::{AnswerValue, Currency, Document, Highlight, InputType, QuestionEntry, TextRange};
pub use registry::QuestionRegistry;
pub use render::{render, RenderOptions};
pub use storage::{KeyValueStore, MemoryStore};
