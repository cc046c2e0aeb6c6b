pub mod answer;
pub mod document;
pub mod highlight;
pub mod question;
pub mod text_range;

pub use answer::{AnswerValue, Currency, SalaryAnswer};
pub use document::Document;
pub use highlight::Highlight;
pub use question::{InputType, QuestionEntry, QuestionIdentity};
pub use text_range::TextRange;
