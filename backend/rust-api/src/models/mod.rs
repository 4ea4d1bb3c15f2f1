pub mod question;
pub mod result;
pub mod session;

pub use question::{Question, QuestionView};
pub use result::{ResultSummary, Verdict};
pub use session::{SessionView, StartQuizRequest, SubmitAnswerRequest, SubmitAnswerResponse};
