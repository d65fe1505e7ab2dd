pub mod answer;
pub mod codec;
pub mod question;

pub use answer::{AnswerPayload, AnswerRecord, SkipReason, SolveResponse};
pub use codec::decode_response;
pub use question::{QuestionRecord, QuestionType};
