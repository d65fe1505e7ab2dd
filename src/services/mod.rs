pub mod extractor;
pub mod injector;
pub mod submitter;

pub use extractor::{QuestionExtractor, RawContainer};
pub use injector::{AnswerInjector, InjectionStats};
pub use submitter::SubmitTrigger;
