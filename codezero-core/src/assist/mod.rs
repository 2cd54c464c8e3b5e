//! Contract of the external AI text-completion collaborator.
//!
//! The call subsystem does not depend on any of this; it is the typed surface
//! the playground uses to "run", explain, modify and name code snippets.

mod detector;
mod flows;
mod language;

pub use detector::{InputPromptDetector, KeywordPromptDetector};
pub use flows::{
    AssistError, AssistOutcome, AssistRequest, AssistResponse, CompletionService, NameRequest,
    NameResponse, ResponseType, RunRequest, RunResponse, UNTITLED_SNIPPET, name_snippet,
    request_assist, run_snippet,
};
pub use language::Language;
