use crate::assist::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const UNTITLED_SNIPPET: &str = "Untitled Snippet";

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("request is empty")]
    EmptyRequest,
    #[error("malformed collaborator response: {0}")]
    MalformedResponse(&'static str),
    #[error("completion service failed: {0}")]
    Service(String),
}

/// Ask the collaborator to simulate running `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub code: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_conversation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistRequest {
    pub code: String,
    pub language: Language,
    pub request: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Code,
    Answer,
}

/// Raw structured response; fields are optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistResponse {
    pub response_type: ResponseType,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Validated result of an assist request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistOutcome {
    Code(String),
    Answer(String),
}

impl TryFrom<AssistResponse> for AssistOutcome {
    type Error = AssistError;

    fn try_from(resp: AssistResponse) -> Result<Self, Self::Error> {
        match (resp.response_type, resp.code, resp.answer) {
            (ResponseType::Code, Some(code), _) => Ok(Self::Code(code)),
            (ResponseType::Answer, _, Some(answer)) => Ok(Self::Answer(answer)),
            (ResponseType::Code, None, _) => {
                Err(AssistError::MalformedResponse("code response without code"))
            }
            (ResponseType::Answer, _, None) => Err(AssistError::MalformedResponse(
                "answer response without answer",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRequest {
    pub code: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameResponse {
    pub name: String,
}

/// The external text-completion service, treated as a black box.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn run(&self, req: RunRequest) -> Result<RunResponse, AssistError>;

    async fn assist(&self, req: AssistRequest) -> Result<AssistResponse, AssistError>;

    async fn name(&self, req: NameRequest) -> Result<NameResponse, AssistError>;
}

/// Asks the collaborator to run `code`. Blank code never reaches the service.
pub async fn run_snippet(
    service: &dyn CompletionService,
    req: RunRequest,
) -> Result<String, AssistError> {
    if req.code.trim().is_empty() {
        return Err(AssistError::EmptyRequest);
    }
    Ok(service.run(req).await?.output)
}

/// Sends an assist request and validates the structured answer.
pub async fn request_assist(
    service: &dyn CompletionService,
    req: AssistRequest,
) -> Result<AssistOutcome, AssistError> {
    if req.request.trim().is_empty() {
        return Err(AssistError::EmptyRequest);
    }
    AssistOutcome::try_from(service.assist(req).await?)
}

/// Names a snippet for the history list. Blank code never reaches the service.
pub async fn name_snippet(
    service: &dyn CompletionService,
    req: NameRequest,
) -> Result<String, AssistError> {
    if req.code.trim().is_empty() {
        return Ok(UNTITLED_SNIPPET.to_owned());
    }
    let name = service.name(req).await?.name;
    let name = name.trim();
    if name.is_empty() {
        return Ok(UNTITLED_SNIPPET.to_owned());
    }
    Ok(name.to_owned())
}
