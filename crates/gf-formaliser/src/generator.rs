//! Generator contract.

use async_trait::async_trait;

/// Default completion budget per prompt.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Text generator holding a per-session conversation.
///
/// `prompt` appends the instruction as a user turn and returns the reply.
/// The reply is *not* added to the history automatically; the formalisation
/// loop adds faulty replies with [`Generator::add_response`] so the model can
/// see what it tried.
#[async_trait]
pub trait Generator: Send {
    /// Model name used in logs and reports.
    fn name(&self) -> &str;

    /// Send an instruction on top of the current context.
    async fn prompt(&mut self, instruction: &str, max_tokens: u32) -> Result<String, GeneratorError>;

    /// Append an assistant turn to the context.
    fn add_response(&mut self, text: &str);

    /// Reset the context to its preamble.
    fn clear_context(&mut self);
}

/// Generator errors.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),
}
