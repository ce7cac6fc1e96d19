//! Model-answer generation.
//!
//! After a session finishes the user may ask an external text/vision model
//! for a high-scoring sample answer. The controller tracks the request as an
//! explicit [`AnswerState`]; the call itself runs on a dedicated task spawned
//! by an [`AnswerDispatcher`].

mod answer;
mod gemini;
mod prompt;

pub use answer::{
    AnswerDispatcher, AnswerState, ModelAnswer, RecordingDispatcher, Ticket, EMPTY_ANSWER_MESSAGE,
    FAILED_ANSWER_MESSAGE,
};
pub use gemini::GeminiClient;
pub use prompt::build_prompt;

use async_trait::async_trait;

use crate::attachment::ImageAttachment;
use crate::error::GenerationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<ImageAttachment>,
}

/// External text/vision generation service. Single-flight, no retry.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
