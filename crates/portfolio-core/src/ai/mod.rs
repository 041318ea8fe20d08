pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::ServiceFailure;

/// The outbound text-generation call.
///
/// `Ok(None)` means the service answered but produced no text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, preamble: &str, question: &str) -> Result<Option<String>, ServiceFailure>;
}
