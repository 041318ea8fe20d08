pub mod ai;
pub mod assistant;
pub mod config;
pub mod content;
pub mod conversation;
pub mod error;
pub mod input;
pub mod prompt;
pub mod state;

// Re-export main types for convenience
pub use ai::{GeminiClient, TextGenerator};
pub use assistant::AssistantWidget;
pub use config::{AssistantSettings, Config};
pub use content::ContentStore;
pub use conversation::{Conversation, EMPTY_REPLY_PLACEHOLDER, FALLBACK_MESSAGE, GREETING};
pub use error::{InputRejected, ServiceFailure, UnexpectedReply};
pub use input::InputBuffer;
pub use state::{ConversationTurn, RequestState, Speaker};
