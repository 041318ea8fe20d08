//! Transcript and request lifecycle for the assistant, with no I/O.
//!
//! `Conversation` is the whole state machine: it decides whether a submit is
//! accepted, records turns, and tells the caller what to send. Issuing the
//! request and waiting for it is left to [`crate::AssistantWidget`].

use crate::error::{InputRejected, UnexpectedReply};
use crate::prompt::CONTEXT_PREAMBLE;
use crate::state::{ConversationTurn, RequestState};

pub const GREETING: &str =
    "Hi! I'm Vikas's AI assistant. Ask me anything about his projects, skills, or experience!";

/// Appended when the service answers with no text.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "I'm sorry, I couldn't process that.";

/// Appended for every failed outbound call, whatever the cause.
pub const FALLBACK_MESSAGE: &str = "Error connecting to my neural network. Please try again later!";

/// What drives a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A submit that passed input validation.
    Submit,
    /// The outbound call finished, successfully or not.
    Resolve,
}

/// The transition table. `None` means the trigger is ignored in that state.
pub fn transition(state: RequestState, trigger: Trigger) -> Option<RequestState> {
    match (state, trigger) {
        (RequestState::Idle, Trigger::Submit) => Some(RequestState::AwaitingReply),
        (RequestState::AwaitingReply, Trigger::Resolve) => Some(RequestState::Idle),
        _ => None,
    }
}

/// How the outbound call ended, as far as the transcript is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Empty,
    Failed,
}

impl Reply {
    /// Only `None` or an empty string count as empty; whitespace is shown as sent.
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(text) if !text.is_empty() => Reply::Text(text),
            _ => Reply::Empty,
        }
    }

    fn into_turn_text(self) -> String {
        match self {
            Reply::Text(text) => text,
            Reply::Empty => EMPTY_REPLY_PLACEHOLDER.to_string(),
            Reply::Failed => FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// The single call to issue after an accepted submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub preamble: String,
    pub question: String,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    transcript: Vec<ConversationTurn>,
    state: RequestState,
    preamble: String,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_preamble(CONTEXT_PREAMBLE)
    }

    pub fn with_preamble(preamble: impl Into<String>) -> Self {
        Self {
            transcript: vec![ConversationTurn::assistant(GREETING)],
            state: RequestState::Idle,
            preamble: preamble.into(),
        }
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state == RequestState::AwaitingReply
    }

    /// Records the visitor's question and returns the request to issue.
    ///
    /// The text is stored verbatim; only the emptiness check trims it.
    pub fn submit(&mut self, text: &str) -> Result<OutboundRequest, InputRejected> {
        if text.trim().is_empty() {
            return Err(InputRejected::Blank);
        }
        let next = transition(self.state, Trigger::Submit).ok_or(InputRejected::Busy)?;

        self.transcript.push(ConversationTurn::user(text));
        self.state = next;

        Ok(OutboundRequest {
            preamble: self.preamble.clone(),
            question: text.to_string(),
        })
    }

    /// Appends the assistant turn for the outstanding request.
    pub fn resolve(&mut self, reply: Reply) -> Result<&ConversationTurn, UnexpectedReply> {
        let next = transition(self.state, Trigger::Resolve).ok_or(UnexpectedReply)?;

        self.transcript.push(ConversationTurn::assistant(reply.into_turn_text()));
        self.state = next;

        self.transcript.last().ok_or(UnexpectedReply)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
