use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::ai::TextGenerator;
use crate::conversation::{Conversation, Reply};
use crate::error::{InputRejected, ServiceFailure};
use crate::input::InputBuffer;
use crate::state::{ConversationTurn, RequestState};

type ReplyResult = Result<Option<String>, ServiceFailure>;

/// The chat panel: transcript, input line, visibility, and the one request
/// that may be in flight.
///
/// The reply is produced on a spawned tokio task and handed back over a
/// oneshot channel, so `submit` must be called from within a runtime.
pub struct AssistantWidget {
    conversation: Conversation,
    input: InputBuffer,
    open: bool,
    generator: Arc<dyn TextGenerator>,
    pending: Option<oneshot::Receiver<ReplyResult>>,
    last_failure: Option<ServiceFailure>,
}

impl AssistantWidget {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_conversation(generator, Conversation::new())
    }

    pub fn with_conversation(generator: Arc<dyn TextGenerator>, conversation: Conversation) -> Self {
        Self {
            conversation,
            input: InputBuffer::new(),
            open: false,
            generator,
            pending: None,
            last_failure: None,
        }
    }

    // Panel visibility
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        self.conversation.transcript()
    }

    pub fn state(&self) -> RequestState {
        self.conversation.state()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.conversation.is_awaiting_reply()
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    /// Why the most recent request failed, if it did. Diagnostic only.
    pub fn last_failure(&self) -> Option<&ServiceFailure> {
        self.last_failure.as_ref()
    }

    /// Accepts `text` as the next question and issues the outbound call.
    ///
    /// Rejections leave the transcript, the state and the input buffer as
    /// they were.
    pub fn submit(&mut self, text: &str) -> Result<(), InputRejected> {
        let request = match self.conversation.submit(text) {
            Ok(request) => request,
            Err(reason) => {
                debug!(%reason, "Ignoring assistant submit");
                return Err(reason);
            }
        };
        self.input.clear();

        info!(question_chars = request.question.chars().count(), "Assistant question submitted");

        let generator = Arc::clone(&self.generator);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = generator.generate(&request.preamble, &request.question).await;
            // Receiver is gone only if the widget was dropped
            let _ = tx.send(result);
        });
        self.pending = Some(rx);

        Ok(())
    }

    /// Submits whatever is in the input buffer.
    pub fn submit_input(&mut self) -> Result<(), InputRejected> {
        let text = self.input.text().to_string();
        self.submit(&text)
    }

    /// Collects a finished reply without blocking. Returns true when the
    /// transcript changed.
    pub fn poll_reply(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => Err(ServiceFailure::TaskAborted),
        };

        self.pending = None;
        self.apply(result);
        true
    }

    /// Waits for the outstanding reply, if any. Returns true when the
    /// transcript changed.
    pub async fn wait_reply(&mut self) -> bool {
        let Some(rx) = self.pending.take() else {
            return false;
        };

        let result = rx.await.unwrap_or_else(|_| Err(ServiceFailure::TaskAborted));
        self.apply(result);
        true
    }

    fn apply(&mut self, result: ReplyResult) {
        let reply = match result {
            Ok(text) => {
                self.last_failure = None;
                Reply::from_text(text)
            }
            Err(failure) => {
                warn!(error = %failure, "Assistant request failed");
                self.last_failure = Some(failure);
                Reply::Failed
            }
        };

        match self.conversation.resolve(reply) {
            Ok(turn) => debug!(reply_chars = turn.text.chars().count(), "Assistant reply appended"),
            Err(e) => warn!(error = %e, "Dropping reply with no outstanding request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GeminiClient;
    use crate::config::AssistantSettings;
    use crate::conversation::{EMPTY_REPLY_PLACEHOLDER, FALLBACK_MESSAGE, GREETING};
    use crate::prompt::CONTEXT_PREAMBLE;
    use crate::state::Speaker;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct StaticGenerator(Option<&'static str>);

    #[async_trait]
    impl TextGenerator for StaticGenerator {
        async fn generate(&self, _: &str, _: &str) -> Result<Option<String>, ServiceFailure> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _: &str, _: &str) -> Result<Option<String>, ServiceFailure> {
            Err(ServiceFailure::Api {
                status: 503,
                message: "overloaded".to_string(),
            })
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl TextGenerator for PanickingGenerator {
        async fn generate(&self, _: &str, _: &str) -> Result<Option<String>, ServiceFailure> {
            panic!("client blew up")
        }
    }

    /// Holds every request until released and records what it was asked.
    #[derive(Default)]
    struct GatedGenerator {
        release: Notify,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TextGenerator for GatedGenerator {
        async fn generate(&self, preamble: &str, question: &str) -> Result<Option<String>, ServiceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((preamble.to_string(), question.to_string()));
            self.release.notified().await;
            Ok(Some(format!("answer to {question}")))
        }
    }

    fn widget(generator: impl TextGenerator + 'static) -> AssistantWidget {
        AssistantWidget::new(Arc::new(generator))
    }

    #[test]
    fn test_initial_render_state() {
        let widget = widget(StaticGenerator(None));
        assert_eq!(widget.transcript(), &[ConversationTurn::assistant(GREETING)]);
        assert_eq!(widget.state(), RequestState::Idle);
        assert!(!widget.is_open());
    }

    #[tokio::test]
    async fn test_successful_question_appends_reply() {
        let mut widget = widget(StaticGenerator(Some("He built EchoClean and NetGuard.")));
        widget.submit("What projects has Vikas built?").unwrap();
        assert_eq!(widget.state(), RequestState::AwaitingReply);

        assert!(widget.wait_reply().await);

        let transcript = widget.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1], ConversationTurn::user("What projects has Vikas built?"));
        assert_eq!(
            transcript.last().unwrap(),
            &ConversationTurn::assistant("He built EchoClean and NetGuard.")
        );
        assert_eq!(widget.state(), RequestState::Idle);
        assert!(widget.last_failure().is_none());
    }

    #[tokio::test]
    async fn test_failing_service_appends_fallback() {
        let mut widget = widget(FailingGenerator);
        widget.submit("What projects has Vikas built?").unwrap();
        widget.wait_reply().await;

        let last = widget.transcript().last().unwrap();
        assert_eq!(last.speaker, Speaker::Assistant);
        assert_eq!(last.text, FALLBACK_MESSAGE);
        assert_eq!(widget.state(), RequestState::Idle);
        assert!(matches!(
            widget.last_failure(),
            Some(ServiceFailure::Api { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_panicking_client_appends_fallback() {
        let mut widget = widget(PanickingGenerator);
        widget.submit("hello").unwrap();
        widget.wait_reply().await;

        assert_eq!(widget.transcript().last().unwrap().text, FALLBACK_MESSAGE);
        assert!(matches!(widget.last_failure(), Some(ServiceFailure::TaskAborted)));
    }

    #[tokio::test]
    async fn test_empty_payload_appends_placeholder() {
        let mut widget = widget(StaticGenerator(Some("")));
        widget.submit("hello").unwrap();
        widget.wait_reply().await;
        assert_eq!(widget.transcript().last().unwrap().text, EMPTY_REPLY_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_missing_credential_appends_fallback() {
        let settings = AssistantSettings {
            api_key: None,
            model: "gemini-test".to_string(),
            endpoint: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(1),
        };
        let mut widget = widget(GeminiClient::new(&settings).unwrap());

        widget.submit("Are you there?").unwrap();
        widget.wait_reply().await;

        assert_eq!(widget.transcript().last().unwrap().text, FALLBACK_MESSAGE);
        assert!(matches!(widget.last_failure(), Some(ServiceFailure::MissingCredential)));
    }

    #[tokio::test]
    async fn test_whitespace_submit_changes_nothing() {
        let mut widget = widget(StaticGenerator(Some("unused")));
        "   ".chars().for_each(|c| widget.input_mut().insert(c));

        assert_eq!(widget.submit_input(), Err(InputRejected::Blank));
        assert_eq!(widget.transcript().len(), 1);
        assert_eq!(widget.state(), RequestState::Idle);
        assert_eq!(widget.input().text(), "   ");
        assert!(!widget.wait_reply().await);
    }

    #[tokio::test]
    async fn test_submit_while_awaiting_is_ignored() {
        let generator = Arc::new(GatedGenerator::default());
        let mut widget = AssistantWidget::new(generator.clone());

        widget.submit("first").unwrap();
        assert_eq!(widget.submit("second"), Err(InputRejected::Busy));
        assert_eq!(widget.transcript().len(), 2);
        assert_eq!(widget.state(), RequestState::AwaitingReply);
        assert!(!widget.poll_reply());

        generator.release.notify_one();
        assert!(widget.wait_reply().await);

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(widget.transcript().len(), 3);
        assert_eq!(widget.transcript()[2].text, "answer to first");
    }

    #[tokio::test]
    async fn test_request_carries_preamble_and_literal_question() {
        let generator = Arc::new(GatedGenerator::default());
        let mut widget = AssistantWidget::new(generator.clone());

        "  Tell me about NetGuard ".chars().for_each(|c| widget.input_mut().insert(c));
        widget.submit_input().unwrap();
        assert!(widget.input().is_empty());

        generator.release.notify_one();
        widget.wait_reply().await;

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, CONTEXT_PREAMBLE);
        assert_eq!(seen[0].1, "  Tell me about NetGuard ");
    }

    #[tokio::test]
    async fn test_poll_reply_collects_finished_request() {
        let mut widget = widget(StaticGenerator(Some("done")));
        widget.submit("question").unwrap();

        let mut collected = false;
        for _ in 0..100 {
            if widget.poll_reply() {
                collected = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(collected);
        assert_eq!(widget.transcript().last().unwrap().text, "done");
        assert!(!widget.poll_reply());
    }

    #[tokio::test]
    async fn test_open_close_leave_conversation_alone() {
        let generator = Arc::new(GatedGenerator::default());
        let mut widget = AssistantWidget::new(generator.clone());

        widget.open();
        widget.submit("question").unwrap();
        widget.close();
        widget.toggle();
        widget.toggle();

        assert!(!widget.is_open());
        assert_eq!(widget.state(), RequestState::AwaitingReply);
        assert_eq!(widget.transcript().len(), 2);

        generator.release.notify_one();
        widget.wait_reply().await;
        assert_eq!(widget.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_round_trips_grow_transcript_by_two() {
        let mut widget = widget(StaticGenerator(Some("ok")));
        let n = 4;
        for i in 0..n {
            widget.submit(&format!("question {i}")).unwrap();
            widget.wait_reply().await;
        }
        assert_eq!(widget.transcript().len(), 1 + 2 * n);
    }
}
