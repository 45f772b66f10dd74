//! HandleMessageHandler - process one chat message end to end.
//!
//! Locks the user's session for the whole turn (read - validate - mutate -
//! write), consults the semantic collaborator when the slot calls for it,
//! and hands completed answer sets to the persistence collaborator.
//! Collaborator failures become conversational replies; the turn is never
//! silently dropped.

use std::sync::Arc;

use crate::domain::catalog::CompletionPolicy;
use crate::domain::dialog::{Completion, DialogEngine, Evaluation, Turn};
use crate::domain::foundation::{UserId, ValidationError};
use crate::domain::session::{AnswerMap, Session};
use crate::ports::{ResponseSink, SemanticValidator, SessionStore, SessionStoreError};

/// Message we apologize with when the persistence collaborator is down.
const PERSIST_APOLOGY: &str =
    "We have all your answers, but saving them failed on our side. \
     Please send any message in a moment and I will try again.";

/// Command to process one incoming chat message.
#[derive(Debug, Clone)]
pub struct HandleMessageCommand {
    pub user_id: String,
    pub message: String,
}

/// Assembled reply for the chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    /// The accumulated answer map, present only on flow completion.
    pub final_responses: Option<AnswerMap>,
}

impl ChatReply {
    fn from_turn(turn: &Turn) -> Self {
        Self {
            response: turn.response.clone(),
            question: turn.question.clone(),
            options: turn.options.clone(),
            final_responses: None,
        }
    }
}

/// Errors surfaced to the HTTP boundary.
///
/// Everything recoverable inside the conversation is already a
/// [`ChatReply`]; only malformed requests and store failures escape.
#[derive(Debug, thiserror::Error)]
pub enum HandleMessageError {
    #[error("Invalid user id: {0}")]
    InvalidUserId(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

/// Handler for the chat message endpoint.
pub struct HandleMessageHandler {
    store: Arc<dyn SessionStore>,
    semantic: Arc<dyn SemanticValidator>,
    sink: Arc<dyn ResponseSink>,
    engine: DialogEngine,
}

impl HandleMessageHandler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        semantic: Arc<dyn SemanticValidator>,
        sink: Arc<dyn ResponseSink>,
        engine: DialogEngine,
    ) -> Self {
        Self {
            store,
            semantic,
            sink,
            engine,
        }
    }

    pub async fn handle(&self, cmd: HandleMessageCommand) -> Result<ChatReply, HandleMessageError> {
        let user_id = UserId::new(&cmd.user_id)?;
        let session_ref = self.store.get_or_create(&user_id).await?;
        let mut session = session_ref.lock().await;

        let turn = if !session.welcome_shown() {
            self.engine.welcome(&mut session)
        } else {
            match self.engine.evaluate(&mut session, &cmd.message) {
                Evaluation::Resolved(turn) => turn,
                Evaluation::NeedsSemantic { question } => {
                    let accepted = self.classify(&question, &cmd.message).await;
                    self.engine.resolve_semantic(&mut session, &cmd.message, accepted)
                }
            }
        };

        let mut reply = ChatReply::from_turn(&turn);
        if let Some(completion) = turn.completion {
            reply = self
                .persist_completion(&user_id, &mut session, reply, completion)
                .await;
        }
        Ok(reply)
    }

    /// Consults the semantic collaborator, mapping any failure to a
    /// rejection so the engine's fallback responder takes over.
    async fn classify(&self, question: &str, answer: &str) -> bool {
        match self.semantic.validate(question, answer).await {
            Ok(verdict) => verdict.accepted(),
            Err(err) => {
                tracing::warn!(error = %err, "semantic collaborator failed; treating as rejection");
                false
            }
        }
    }

    /// Writes the completed answer set, then applies the flow's completion
    /// policy. On failure the session stays complete-but-unpersisted and the
    /// next message retries the write.
    async fn persist_completion(
        &self,
        user_id: &UserId,
        session: &mut tokio::sync::MutexGuard<'_, Session>,
        mut reply: ChatReply,
        completion: Completion,
    ) -> ChatReply {
        match self.sink.persist(completion.flow, &completion.answers).await {
            Ok(()) => {
                session.mark_persisted();
                reply.final_responses = Some(completion.answers);
                if completion.policy == CompletionPolicy::Discard {
                    if let Err(err) = self.store.remove(user_id).await {
                        tracing::warn!(error = %err, "failed to discard completed session");
                    }
                }
                reply
            }
            Err(err) => {
                tracing::error!(
                    user = %user_id,
                    flow = %completion.flow,
                    error = %err,
                    "persistence collaborator failed"
                );
                ChatReply {
                    response: PERSIST_APOLOGY.to_string(),
                    question: None,
                    options: None,
                    final_responses: None,
                }
            }
        }
    }
}
