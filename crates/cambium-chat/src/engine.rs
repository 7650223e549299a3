//! Chat engine: condense the question, retrieve context, generate a reply.
//!
//! `on_user_submit` is the single event-driven entry point: one call per
//! input event appends the user turn and generates at most one assistant
//! turn. Generation occurs iff the transcript ends in a user turn; a failed
//! generation leaves the transcript unchanged so the next submit retries.

use std::sync::Arc;

use cambium_core::config::{ChatConfig, CondensePolicy};
use cambium_core::error::CambiumError;
use cambium_core::types::Turn;
use cambium_index::DocumentIndex;
use cambium_llm::{ChatMessage, DynChatModel, DynEmbeddingModel};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::store::SessionStore;
use crate::transcript::Transcript;

/// Instruction used to rewrite a follow-up question into a standalone one.
const CONDENSE_PROMPT: &str = "Given the conversation history and a follow-up \
question, rephrase the follow-up into a single standalone question that \
preserves its meaning. Reply with the standalone question only.";

/// Cap on how much of each retrieved document is quoted into the prompt.
const MAX_CONTEXT_CHARS_PER_DOC: usize = 2000;

/// Coordinates the session store, the vector index, and the LLM.
pub struct ChatEngine {
    store: Arc<SessionStore>,
    chat: Arc<dyn DynChatModel>,
    embedder: Arc<dyn DynEmbeddingModel>,
    config: ChatConfig,
}

impl ChatEngine {
    pub fn new(
        store: Arc<SessionStore>,
        chat: Arc<dyn DynChatModel>,
        embedder: Arc<dyn DynEmbeddingModel>,
        config: ChatConfig,
    ) -> Self {
        Self {
            store,
            chat,
            embedder,
            config,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Handle one user input event: validate, append the user turn, and
    /// generate the reply. Returns the assistant turn.
    ///
    /// When the previous reply failed, the transcript still ends in a user
    /// turn; the submit then retries generation for that pending turn
    /// instead of appending a second one.
    pub async fn on_user_submit(
        &self,
        session_id: Uuid,
        text: &str,
        index: &DocumentIndex,
    ) -> Result<Turn, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.len() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let appended = self.store.append_user(session_id, text)?;
        if !appended {
            warn!(session_id = %session_id, "Retrying generation for pending user turn");
        }

        match self.maybe_respond(session_id, index).await? {
            Some(turn) => Ok(turn),
            // append_user guarantees a trailing user turn, so a reply is
            // always owed here.
            None => Err(ChatError::Internal(
                "no reply owed after user submit".to_string(),
            )),
        }
    }

    /// Generate a reply iff the session's transcript ends in a user turn.
    ///
    /// No-op (returns `None`) otherwise. On failure nothing is committed:
    /// the pending user turn remains last so a retry can be attempted.
    pub async fn maybe_respond(
        &self,
        session_id: Uuid,
        index: &DocumentIndex,
    ) -> Result<Option<Turn>, ChatError> {
        let Some(snapshot) = self.store.begin_reply(session_id)? else {
            return Ok(None);
        };

        match self.generate(&snapshot, index).await {
            Ok(content) => {
                let turn = self.store.finish_reply(session_id, content)?;
                info!(session_id = %session_id, "Reply committed");
                Ok(Some(turn))
            }
            Err(e) => {
                self.store.abort_reply(session_id);
                warn!(session_id = %session_id, error = %e, "Reply generation failed");
                Err(e.into())
            }
        }
    }

    /// Run the condense -> retrieve -> complete chain for the transcript's
    /// pending question.
    async fn generate(
        &self,
        transcript: &Transcript,
        index: &DocumentIndex,
    ) -> Result<String, CambiumError> {
        let question = transcript
            .pending_question()
            .ok_or_else(|| CambiumError::Generation("no pending question".to_string()))?;

        let question = match self.config.condense {
            CondensePolicy::PerQuery if transcript.len() > 2 => {
                self.condense(transcript, question).await?
            }
            _ => question.to_string(),
        };

        let query = self.embedder.embed_boxed(&question).await?;
        let hits = index.search(&query, self.config.top_k);
        debug!(hits = hits.len(), "Context retrieved");

        let mut context = String::new();
        for hit in &hits {
            let text = &hit.document.text;
            let cut = text
                .char_indices()
                .nth(MAX_CONTEXT_CHARS_PER_DOC)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            context.push_str(&format!(
                "---\nSource: {}\n{}\n",
                hit.document.path.display(),
                &text[..cut]
            ));
        }

        let system = format!(
            "{}\n\nAnswer the question using the context below. If the context \
             does not contain the answer, say so.\n\n{}",
            index.system_prompt(),
            context
        );

        let messages = vec![ChatMessage::system(system), ChatMessage::user(question)];
        let reply = self.chat.complete_boxed(&messages).await?;

        // A partial or empty assistant turn must never reach the transcript.
        if reply.trim().is_empty() {
            return Err(CambiumError::Generation(
                "model returned an empty reply".to_string(),
            ));
        }

        Ok(reply)
    }

    /// Rewrite a follow-up question into a standalone one using the
    /// conversation so far. Context is derived fresh from the transcript on
    /// every call; nothing persists between turns.
    async fn condense(
        &self,
        transcript: &Transcript,
        question: &str,
    ) -> Result<String, CambiumError> {
        let turns = transcript.turns();
        let history: String = turns[..turns.len() - 1]
            .iter()
            .map(|t| format!("{}: {}\n", t.role, t.content))
            .collect();

        let messages = vec![
            ChatMessage::system(CONDENSE_PROMPT),
            ChatMessage::user(format!(
                "Conversation history:\n{}\nFollow-up question: {}",
                history, question
            )),
        ];

        let condensed = self.chat.complete_boxed(&messages).await?;
        let condensed = condensed.trim();
        if condensed.is_empty() {
            debug!("Condense step returned nothing; using the raw question");
            return Ok(question.to_string());
        }
        debug!(condensed = %condensed, "Question condensed");
        Ok(condensed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambium_core::config::LlmConfig;
    use cambium_core::types::Role;
    use cambium_index::IndexBuilder;
    use cambium_llm::{MockChatModel, MockEmbedding};

    const GREETING: &str = "Hi, I'm Cambium chatbot. Ask me about Cambium!";

    async fn build_index() -> (tempfile::TempDir, Arc<DocumentIndex>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("about.txt"),
            "Cambium is a software company focused on developer tools.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("history.txt"),
            "Cambium was founded to improve engineering workflows.",
        )
        .unwrap();

        let builder = IndexBuilder::new(Arc::new(MockEmbedding::new()));
        let index = builder
            .build(dir.path(), &LlmConfig::default())
            .await
            .unwrap();
        (dir, index)
    }

    fn engine_with(chat: Arc<MockChatModel>, config: ChatConfig) -> ChatEngine {
        ChatEngine::new(
            Arc::new(SessionStore::new(GREETING)),
            chat,
            Arc::new(MockEmbedding::new()),
            config,
        )
    }

    #[tokio::test]
    async fn test_submit_then_reply_scenario() {
        let (_dir, index) = build_index().await;
        let chat = Arc::new(MockChatModel::with_reply(
            "Cambium is a software company.",
        ));
        let engine = engine_with(Arc::clone(&chat), ChatConfig::default());

        let id = engine.store().create_session();
        let seed = engine.store().transcript(id).unwrap();
        assert_eq!(seed.len(), 1);
        assert_eq!(seed.last().unwrap().content, GREETING);

        let turn = engine
            .on_user_submit(id, "What is Cambium?", &index)
            .await
            .unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert!(!turn.content.is_empty());

        let t = engine.store().transcript(id).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.last_role(), Some(Role::Assistant));
        assert_eq!(t.turns()[1].content, "What is Cambium?");
    }

    #[tokio::test]
    async fn test_maybe_respond_noop_when_last_is_assistant() {
        let (_dir, index) = build_index().await;
        let chat = Arc::new(MockChatModel::with_reply("reply"));
        let engine = engine_with(Arc::clone(&chat), ChatConfig::default());

        let id = engine.store().create_session();
        let result = engine.maybe_respond(id, &index).await.unwrap();
        assert!(result.is_none());
        assert_eq!(chat.calls(), 0);
        assert_eq!(engine.store().transcript(id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_preserves_pending_turn() {
        let (_dir, index) = build_index().await;
        let engine = engine_with(Arc::new(MockChatModel::failing()), ChatConfig::default());

        let id = engine.store().create_session();
        let result = engine.on_user_submit(id, "What is Cambium?", &index).await;
        assert!(matches!(result, Err(ChatError::Generation(_))));

        // Pending user turn preserved: length 2, no assistant turn appended.
        let t = engine.store().transcript(id).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.pending_question(), Some("What is Cambium?"));
    }

    #[tokio::test]
    async fn test_retry_after_failure_succeeds() {
        let (_dir, index) = build_index().await;
        let store = Arc::new(SessionStore::new(GREETING));

        let failing = ChatEngine::new(
            Arc::clone(&store),
            Arc::new(MockChatModel::failing()),
            Arc::new(MockEmbedding::new()),
            ChatConfig::default(),
        );
        let id = store.create_session();
        assert!(failing
            .on_user_submit(id, "What is Cambium?", &index)
            .await
            .is_err());

        // Next submit against a healthy model retries the pending turn.
        let healthy = ChatEngine::new(
            Arc::clone(&store),
            Arc::new(MockChatModel::with_reply("recovered")),
            Arc::new(MockEmbedding::new()),
            ChatConfig::default(),
        );
        let turn = healthy
            .on_user_submit(id, "What is Cambium?", &index)
            .await
            .unwrap();
        assert_eq!(turn.content, "recovered");

        let t = store.transcript(id).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.turns()[1].content, "What is Cambium?");
    }

    #[tokio::test]
    async fn test_empty_submit_rejected() {
        let (_dir, index) = build_index().await;
        let engine = engine_with(Arc::new(MockChatModel::new()), ChatConfig::default());
        let id = engine.store().create_session();

        let result = engine.on_user_submit(id, "   ", &index).await;
        assert!(matches!(result, Err(ChatError::EmptyMessage)));
        assert_eq!(engine.store().transcript(id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_too_long_submit_rejected() {
        let (_dir, index) = build_index().await;
        let engine = engine_with(Arc::new(MockChatModel::new()), ChatConfig::default());
        let id = engine.store().create_session();

        let long = "a".repeat(ChatConfig::default().max_message_length + 1);
        let result = engine.on_user_submit(id, &long, &index).await;
        assert!(matches!(result, Err(ChatError::MessageTooLong(_))));
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let (_dir, index) = build_index().await;
        let engine = engine_with(Arc::new(MockChatModel::new()), ChatConfig::default());

        let result = engine.on_user_submit(Uuid::new_v4(), "hi", &index).await;
        assert!(matches!(result, Err(ChatError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_model_reply_not_committed() {
        let (_dir, index) = build_index().await;
        let engine = engine_with(
            Arc::new(MockChatModel::with_reply("  ")),
            ChatConfig::default(),
        );
        let id = engine.store().create_session();

        let result = engine.on_user_submit(id, "question", &index).await;
        assert!(matches!(result, Err(ChatError::Generation(_))));
        assert_eq!(engine.store().transcript(id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_first_question_skips_condense() {
        let (_dir, index) = build_index().await;
        let chat = Arc::new(MockChatModel::with_reply("answer"));
        let engine = engine_with(Arc::clone(&chat), ChatConfig::default());
        let id = engine.store().create_session();

        engine
            .on_user_submit(id, "What is Cambium?", &index)
            .await
            .unwrap();
        // Greeting + first question: nothing to condense against.
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn test_followup_condenses_per_query() {
        let (_dir, index) = build_index().await;
        let chat = Arc::new(MockChatModel::with_reply("answer"));
        let engine = engine_with(Arc::clone(&chat), ChatConfig::default());
        let id = engine.store().create_session();

        engine
            .on_user_submit(id, "What is Cambium?", &index)
            .await
            .unwrap();
        engine
            .on_user_submit(id, "Who founded it?", &index)
            .await
            .unwrap();
        // Second submit: one condense call plus one answer call.
        assert_eq!(chat.calls(), 3);
    }

    #[tokio::test]
    async fn test_condense_policy_none_skips_rewrite() {
        let (_dir, index) = build_index().await;
        let chat = Arc::new(MockChatModel::with_reply("answer"));
        let config = ChatConfig {
            condense: CondensePolicy::None,
            ..ChatConfig::default()
        };
        let engine = engine_with(Arc::clone(&chat), config);
        let id = engine.store().create_session();

        engine.on_user_submit(id, "first", &index).await.unwrap();
        engine.on_user_submit(id, "second", &index).await.unwrap();
        assert_eq!(chat.calls(), 2);
    }

    #[tokio::test]
    async fn test_prompt_carries_system_prompt_and_context() {
        let (_dir, index) = build_index().await;
        let chat = Arc::new(MockChatModel::with_reply("answer"));
        let engine = engine_with(Arc::clone(&chat), ChatConfig::default());
        let id = engine.store().create_session();

        engine
            .on_user_submit(id, "What is Cambium?", &index)
            .await
            .unwrap();

        let messages = chat.last_messages();
        assert_eq!(messages[0].role, "system");
        assert!(messages[0]
            .content
            .contains("You are an expert in Cambium software company"));
        // Retrieved document text is quoted as context.
        assert!(messages[0].content.contains("software company"));
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "What is Cambium?");
    }

    #[tokio::test]
    async fn test_render_after_conversation() {
        let (_dir, index) = build_index().await;
        let engine = engine_with(
            Arc::new(MockChatModel::with_reply("It is a software company.")),
            ChatConfig::default(),
        );
        let id = engine.store().create_session();
        engine
            .on_user_submit(id, "What is Cambium?", &index)
            .await
            .unwrap();

        let t = engine.store().transcript(id).unwrap();
        let rendered: Vec<(Role, String)> = t
            .render()
            .map(|(role, content)| (role, content.to_string()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                (Role::Assistant, GREETING.to_string()),
                (Role::User, "What is Cambium?".to_string()),
                (Role::Assistant, "It is a software company.".to_string()),
            ]
        );
    }
}
