//! The dialogue orchestrator.
//!
//! One message runs through:
//!
//! ```text
//! gate ──refuse──▶ canned reply (asleep / hostile)
//!   │
//! auth commands ──secret──▶ acknowledgment (neutral)
//!   │
//! organism.perceive          (under the organism lock)
//!   │
//! history + prompt fitting   (lock released)
//!   │
//! encode → sample → decode   (timeout-bound, failure → placeholder)
//!   │
//! fatigue + chat log ──▶ reply (awake)
//! ```
//!
//! Durable state (fatigue, relationships, chat log) is only touched through
//! single atomic store calls. The organism's in-process state sits behind one
//! async mutex that is never held across the remote call.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use caz_core::config::CazConfig;
use caz_core::gate::{Admission, Gate, RefusalReason};
use caz_core::persistence::{SqliteStateStore, StateStore};
use caz_core::snapshot::{DirectorySnapshotStore, SnapshotStore};
use caz_core::types::{BiologicalState, HistoryTurn};
use caz_llm::model::{generate, stop_tokens};
use caz_llm::prompt::{fit_prompt, prompt_budget, user_label};
use caz_llm::{HttpModel, LanguageModel, LlmError, PromptBuilder, PromptTurn, SamplingParams};

use crate::api::{ChatRequest, ChatResponse, Mood};
use crate::auth::AuthParser;
use crate::error::Result;
use crate::organism::{Organism, OrganismStatus};
use crate::telemetry;

/// Full status: organism plus biological state.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Status {
    /// In-process state.
    pub organism: OrganismStatus,
    /// Durable fatigue and sleep state.
    pub biological: BiologicalState,
}

/// The orchestrator. Cheap to share behind an `Arc`.
pub struct Dialogue {
    config: CazConfig,
    gate: Gate,
    store: Arc<dyn StateStore>,
    organism: Mutex<Organism>,
    model: Arc<dyn LanguageModel>,
    auth: AuthParser,
}

impl std::fmt::Debug for Dialogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialogue")
            .field("gate", &self.gate)
            .field("agent", &self.config.general.agent_name)
            .finish_non_exhaustive()
    }
}

impl Dialogue {
    /// Wire the organism to its store and model.
    ///
    /// # Errors
    /// Fails if the organism cannot be bootstrapped.
    pub fn new(
        config: CazConfig,
        store: Arc<dyn StateStore>,
        snapshots: Arc<dyn SnapshotStore>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let organism = Organism::bootstrap(&config, snapshots)?;
        Ok(Self {
            gate: Gate::new(store.clone(), config.gate.clone()),
            auth: AuthParser::new()?,
            organism: Mutex::new(organism),
            config,
            store,
            model,
        })
    }

    /// Assemble everything the configuration names: tracing, the SQLite
    /// state store, the snapshot directory and the HTTP model.
    ///
    /// A tracing subscriber that is already installed is left in place.
    ///
    /// # Errors
    /// Fails if the database or snapshot directory cannot be opened, or the
    /// organism cannot be bootstrapped.
    pub fn from_config(config: CazConfig) -> Result<Self> {
        if let Err(e) = telemetry::init(&config.general) {
            debug!(error = %e, "Keeping existing tracing subscriber");
        }
        let persistence = &config.persistence;
        let store = Arc::new(SqliteStateStore::open(&persistence.database_path, persistence)?);
        let snapshots = Arc::new(DirectorySnapshotStore::open(&persistence.snapshot_dir)?);
        let model = Arc::new(HttpModel::new(&config.llm.base_url, config.llm.timeout_ms));
        info!(
            database = %persistence.database_path,
            snapshots = %persistence.snapshot_dir,
            model = %config.llm.base_url,
            "Dialogue assembled from configuration"
        );
        Self::new(config, store, snapshots, model)
    }

    /// The gate, for wake/rest events.
    #[must_use]
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Process one message.
    ///
    /// # Errors
    /// Persistence failures, and a message that overflows the context window
    /// even without history. Generation failures are not errors.
    pub async fn process(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let user = request.user_id.as_str();
        let message = request.message.as_str();
        let gate_cfg = self.gate.config();

        let relationship = match self.gate.admit(user)? {
            Admission::Proceed(r) => r,
            Admission::Refuse(RefusalReason::Asleep) => {
                return Ok(ChatResponse::new(&gate_cfg.asleep_text, Mood::Asleep));
            }
            Admission::Refuse(RefusalReason::Hostile) => {
                return Ok(ChatResponse::new(&gate_cfg.hostile_text, Mood::Hostile));
            }
        };

        let commands = self.auth.parse(message);
        if let Some(name) = &commands.display_name {
            self.store.set_display_name(user, name)?;
            info!(user, name = %name, "Display name set");
        }
        if let Some(secret) = &commands.secret_phrase {
            self.store.set_secret_phrase(user, secret)?;
            info!(user, "Secret phrase set");
            return Ok(ChatResponse::new(&gate_cfg.secret_ack_text, Mood::Neutral));
        }

        let llm = &self.config.llm;
        let perception = {
            let mut organism = self.organism.lock().await;
            organism.perceive(message, llm.include_preamble, Utc::now())
        };

        let history = self.store.recent_history(user, llm.history_turns)?;
        let label = user_label(relationship.display_name.as_deref(), &llm.stranger_label);
        let mut builder = PromptBuilder::new(&self.config.general.agent_name, label);
        if let Some(p) = &perception.preamble {
            builder = builder.with_preamble(p);
        }

        let timeout = Duration::from_millis(llm.timeout_ms);
        let reply = match tokio::time::timeout(timeout, self.compose(&builder, &history, message)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e @ LlmError::PromptOverflow { .. })) => return Err(e.into()),
            Ok(Err(e)) => {
                warn!(user, error = %e, "Generation failed");
                llm.failure_placeholder.clone()
            }
            Err(_) => {
                warn!(user, timeout_ms = llm.timeout_ms, "Generation timed out");
                llm.failure_placeholder.clone()
            }
        };

        let bio = self.gate.record_reply()?;
        let snapshot = json!({
            "affect": perception.affect,
            "label": perception.signals.label.as_str(),
            "biological": bio,
        });
        self.store
            .append_chat_log(user, message, &reply, &snapshot.to_string())?;

        debug!(user, fatigue = bio.fatigue, "Reply recorded");
        Ok(ChatResponse::new(reply, Mood::Awake))
    }

    async fn compose(
        &self,
        builder: &PromptBuilder,
        history: &[HistoryTurn],
        message: &str,
    ) -> std::result::Result<String, LlmError> {
        let llm = &self.config.llm;
        let model = self.model.as_ref();
        let turns: Vec<PromptTurn> = history
            .iter()
            .map(|t| PromptTurn::new(&t.message, &t.response))
            .collect();

        let budget = prompt_budget(llm.context_window, llm.max_tokens);
        let fitted = fit_prompt(model, builder, &turns, message, budget).await?;
        let params = SamplingParams {
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            stop_token_ids: stop_tokens(model, &llm.stop_sequence).await?,
        };
        generate(model, &fitted.tokens, &params, builder.agent_name()).await
    }

    /// External wake event.
    ///
    /// # Errors
    /// Persistence failures.
    pub fn wake(&self) -> Result<BiologicalState> {
        Ok(self.gate.wake()?)
    }

    /// External rest event.
    ///
    /// # Errors
    /// Persistence failures.
    pub fn rest(&self) -> Result<BiologicalState> {
        Ok(self.gate.rest()?)
    }

    /// Save the memory store.
    ///
    /// # Errors
    /// Snapshot failures.
    pub async fn checkpoint(&self) -> Result<()> {
        Ok(self.organism.lock().await.checkpoint()?)
    }

    /// Status report.
    ///
    /// # Errors
    /// Persistence failures.
    pub async fn status(&self) -> Result<Status> {
        let organism = self.organism.lock().await.status(Utc::now());
        Ok(Status {
            organism,
            biological: self.gate.biological_state()?,
        })
    }
}
