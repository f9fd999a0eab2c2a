//! AI Card State Machine.
//!
//! One implementation serves every artifact kind; the kind only selects the
//! endpoint, the key precondition and the loading messages.
//!
//! ```text
//!            set_key / mount
//!                  │
//!                  v           probe hit
//!   Disabled     Idle ───────────────────────────> Completed
//!  (bad key)      │  ^                               │   ^
//!                 │  └── probe miss (silent)         │   │
//!        generate │                     regenerate + │   │ ok
//!                 v                       confirm    v   │
//!              Loading <──────────────────────────────   │
//!                 │  │ ok                                │
//!                 │  └───────────────────────────────────┘
//!                 │ err
//!                 v
//!               Error ── retry ──> Loading
//! ```
//!
//! Every key change bumps an epoch; any store response tagged with an older
//! epoch is dropped, so an artifact can never be shown against another key.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use super::confirm::{Confirm, REGENERATE_PROMPT};
use super::models::{AnalysisDepth, Artifact, ArtifactKey, ArtifactKind, GenerateOptions};
use super::progress::{self, DEFAULT_PROGRESS_INTERVAL};
use super::store::ArtifactStore;
use crate::errors::ArtifactError;

#[derive(Debug, Clone, PartialEq)]
pub enum CardState {
    /// The key does not satisfy the kind's precondition.
    Disabled { reason: String },
    Idle,
    Loading { since: Instant, regenerating: bool },
    Completed(Artifact),
    Error { message: String },
}

impl CardState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disabled { .. } => "disabled",
            Self::Idle => "idle",
            Self::Loading { .. } => "loading",
            Self::Completed(_) => "completed",
            Self::Error { .. } => "error",
        }
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Completed(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerateOutcome {
    /// The user declined; the previous artifact is still shown.
    Declined,
    /// Generation ran; see the card state for its result.
    Ran,
    /// The key changed while the prompt was open.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct CardOptions {
    pub language: String,
    pub depth: AnalysisDepth,
    pub progress_interval: Duration,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            depth: AnalysisDepth::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[derive(Debug)]
struct Inner {
    key: ArtifactKey,
    epoch: u64,
    state: CardState,
}

pub struct AiCard {
    kind: ArtifactKind,
    store: Arc<dyn ArtifactStore>,
    options: CardOptions,
    inner: Mutex<Inner>,
}

impl AiCard {
    pub fn new(
        kind: ArtifactKind,
        store: Arc<dyn ArtifactStore>,
        key: ArtifactKey,
        options: CardOptions,
    ) -> Self {
        let state = initial_state(kind, &key);
        Self {
            kind,
            store,
            options,
            inner: Mutex::new(Inner {
                key,
                epoch: 0,
                state,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn key(&self) -> ArtifactKey {
        self.lock().key.clone()
    }

    pub fn state(&self) -> CardState {
        self.lock().state.clone()
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.lock().state, CardState::Disabled { .. })
    }

    /// Rotating progress message while loading.
    pub fn loading_message(&self) -> Option<&'static str> {
        match self.lock().state {
            CardState::Loading { since, .. } => Some(progress::message_at(
                self.kind,
                since.elapsed(),
                self.options.progress_interval,
            )),
            _ => None,
        }
    }

    /// Point the card at a new key. Whatever was displayed is cleared before
    /// this returns.
    pub fn set_key(&self, key: ArtifactKey) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.state = initial_state(self.kind, &key);
        tracing::debug!(
            kind = %self.kind,
            key = %key.fragment(),
            epoch = inner.epoch,
            "card key set"
        );
        inner.key = key;
    }

    /// Set the key and look for a cached artifact.
    pub async fn mount(&self, key: ArtifactKey) {
        self.set_key(key);
        self.probe().await;
    }

    /// Silent cache-only lookup. A hit completes the card; any failure
    /// leaves it idle and is never surfaced.
    pub async fn probe(&self) {
        let (epoch, key) = {
            let inner = self.lock();
            if inner.state != CardState::Idle {
                return;
            }
            (inner.epoch, inner.key.clone())
        };

        let result = self.store.fetch_artifact(self.kind, &key, true).await;

        let mut inner = self.lock();
        if inner.epoch != epoch || inner.state != CardState::Idle {
            tracing::debug!(kind = %self.kind, "discarding stale cache probe");
            return;
        }
        match result {
            Ok(artifact) => {
                tracing::debug!(kind = %self.kind, key = %key.fragment(), "cached artifact found");
                inner.state = CardState::Completed(artifact);
            }
            Err(e) => {
                tracing::debug!(
                    kind = %self.kind,
                    key = %key.fragment(),
                    error = %e,
                    "no cached artifact"
                );
            }
        }
    }

    /// User-triggered generation from `Idle`.
    pub async fn generate(&self) -> Result<CardState, ArtifactError> {
        self.start(false, "generate", |s| {
            matches!(s, CardState::Idle | CardState::Error { .. })
        })
        .await
    }

    /// Fresh generation attempt after a failure.
    pub async fn retry(&self) -> Result<CardState, ArtifactError> {
        self.start(false, "retry", |s| matches!(s, CardState::Error { .. }))
            .await
    }

    /// Discard a completed artifact and generate a new one, but only once
    /// the user has confirmed.
    pub async fn regenerate(
        &self,
        confirm: &dyn Confirm,
    ) -> Result<RegenerateOutcome, ArtifactError> {
        let epoch = {
            let inner = self.lock();
            if !matches!(inner.state, CardState::Completed(_)) {
                return Err(invalid(self.kind, "regenerate", &inner));
            }
            inner.epoch
        };

        if !confirm.confirm(REGENERATE_PROMPT).await {
            tracing::debug!(kind = %self.kind, "regeneration declined");
            return Ok(RegenerateOutcome::Declined);
        }
        if self.lock().epoch != epoch {
            return Ok(RegenerateOutcome::Superseded);
        }

        self.start(true, "regenerate", |s| matches!(s, CardState::Completed(_)))
            .await?;
        Ok(RegenerateOutcome::Ran)
    }

    async fn start(
        &self,
        force: bool,
        action: &'static str,
        allowed: impl Fn(&CardState) -> bool,
    ) -> Result<CardState, ArtifactError> {
        let (epoch, key) = {
            let mut inner = self.lock();
            if !allowed(&inner.state) {
                return Err(invalid(self.kind, action, &inner));
            }
            inner.state = CardState::Loading {
                since: Instant::now(),
                regenerating: force,
            };
            (inner.epoch, inner.key.clone())
        };
        tracing::info!(kind = %self.kind, key = %key.fragment(), force, "generating artifact");

        let options = GenerateOptions {
            force_regenerate: force,
            language: self.options.language.clone(),
            depth: self.options.depth,
        };
        let result = self.store.generate_artifact(self.kind, &key, &options).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            tracing::debug!(kind = %self.kind, "discarding result for a previous key");
            return Ok(inner.state.clone());
        }
        inner.state = match result {
            Ok(artifact) => CardState::Completed(artifact),
            Err(e) => {
                tracing::warn!(
                    kind = %self.kind,
                    key = %key.fragment(),
                    error = %e,
                    "generation failed"
                );
                CardState::Error {
                    message: e.to_string(),
                }
            }
        };
        Ok(inner.state.clone())
    }
}

fn invalid(kind: ArtifactKind, action: &'static str, inner: &Inner) -> ArtifactError {
    if let CardState::Disabled { .. } = inner.state
        && let Err(e) = kind.check_key(&inner.key)
    {
        return e;
    }
    ArtifactError::InvalidTransition {
        action,
        state: inner.state.name(),
    }
}

fn initial_state(kind: ArtifactKind, key: &ArtifactKey) -> CardState {
    match kind.check_key(key) {
        Ok(()) => CardState::Idle,
        Err(e) => CardState::Disabled {
            reason: e.to_string(),
        },
    }
}
