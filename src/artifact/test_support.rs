//! Doubles shared by artifact tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::confirm::Confirm;
use super::models::*;
use super::store::ArtifactStore;
use crate::errors::StoreError;

pub fn generated_at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap()
}

pub fn artifact(kind: ArtifactKind, key: ArtifactKey, content: &str) -> Artifact {
    Artifact {
        kind,
        key,
        content: content.to_string(),
        cached: true,
        generated_at: generated_at(0),
        language: Some("en".into()),
        depth: None,
    }
}

/// In-memory `ArtifactStore` that counts calls and can inject failures.
#[derive(Default)]
pub struct MockArtifactStore {
    pub cache: Mutex<HashMap<(ArtifactKind, ArtifactKey), Artifact>>,
    pub fetch_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub fail_generates: Mutex<VecDeque<StoreError>>,
    pub last_options: Mutex<Option<GenerateOptions>>,
    pub generated: AtomicUsize,
}

impl MockArtifactStore {
    pub fn with_cached(artifacts: Vec<Artifact>) -> Self {
        let store = Self::default();
        {
            let mut cache = store.cache.lock().unwrap();
            for a in artifacts {
                cache.insert((a.kind, a.key.clone()), a);
            }
        }
        store
    }

    pub fn fail_next_generate(&self, err: StoreError) {
        self.fail_generates.lock().unwrap().push_back(err);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn generations(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactStore for MockArtifactStore {
    async fn fetch_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        cache_only: bool,
    ) -> Result<Artifact, StoreError> {
        assert!(cache_only, "cards only ever probe the cache");
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let found = self.cache.lock().unwrap().get(&(kind, key.clone())).cloned();
        found.ok_or_else(|| StoreError::NotFound("no cached artifact".into()))
    }

    async fn generate_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        options: &GenerateOptions,
    ) -> Result<Artifact, StoreError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        tokio::task::yield_now().await;
        if let Some(err) = self.fail_generates.lock().unwrap().pop_front() {
            return Err(err);
        }
        let n = self.generated.fetch_add(1, Ordering::SeqCst) as u32 + 1;
        let mut cache = self.cache.lock().unwrap();
        if !options.force_regenerate
            && let Some(existing) = cache.get(&(kind, key.clone()))
        {
            return Ok(existing.clone());
        }
        let fresh = Artifact {
            kind,
            key: key.clone(),
            content: format!("generated #{}", n),
            cached: false,
            generated_at: generated_at(n),
            language: Some(options.language.clone()),
            depth: Some(options.depth),
        };
        cache.insert((kind, key.clone()), fresh.clone());
        Ok(fresh)
    }
}

/// Records prompts and answers with a fixed value.
pub struct RecordingConfirm {
    pub answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Confirm for RecordingConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}
