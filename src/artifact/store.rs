use async_trait::async_trait;

use super::models::{Artifact, ArtifactKey, ArtifactKind, GenerateOptions};
use crate::errors::StoreError;

/// AI artifact store contract.
/// Real implementation: `client::ApiClient`. Test double: `MockArtifactStore`.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Read an artifact. With `cache_only` the store must not generate
    /// anything and answers `StoreError::NotFound` when nothing is cached.
    async fn fetch_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        cache_only: bool,
    ) -> Result<Artifact, StoreError>;

    /// Generate (or serve from cache unless forced) an artifact.
    async fn generate_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        options: &GenerateOptions,
    ) -> Result<Artifact, StoreError>;
}
