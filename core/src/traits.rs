//! Collaborator contracts for PromptLoom.
//!
//! The extraction service and the persistence layer are external to the
//! core; they are reached exclusively through these traits.

use crate::errors::{ExtractError, StorageError};
use crate::types::{ExtractionResult, Template};
use async_trait::async_trait;

/// The black-box text-extraction service.
///
/// Takes a fully rendered instruction string and returns structured
/// nodes and relationships.
#[async_trait]
pub trait GraphExtractor: Send + Sync {
    async fn extract(&self, prompt: &str) -> Result<ExtractionResult, ExtractError>;
}

/// Opaque load/save contract for template persistence.
///
/// The store writes through after every mutation; there is no partial
/// update at this layer.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Load every stored template; empty if no backing store exists yet
    async fn load_all(&self) -> Result<Vec<Template>, StorageError>;

    /// Replace the backing store contents with the given templates
    async fn save_all(&self, templates: &[Template]) -> Result<(), StorageError>;
}
