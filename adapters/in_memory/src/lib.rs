//! In-memory implementation of TemplateRepository for testing and development

use async_trait::async_trait;
use promptloom_core::prelude::*;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Volatile template repository.
///
/// Contents live for the lifetime of the process; every `save_all`
/// replaces the previous snapshot wholesale, mirroring the write-through
/// contract of durable adapters.
#[derive(Default)]
pub struct InMemoryRepository {
    templates: RwLock<Vec<Template>>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with templates
    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Number of templates currently held
    pub async fn len(&self) -> usize {
        self.templates.read().await.len()
    }

    /// Whether the repository holds no templates
    pub async fn is_empty(&self) -> bool {
        self.templates.read().await.is_empty()
    }

    /// Drop all stored templates
    pub async fn clear(&self) {
        self.templates.write().await.clear();
        info!("Cleared in-memory template repository");
    }
}

#[async_trait]
impl TemplateRepository for InMemoryRepository {
    async fn load_all(&self) -> Result<Vec<Template>, StorageError> {
        let templates = self.templates.read().await;
        debug!("Loading {} templates from memory", templates.len());
        Ok(templates.clone())
    }

    async fn save_all(&self, templates: &[Template]) -> Result<(), StorageError> {
        debug!("Saving {} templates to memory", templates.len());
        *self.templates.write().await = templates.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_all().await.unwrap().is_empty());

        let first = Template::new("first", "en", "{{ text }}");
        repo.save_all(&[first.clone()]).await.unwrap();
        assert_eq!(repo.len().await, 1);

        let second = Template::new("second", "en", "{{ text }}");
        repo.save_all(&[first.clone(), second]).await.unwrap();
        assert_eq!(repo.len().await, 2);

        repo.save_all(&[first]).await.unwrap();
        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "first");
    }

    #[tokio::test]
    async fn pre_populated_repository_loads_seeded_templates() {
        let seeded = Template::new("seeded", "zh", "{{ text }}");
        let repo = InMemoryRepository::with_templates(vec![seeded.clone()]);

        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, seeded.id);

        repo.clear().await;
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn store_integration_round_trip() {
        use std::sync::Arc;

        let repo = Arc::new(InMemoryRepository::new());
        let store = TemplateStore::load(repo.clone()).await.unwrap();

        let created = store
            .create(CreateTemplate {
                name: "integration".to_string(),
                language: "en".to_string(),
                content: "{{ text }}".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        // the write-through snapshot is what a fresh store sees
        let reloaded = TemplateStore::load(repo).await.unwrap();
        let fetched = reloaded.get(&created.id).await.unwrap();
        assert_eq!(fetched.name, "integration");
    }
}
