//! Template store.
//!
//! Durable collection of named templates with per-language default
//! resolution, filtering, duplication, and statistics. The store owns a
//! lock around its load-modify-persist cycle and writes through to the
//! persistence collaborator after every mutation, so in-memory state may
//! briefly run ahead of the backing store when a save fails; callers
//! retry or treat that as fatal.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{CoreResult, StoreError, StoreResult};
use crate::render;
use crate::traits::TemplateRepository;
use crate::types::{
    CreateTemplate, ExtractionSchema, LanguageStats, Template, TemplateFilter, TemplatePage,
    TemplateStatistics, UpdateTemplate, INITIAL_VERSION,
};

/// Tag appended to duplicated templates.
const COPY_TAG: &str = "copy";

/// Days a template counts as recently created/updated (inclusive).
const RECENT_DAYS: i64 = 7;

struct StoreState {
    templates: HashMap<String, Template>,
    /// language -> id of the resolved default template
    defaults: HashMap<String, String>,
}

impl StoreState {
    fn new(templates: HashMap<String, Template>) -> Self {
        let mut state = Self {
            templates,
            defaults: HashMap::new(),
        };
        state.rebuild_defaults();
        state
    }

    /// Derive the default index from the `is_default` metadata flags.
    ///
    /// When several templates of one language are flagged, the
    /// lexicographically smallest id wins, deterministically.
    fn rebuild_defaults(&mut self) {
        self.defaults.clear();
        for (id, template) in &self.templates {
            if !template.is_default() {
                continue;
            }
            let replace = match self.defaults.get(&template.language) {
                Some(existing) => id < existing,
                None => true,
            };
            if replace {
                self.defaults
                    .insert(template.language.clone(), id.clone());
            }
        }
    }

    /// Stable snapshot for persistence and listing
    fn snapshot(&self) -> Vec<Template> {
        let mut templates: Vec<Template> = self.templates.values().cloned().collect();
        templates.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        templates
    }
}

/// Template store backed by a [`TemplateRepository`]
pub struct TemplateStore {
    state: RwLock<StoreState>,
    repo: Arc<dyn TemplateRepository>,
}

impl TemplateStore {
    /// Load all templates from the repository and build the default index
    pub async fn load(repo: Arc<dyn TemplateRepository>) -> StoreResult<Self> {
        let templates = repo.load_all().await?;
        info!("Loaded {} templates from repository", templates.len());
        let by_id = templates
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect::<HashMap<_, _>>();
        Ok(Self {
            state: RwLock::new(StoreState::new(by_id)),
            repo,
        })
    }

    /// Install the built-in default templates if the store is empty.
    ///
    /// Returns `true` when templates were seeded.
    pub async fn seed_defaults(&self) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.templates.is_empty() {
            return Ok(false);
        }

        let zh = Template::new("Default Chinese Template", "zh", DEFAULT_ZH_CONTENT)
            .with_description("Built-in default prompt template for Chinese extraction")
            .with_tags(vec!["default".to_string(), "zh".to_string()])
            .as_default();
        let en = Template::new("Default English Template", "en", DEFAULT_EN_CONTENT)
            .with_description("Built-in default prompt template for English extraction")
            .with_tags(vec!["default".to_string(), "en".to_string()])
            .as_default();

        info!("Seeding built-in default templates (zh, en)");
        state.templates.insert(zh.id.clone(), zh);
        state.templates.insert(en.id.clone(), en);
        state.rebuild_defaults();
        self.persist(&state).await?;
        Ok(true)
    }

    /// Create a new template with a fresh id and the initial version label
    pub async fn create(&self, request: CreateTemplate) -> StoreResult<Template> {
        let template = Template::new(request.name, request.language, request.content)
            .with_description(request.description)
            .with_tags(request.tags)
            .with_metadata(request.metadata);

        let mut state = self.state.write().await;
        debug!("Creating template {} ({})", template.id, template.name);
        state.templates.insert(template.id.clone(), template.clone());
        state.rebuild_defaults();
        self.persist(&state).await?;
        Ok(template)
    }

    /// Fetch a template by id
    pub async fn get(&self, id: &str) -> StoreResult<Template> {
        let state = self.state.read().await;
        state
            .templates
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))
    }

    /// Partially update a template.
    ///
    /// Only fields present in the request are overwritten; `updated_at`
    /// always refreshes. `version` changes only when the caller sets it.
    pub async fn update(&self, id: &str, request: UpdateTemplate) -> StoreResult<Template> {
        let mut state = self.state.write().await;
        let template = state
            .templates
            .get_mut(id)
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))?;

        if let Some(name) = request.name {
            template.name = name;
        }
        if let Some(description) = request.description {
            template.description = description;
        }
        if let Some(content) = request.content {
            template.content = content;
        }
        if let Some(tags) = request.tags {
            template.tags = tags;
        }
        if let Some(metadata) = request.metadata {
            template.metadata = metadata;
        }
        if let Some(version) = request.version {
            template.version = version;
        }
        template.updated_at = Utc::now();
        let updated = template.clone();

        state.rebuild_defaults();
        self.persist(&state).await?;
        Ok(updated)
    }

    /// Delete a template.
    ///
    /// A missing id reports `false` rather than an error; deleting twice
    /// reports `true` then `false`.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.templates.remove(id).is_none() {
            debug!("Delete of missing template {} is a no-op", id);
            return Ok(false);
        }
        state.rebuild_defaults();
        self.persist(&state).await?;
        Ok(true)
    }

    /// Duplicate a template under a new name.
    ///
    /// Everything is copied except: id (fresh), name (caller-supplied),
    /// description (references the source), tags (source tags plus a
    /// copy marker). Version resets to the initial label.
    pub async fn duplicate(&self, id: &str, new_name: &str) -> StoreResult<Template> {
        let mut state = self.state.write().await;
        let source = state
            .templates
            .get(id)
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))?;

        let mut tags = source.tags.clone();
        tags.push(COPY_TAG.to_string());
        let now = Utc::now();
        let copy = Template {
            id: Uuid::new_v4().to_string(),
            name: new_name.to_string(),
            description: format!("Copy of: {}", source.name),
            language: source.language.clone(),
            content: source.content.clone(),
            version: INITIAL_VERSION.to_string(),
            created_at: now,
            updated_at: now,
            tags,
            metadata: source.metadata.clone(),
        };

        debug!("Duplicated template {} as {}", id, copy.id);
        state.templates.insert(copy.id.clone(), copy.clone());
        state.rebuild_defaults();
        self.persist(&state).await?;
        Ok(copy)
    }

    /// List templates matching the filter, paginated.
    ///
    /// A page past the end of the result set is an empty slice, not an
    /// error.
    pub async fn list(&self, filter: &TemplateFilter) -> TemplatePage {
        let state = self.state.read().await;
        let keyword = filter.keyword.as_ref().map(|k| k.to_lowercase());

        let mut matches: Vec<&Template> = state
            .templates
            .values()
            .filter(|t| {
                if let Some(ref language) = filter.language {
                    if &t.language != language {
                        return false;
                    }
                }
                if !filter.tags.is_empty() && !filter.tags.iter().any(|tag| t.tags.contains(tag)) {
                    return false;
                }
                if let Some(ref keyword) = keyword {
                    if !t.name.to_lowercase().contains(keyword)
                        && !t.description.to_lowercase().contains(keyword)
                    {
                        return false;
                    }
                }
                true
            })
            .collect();
        matches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matches.len();
        let start = filter.page.saturating_sub(1).saturating_mul(filter.page_size);
        let templates = matches
            .into_iter()
            .skip(start)
            .take(filter.page_size)
            .cloned()
            .collect();

        TemplatePage {
            templates,
            total,
            page: filter.page,
            page_size: filter.page_size,
        }
    }

    /// Resolve the default template for a language
    pub async fn get_default_template(&self, language: &str) -> StoreResult<Template> {
        let state = self.state.read().await;
        state
            .defaults
            .get(language)
            .and_then(|id| state.templates.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NoDefaultTemplate(language.to_string()))
    }

    /// Aggregate counts over the stored templates
    pub async fn statistics(&self) -> TemplateStatistics {
        let state = self.state.read().await;
        let now = Utc::now();
        let mut languages: std::collections::BTreeMap<String, LanguageStats> =
            std::collections::BTreeMap::new();
        let mut recent_created = 0;
        let mut recent_updated = 0;

        for template in state.templates.values() {
            let entry = languages.entry(template.language.clone()).or_default();
            entry.total += 1;
            if state.defaults.get(&template.language) == Some(&template.id) {
                entry.defaults += 1;
            }
            if (now - template.created_at).num_days() <= RECENT_DAYS {
                recent_created += 1;
            }
            if (now - template.updated_at).num_days() <= RECENT_DAYS {
                recent_updated += 1;
            }
        }

        TemplateStatistics {
            total_templates: state.templates.len(),
            languages,
            default_templates: state.defaults.len(),
            recent_created,
            recent_updated,
        }
    }

    /// Render an instruction string from a stored template.
    ///
    /// Uses the template with the given id when supplied, otherwise the
    /// language's default template.
    pub async fn render_prompt(
        &self,
        language: &str,
        text: &str,
        schema: &ExtractionSchema,
        template_id: Option<&str>,
    ) -> CoreResult<String> {
        let state = self.state.read().await;
        let template = match template_id {
            Some(id) => state
                .templates
                .get(id)
                .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))?,
            None => state
                .defaults
                .get(language)
                .and_then(|id| state.templates.get(id))
                .ok_or_else(|| StoreError::NoDefaultTemplate(language.to_string()))?,
        };
        let rendered = render::render(&template.content, schema, text)?;
        Ok(rendered)
    }

    async fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let snapshot = state.snapshot();
        self.repo.save_all(&snapshot).await?;
        Ok(())
    }
}

const DEFAULT_ZH_CONTENT: &str = r#"# Knowledge Graph Extraction Prompt

## 1. Overview
你是一个顶级信息抽取模型，专门从非结构化文本中提取结构化信息，用于构建知识图谱。
- **目标**：识别文本中的实体（节点）和它们之间的关系。
- **输出格式**：JSON 格式，包含 `nodes` 和 `relationships`。

## 2. 输出结构
- `nodes`: 实体列表，每个实体包含 `id`（如 disease_001）、`name`、`type`、`aliases`、`definition`、`attributes`。
- `relationships`: 关系列表，每个关系包含 `source`、`target`、`type`。

## 3. 类型限定
- 允许的实体类型：{{ allowed_node_types }}
- 允许的关系类型：{{ allowed_relations }}
- 只允许抽取下列三元组类型：
{% for triplet in allowed_triplets %}
- {{ triplet }}
{% endfor %}

## 4. 输入文本
{{ text }}

请根据上述要求提取知识图谱。"#;

const DEFAULT_EN_CONTENT: &str = r#"# Knowledge Graph Extraction Prompt

## 1. Overview
You are a top-tier information extraction model, specialized in extracting structured information from unstructured text for building knowledge graphs.
- **Goal**: Identify entities (nodes) and their relationships in the text.
- **Output Format**: JSON containing `nodes` and `relationships`.

## 2. Output Structure
- `nodes`: list of entities, each with `id` (e.g. disease_001), `name`, `type`, `aliases`, `definition`, `attributes`.
- `relationships`: list of relations, each with `source`, `target`, `type`.

## 3. Allowed Types
- Allowed entity types: {{ allowed_node_types }}
- Allowed relation types: {{ allowed_relations }}
- Only extract the following triplet patterns:
{% for triplet in allowed_triplets %}
- {{ triplet }}
{% endfor %}

## 4. Input Text
{{ text }}

Please extract the knowledge graph according to the above requirements."#;
