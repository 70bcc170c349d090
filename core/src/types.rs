//! Core data types for PromptLoom

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::schema;

/// Version label assigned at template creation and duplication.
///
/// Update operations never increment this; it only changes when a caller
/// sets it explicitly.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Metadata key marking a template as its language's default.
pub const DEFAULT_FLAG_KEY: &str = "is_default";

/// A named, versioned, language-tagged piece of instruction text with
/// embedded variable and loop placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Opaque unique key; immutable after creation
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of what the template is for
    pub description: String,
    /// Language tag (e.g. "en", "zh")
    pub language: String,
    /// Template source text
    pub content: String,
    /// Free-form semantic label
    pub version: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
    /// Free-form labels for filtering
    #[serde(default)]
    pub tags: Vec<String>,
    /// Additional metadata (holds the `is_default` flag, among others)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Template {
    /// Create a new template with a fresh id and the initial version label
    pub fn new(
        name: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            language: language.into(),
            content: content.into(),
            version: INITIAL_VERSION.to_string(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the metadata map
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Mark this template as the default for its language
    pub fn as_default(mut self) -> Self {
        self.metadata
            .insert(DEFAULT_FLAG_KEY.to_string(), serde_json::Value::Bool(true));
        self
    }

    /// Whether the metadata carries a truthy `is_default` flag
    pub fn is_default(&self) -> bool {
        matches!(
            self.metadata.get(DEFAULT_FLAG_KEY),
            Some(serde_json::Value::Bool(true))
        )
    }
}

/// Request payload for creating a template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub language: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Partial-update request: only fields that are `Some` are overwritten.
///
/// `version` is included so callers can relabel explicitly; it is never
/// changed otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Filter and pagination parameters for listing templates.
///
/// Filters are conjunctive: language is an exact match, tags match any,
/// keyword is a case-insensitive substring match against name or
/// description. Pages are 1-based and apply after filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFilter {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

impl Default for TemplateFilter {
    fn default() -> Self {
        Self {
            language: None,
            tags: Vec::new(),
            keyword: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// One page of a filtered template listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePage {
    pub templates: Vec<Template>,
    /// Total matches before pagination
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Per-language template counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageStats {
    pub total: usize,
    pub defaults: usize,
}

/// Aggregate store statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStatistics {
    pub total_templates: usize,
    pub languages: BTreeMap<String, LanguageStats>,
    /// Number of languages with a resolved default template
    pub default_templates: usize,
    /// Templates created within the last 7 days (inclusive)
    pub recent_created: usize,
    /// Templates updated within the last 7 days (inclusive)
    pub recent_updated: usize,
}

/// A named set of triplet rules governing one extraction request.
///
/// Wire names match the extraction service's request body: the set is
/// called `schema` and the rules `triplet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSchema {
    #[serde(rename = "schema")]
    pub name: String,
    #[serde(rename = "triplet")]
    pub triplets: Vec<String>,
}

impl ExtractionSchema {
    pub fn new(name: impl Into<String>, triplets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            triplets,
        }
    }

    /// Sorted, deduplicated entity types derived from the triplet rules
    pub fn allowed_node_types(&self) -> Vec<String> {
        schema::allowed_node_types(&self.triplets)
    }

    /// Sorted, deduplicated relation types derived from the triplet rules
    pub fn allowed_relation_types(&self) -> Vec<String> {
        schema::allowed_relation_types(&self.triplets)
    }
}

/// Structured output of one extraction call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// An extracted entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, conventionally `type_number` (e.g. `person_001`)
    pub id: String,
    /// Entity name as it appears in the source text
    pub name: String,
    /// Entity type (e.g. "Person", "Organization")
    #[serde(rename = "type")]
    pub node_type: String,
    /// Alternative names
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Brief definition extracted from the text
    #[serde(default)]
    pub definition: String,
    /// Attribute name to list of values
    #[serde(default)]
    pub attributes: HashMap<String, Vec<serde_json::Value>>,
}

/// An extracted relationship between two nodes.
///
/// `source` and `target` are weak id references into the owning
/// [`ExtractionResult`]; validity is scored, not enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_new_assigns_id_and_initial_version() {
        let tpl = Template::new("demo", "en", "{{ text }}");
        assert!(!tpl.id.is_empty());
        assert_eq!(tpl.version, INITIAL_VERSION);
        assert_eq!(tpl.created_at, tpl.updated_at);
        assert!(!tpl.is_default());
    }

    #[test]
    fn default_flag_round_trip() {
        let tpl = Template::new("demo", "en", "{{ text }}").as_default();
        assert!(tpl.is_default());

        // non-boolean flag values are not treated as default
        let mut tpl = Template::new("demo", "en", "{{ text }}");
        tpl.metadata.insert(
            DEFAULT_FLAG_KEY.to_string(),
            serde_json::Value::String("yes".to_string()),
        );
        assert!(!tpl.is_default());
    }

    #[test]
    fn extraction_schema_wire_names() {
        let json = r#"{"schema": "crime", "triplet": ["Person-KNOWS->Person"]}"#;
        let schema: ExtractionSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.name, "crime");
        assert_eq!(schema.triplets.len(), 1);

        let out = serde_json::to_value(&schema).unwrap();
        assert!(out.get("schema").is_some());
        assert!(out.get("triplet").is_some());
    }

    #[test]
    fn node_deserializes_with_optional_fields_missing() {
        let json = r#"{"id": "person_001", "name": "Alice", "type": "Person"}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type, "Person");
        assert!(node.aliases.is_empty());
        assert!(node.definition.is_empty());
        assert!(node.attributes.is_empty());
    }
}
