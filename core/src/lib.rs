//! # PromptLoom Core
//!
//! Core types, traits, and engines for the PromptLoom template
//! evaluation system: the triplet schema grammar, the template store,
//! the rendering engine, and the multi-metric evaluation engine.
//! Storage backends and extraction services plug in through the traits
//! in [`traits`].

pub mod errors;
pub mod eval;
pub mod render;
pub mod schema;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use errors::{CoreError, ExtractError, RenderError, StorageError, StoreError};
pub use eval::{CaseOutcome, CaseResult, EvaluationEngine, EvaluationReport, MetricKind};
pub use schema::{allowed_node_types, allowed_relation_types, parse_triplet, TripletParts};
pub use store::TemplateStore;
pub use traits::{GraphExtractor, TemplateRepository};
pub use types::{
    CreateTemplate, ExtractionResult, ExtractionSchema, Node, Relationship, Template,
    TemplateFilter, TemplatePage, TemplateStatistics, UpdateTemplate,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::eval::*;
    pub use crate::render::{render, render_with, Value};
    pub use crate::schema::*;
    pub use crate::store::*;
    pub use crate::traits::*;
    pub use crate::types::*;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
