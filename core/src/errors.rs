//! Error types for PromptLoom core operations

use thiserror::Error;

/// Main error type for PromptLoom core operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Template store error: {0}")]
    Store(#[from] StoreError),

    #[error("Template render error: {0}")]
    Render(#[from] RenderError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from template store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("No default template for language: {0}")]
    NoDefaultTemplate(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Template syntax errors raised while rendering.
///
/// A well-formed template that references only defined variables always
/// renders; these are the only failure classes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Undefined template variable: {0}")]
    UndefinedVariable(String),

    #[error("Variable is not iterable: {0}")]
    NotIterable(String),

    #[error("Malformed template: {0}")]
    Malformed(String),
}

/// Errors from the extraction collaborator.
///
/// The core never inspects these beyond recording that the call failed.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error from extraction service: {0}")]
    Api(String),

    #[error("Timeout during extraction call")]
    Timeout,

    #[error("Failed to parse extraction response: {0}")]
    ResponseParse(String),
}

/// Errors from the persistence collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Corrupt template store: {0}")]
    Corrupt(String),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
