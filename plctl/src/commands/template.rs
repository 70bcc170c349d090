//! Template management command implementations

use crate::cli::TemplateCommands;
use crate::commands::{open_store, read_text_file};
use crate::config::PlctlConfig;
use crate::output;
use colored::*;
use promptloom_core::errors::CoreError;
use promptloom_core::types::{CreateTemplate, TemplateFilter, UpdateTemplate, DEFAULT_FLAG_KEY};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Handle template management commands
pub async fn handle_template_command(
    command: TemplateCommands,
    config: &PlctlConfig,
) -> Result<(), CoreError> {
    let store = open_store(config).await?;

    match command {
        TemplateCommands::Create {
            name,
            description,
            language,
            content,
            content_file,
            tags,
            metadata,
            default,
        } => {
            let content = resolve_content(content, content_file)?;
            let mut metadata = parse_metadata(metadata)?;
            if default {
                metadata.insert(DEFAULT_FLAG_KEY.to_string(), serde_json::Value::Bool(true));
            }

            let created = store
                .create(CreateTemplate {
                    name,
                    description,
                    language,
                    content,
                    tags,
                    metadata,
                })
                .await?;

            println!(
                "{}",
                format!("✓ Template '{}' created", created.name).green().bold()
            );
            output::display_template_details(&created, &config.default_format)?;
            Ok(())
        }

        TemplateCommands::Get { template_id } => {
            let template = store.get(&template_id).await?;
            output::display_template_details(&template, &config.default_format)
        }

        TemplateCommands::Update {
            template_id,
            name,
            description,
            content,
            content_file,
            tags,
            metadata,
            version,
        } => {
            let content = match (content, content_file) {
                (None, None) => None,
                (content, content_file) => Some(resolve_content(content, content_file)?),
            };
            let metadata = match metadata {
                Some(raw) => Some(parse_metadata(Some(raw))?),
                None => None,
            };

            let updated = store
                .update(
                    &template_id,
                    UpdateTemplate {
                        name,
                        description,
                        content,
                        tags: if tags.is_empty() { None } else { Some(tags) },
                        metadata,
                        version,
                    },
                )
                .await?;

            println!(
                "{}",
                format!("✓ Template '{}' updated", updated.name).green().bold()
            );
            output::display_template_details(&updated, &config.default_format)?;
            Ok(())
        }

        TemplateCommands::Delete { template_id } => {
            if store.delete(&template_id).await? {
                println!(
                    "{}",
                    format!("✓ Template {} deleted", template_id).green().bold()
                );
            } else {
                println!("Template {} does not exist; nothing deleted", template_id);
            }
            Ok(())
        }

        TemplateCommands::Duplicate { template_id, name } => {
            let copy = store.duplicate(&template_id, &name).await?;
            println!(
                "{}",
                format!("✓ Duplicated {} as '{}' ({})", template_id, copy.name, copy.id)
                    .green()
                    .bold()
            );
            Ok(())
        }

        TemplateCommands::List {
            language,
            tags,
            keyword,
            page,
            page_size,
        } => {
            let filter = TemplateFilter {
                language,
                tags,
                keyword,
                page,
                page_size,
            };
            let result = store.list(&filter).await;
            output::display_template_page(&result, &config.default_format)
        }

        TemplateCommands::Stats => {
            let stats = store.statistics().await;
            output::display_statistics(&stats, &config.default_format)
        }

        TemplateCommands::Seed => {
            if store.seed_defaults().await? {
                info!("Seeded built-in default templates");
                println!("{}", "✓ Built-in default templates installed".green().bold());
            } else {
                println!("Store is not empty; seeding skipped");
            }
            Ok(())
        }
    }
}

/// Take template content from --content or --content-file
fn resolve_content(
    content: Option<String>,
    content_file: Option<PathBuf>,
) -> Result<String, CoreError> {
    match (content, content_file) {
        (Some(content), None) => Ok(content),
        (None, Some(path)) => read_text_file(&path),
        _ => Err(CoreError::Configuration(
            "Provide template content via --content or --content-file".to_string(),
        )),
    }
}

/// Parse a --metadata JSON object argument
fn parse_metadata(
    metadata: Option<String>,
) -> Result<HashMap<String, serde_json::Value>, CoreError> {
    match metadata {
        None => Ok(HashMap::new()),
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            CoreError::Configuration(format!("Invalid --metadata JSON object: {}", e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_content_requires_exactly_one_source() {
        assert!(resolve_content(Some("x".to_string()), None).is_ok());
        assert!(resolve_content(None, None).is_err());
    }

    #[test]
    fn parse_metadata_accepts_objects_only() {
        assert!(parse_metadata(None).unwrap().is_empty());
        let parsed = parse_metadata(Some(r#"{"is_default": true}"#.to_string())).unwrap();
        assert_eq!(parsed.get("is_default"), Some(&serde_json::Value::Bool(true)));
        assert!(parse_metadata(Some("[1, 2]".to_string())).is_err());
    }
}
