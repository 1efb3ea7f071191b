//! Read-only resources: a live schema catalog, per-type documentation, and
//! static usage guides, addressable under the `callsight://` scheme.

use crate::errors::McpError;
use crate::schema::{SchemaCache, TypeKind};
use rmcp::model::{
    AnnotateAble, RawResource, RawResourceTemplate, ReadResourceResult, Resource,
    ResourceContents, ResourceTemplate,
};
use std::sync::Arc;

pub const SCHEMA_URI: &str = "callsight://schema";
pub const TYPE_URI_PREFIX: &str = "callsight://type/";
pub const CONTEXT_GUIDE_URI: &str = "callsight://guide/context";
pub const QUERY_GUIDE_URI: &str = "callsight://guide/queries";

const CONTEXT_GUIDE: &str = include_str!("resources/context_guide.md");
const QUERY_GUIDE: &str = include_str!("resources/query_guide.md");

/// The resource surface of the server.
#[derive(Clone)]
pub struct Resources {
    cache: Arc<SchemaCache>,
}

impl Resources {
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self { cache }
    }

    pub fn list(&self) -> Vec<Resource> {
        vec![
            resource(
                SCHEMA_URI,
                "Schema catalog",
                "Browsable types of the conversational-intelligence schema, from the live \
                 downstream API.",
            ),
            resource(
                CONTEXT_GUIDE_URI,
                "Usage guide",
                "What the data model represents and how the tools fit together.",
            ),
            resource(
                QUERY_GUIDE_URI,
                "Query cookbook",
                "Worked examples of queries this API answers well.",
            ),
        ]
    }

    pub fn templates(&self) -> Vec<ResourceTemplate> {
        vec![
            RawResourceTemplate {
                uri_template: format!("{TYPE_URI_PREFIX}{{name}}"),
                name: "Type documentation".to_string(),
                description: Some(
                    "Field-level documentation for one schema type, from the live \
                     downstream API."
                        .to_string(),
                ),
                mime_type: Some("text/markdown".to_string()),
            }
            .no_annotation(),
        ]
    }

    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        let text = match uri {
            SCHEMA_URI => self.render_schema().await?,
            CONTEXT_GUIDE_URI => CONTEXT_GUIDE.to_string(),
            QUERY_GUIDE_URI => QUERY_GUIDE.to_string(),
            other => match other.strip_prefix(TYPE_URI_PREFIX) {
                Some(type_name) if !type_name.is_empty() => {
                    self.render_type(type_name).await?
                }
                _ => {
                    return Err(McpError::resource_not_found(
                        format!("Unknown resource: {other}"),
                        None,
                    ));
                }
            },
        };
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }

    async fn render_schema(&self) -> Result<String, McpError> {
        let snapshot = self.cache.get().await.map_err(unavailable)?;
        let mut text = String::from("# Schema catalog\n\n");
        for descriptor in snapshot.browsable_types() {
            text.push_str(&format!(
                "## {}\n{}Fields: {}\n\n",
                descriptor.name,
                descriptor
                    .description
                    .as_deref()
                    .map(|description| format!("{description}\n"))
                    .unwrap_or_default(),
                descriptor
                    .fields()
                    .iter()
                    .map(|field| field.name.as_str())
                    .collect::<Vec<&str>>()
                    .join(", "),
            ));
        }
        Ok(text)
    }

    async fn render_type(&self, type_name: &str) -> Result<String, McpError> {
        let snapshot = self.cache.get().await.map_err(unavailable)?;
        let descriptor = snapshot.find_type(type_name).ok_or_else(|| {
            McpError::resource_not_found(
                format!("Type `{type_name}` was not found in the schema"),
                None,
            )
        })?;

        let mut text = format!("# {}\n\n", descriptor.name);
        if let Some(description) = &descriptor.description {
            text.push_str(description);
            text.push_str("\n\n");
        }
        if descriptor.kind == TypeKind::Enum {
            text.push_str("Values:\n");
            for value in descriptor.enum_values() {
                match &value.description {
                    Some(description) => {
                        text.push_str(&format!("- `{}`: {}\n", value.name, description))
                    }
                    None => text.push_str(&format!("- `{}`\n", value.name)),
                }
            }
        } else {
            text.push_str("Fields:\n");
            for field in descriptor.fields().iter().chain(descriptor.input_fields()) {
                match &field.description {
                    Some(description) => text.push_str(&format!(
                        "- `{}`: {} ({})\n",
                        field.name, field.type_ref, description
                    )),
                    None => {
                        text.push_str(&format!("- `{}`: {}\n", field.name, field.type_ref))
                    }
                }
            }
        }
        Ok(text)
    }
}

fn resource(uri: &str, name: &str, description: &str) -> Resource {
    RawResource {
        uri: uri.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        mime_type: Some("text/markdown".to_string()),
        size: None,
    }
    .no_annotation()
}

fn unavailable(error: crate::errors::QueryError) -> McpError {
    McpError::internal_error(error.to_string(), None)
}
