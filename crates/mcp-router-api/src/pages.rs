//! Page-creation helper: turns a friendly request into `API-post-page`
//! arguments and normalizes whatever the backend returns into the page.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;

/// Tool invoked for page creation
pub const PAGE_CREATE_TOOL: &str = "API-post-page";

/// Default database property holding the page title
pub const DEFAULT_TITLE_PROPERTY: &str = "Project Name";

/// Default database property holding the page status
pub const DEFAULT_STATUS_PROPERTY: &str = "Project Status";

/// Body of `POST /notion/pages.create`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
    #[serde(rename = "database_id")]
    pub database_id: Option<String>,
    pub title: Option<String>,
    pub status_name: Option<String>,
    pub title_property: Option<String>,
    pub status_property: Option<String>,
}

impl CreatePageRequest {
    /// Build the tool arguments, or a 400 when required fields are missing
    pub fn to_arguments(&self) -> Result<Value, ApiError> {
        let (database_id, title) = match (non_empty(&self.database_id), non_empty(&self.title)) {
            (Some(db), Some(title)) => (db, title),
            _ => {
                return Err(ApiError::BadRequest(
                    "database_id and title are required".to_string(),
                ))
            }
        };

        let title_key = self
            .title_property
            .as_deref()
            .unwrap_or(DEFAULT_TITLE_PROPERTY);
        let status_key = self
            .status_property
            .as_deref()
            .unwrap_or(DEFAULT_STATUS_PROPERTY);

        let mut properties = Map::new();
        properties.insert(
            title_key.to_string(),
            json!({"title": [{"text": {"content": title}}]}),
        );
        if let Some(status) = non_empty(&self.status_name) {
            properties.insert(
                status_key.to_string(),
                json!({"select": {"name": status}}),
            );
        }

        Ok(json!({
            "parent": {"database_id": database_id},
            "properties": properties,
        }))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Extract the created page from a tool result.
///
/// Text content is parsed as JSON (`{"raw": result}` if it is not JSON);
/// otherwise a `data` member is unwrapped; otherwise the result is returned
/// as is.
pub fn normalize_page_result(result: Value) -> Value {
    let text = result
        .get("content")
        .and_then(|c| c.get(0))
        .filter(|first| first.get("type").and_then(Value::as_str) == Some("text"))
        .map(|first| first.get("text").and_then(Value::as_str).unwrap_or_default());

    if let Some(text) = text {
        return match serde_json::from_str(text) {
            Ok(page) => page,
            Err(_) => json!({"raw": result}),
        };
    }

    match result {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
