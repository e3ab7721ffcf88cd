//! GraphQL client for the cluster admin API.

use super::FilesClient;
use crate::config::ClusterConfig;
use crate::error::{SyncError, ValidationError};
use crate::store::SCHEMA_PATH;
use crate::types::{FileChange, FileRecord};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const FETCH_FILES_QUERY: &str = "query configFiles {
  cluster {
    config {
      path: filename
      content
    }
  }
}";

const APPLY_FILES_MUTATION: &str = "mutation set_files($files: [ConfigSectionInput!]) {
  cluster {
    config(sections: $files) {
      filename
    }
  }
}";

const VALIDATE_FILES_QUERY: &str = "query validateConfig($sections: [ConfigSectionInput!]) {
  cluster {
    validate_config(sections: $sections) {
      error
    }
  }
}";

const FETCH_SCHEMA_QUERY: &str = "query getSchema {
  cluster {
    schema {
      as_yaml
    }
  }
}";

const CHECK_SCHEMA_MUTATION: &str = "mutation checkSchema($yaml: String!) {
  cluster {
    check_schema(as_yaml: $yaml) {
      error
    }
  }
}";

const APPLY_SCHEMA_MUTATION: &str = "mutation setSchema($yaml: String!) {
  cluster {
    schema(as_yaml: $yaml) {
      as_yaml
    }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ClusterData<T> {
    cluster: T,
}

#[derive(Debug, Deserialize)]
struct ConfigSection {
    path: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FetchFilesData {
    config: Vec<ConfigSection>,
}

#[derive(Debug, Deserialize)]
struct ValidateData {
    validate_config: ValidateResult,
}

#[derive(Debug, Deserialize)]
struct ValidateResult {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DdlSchema {
    as_yaml: String,
}

#[derive(Debug, Deserialize)]
struct SchemaData {
    schema: DdlSchema,
}

#[derive(Debug, Deserialize)]
struct CheckSchemaData {
    check_schema: ValidateResult,
}

#[derive(Debug, Serialize)]
struct ConfigSectionInput<'a> {
    filename: &'a str,
    content: Option<&'a str>,
}

fn section_inputs(changes: &[FileChange]) -> Vec<ConfigSectionInput<'_>> {
    changes
        .iter()
        .map(|c| ConfigSectionInput {
            filename: &c.path,
            content: c.content.as_deref(),
        })
        .collect()
}

/// Client for the cluster's GraphQL endpoint
pub struct GraphqlFilesClient {
    http: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl GraphqlFilesClient {
    pub fn new(config: &ClusterConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, SyncError> {
        let mut builder = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = response.status();
        let body: GraphqlResponse<T> = response.json().await.map_err(|e| {
            if status.is_success() {
                SyncError::Protocol(e.to_string())
            } else {
                SyncError::Transport(format!("HTTP {}", status))
            }
        })?;

        if !body.errors.is_empty() {
            warn!(errors = body.errors.len(), "Backend returned GraphQL errors");
            return Err(SyncError::Rejected(
                body.errors
                    .iter()
                    .map(|e| parse_error_message(&e.message))
                    .collect(),
            ));
        }
        body.data
            .ok_or_else(|| SyncError::Protocol("response has neither data nor errors".to_string()))
    }
}

#[async_trait]
impl FilesClient for GraphqlFilesClient {
    async fn fetch_files(&self) -> Result<Vec<FileRecord>, SyncError> {
        let data: ClusterData<FetchFilesData> =
            self.request(FETCH_FILES_QUERY, Value::Null).await?;
        debug!(files = data.cluster.config.len(), "Fetched configuration files");
        Ok(data
            .cluster
            .config
            .into_iter()
            .map(|s| FileRecord::new(s.path, s.content.unwrap_or_default()))
            .collect())
    }

    async fn apply_files(&self, changes: &[FileChange]) -> Result<(), SyncError> {
        let _: ClusterData<Value> = self
            .request(
                APPLY_FILES_MUTATION,
                json!({ "files": section_inputs(changes) }),
            )
            .await?;
        Ok(())
    }

    async fn validate_files(&self, changes: &[FileChange]) -> Result<(), SyncError> {
        let data: ClusterData<ValidateData> = self
            .request(
                VALIDATE_FILES_QUERY,
                json!({ "sections": section_inputs(changes) }),
            )
            .await?;
        match data.cluster.validate_config.error {
            Some(message) => Err(SyncError::Rejected(vec![parse_error_message(&message)])),
            None => Ok(()),
        }
    }

    async fn fetch_schema(&self) -> Result<String, SyncError> {
        let data: ClusterData<SchemaData> = self.request(FETCH_SCHEMA_QUERY, Value::Null).await?;
        Ok(data.cluster.schema.as_yaml)
    }

    async fn check_schema(&self, yaml: &str) -> Result<(), SyncError> {
        let data: ClusterData<CheckSchemaData> = self
            .request(CHECK_SCHEMA_MUTATION, json!({ "yaml": yaml }))
            .await
            .map_err(schema_rejection)?;
        match data.cluster.check_schema.error {
            Some(message) => Err(schema_rejection(SyncError::Rejected(vec![
                parse_error_message(&message),
            ]))),
            None => Ok(()),
        }
    }

    async fn apply_schema(&self, yaml: &str) -> Result<(), SyncError> {
        let _: ClusterData<SchemaData> = self
            .request(APPLY_SCHEMA_MUTATION, json!({ "yaml": yaml }))
            .await
            .map_err(schema_rejection)?;
        debug!(bytes = yaml.len(), "Applied schema");
        Ok(())
    }
}

/// Attribute unlocated schema errors to the schema document
fn schema_rejection(error: SyncError) -> SyncError {
    match error {
        SyncError::Rejected(errors) => SyncError::Rejected(
            errors
                .into_iter()
                .map(|e| match e.path {
                    Some(_) => e,
                    None => e.with_path(SCHEMA_PATH),
                })
                .collect(),
        ),
        other => other,
    }
}

/// Best-effort extraction of file path and position from a backend message
///
/// Recognizes `section "name"` or a leading `name: ` for the path, and
/// `line N` / `column M` anywhere for the position.
pub fn parse_error_message(message: &str) -> ValidationError {
    let mut error = ValidationError::new(message.trim());
    if let Some(path) = quoted_section(message).or_else(|| leading_file_name(message)) {
        error = error.with_path(path);
    }
    error.line = number_after(message, "line ");
    error.column = number_after(message, "column ");
    error
}

fn quoted_section(message: &str) -> Option<String> {
    let start = message.find("section \"")? + "section \"".len();
    let len = message[start..].find('"')?;
    Some(message[start..start + len].to_string())
}

fn leading_file_name(message: &str) -> Option<String> {
    let (head, _) = message.split_once(": ")?;
    let looks_like_path = head.contains('.')
        && head
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/'));
    looks_like_path.then(|| head.to_string())
}

fn number_after(message: &str, label: &str) -> Option<u32> {
    let start = message.find(label)? + label.len();
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
