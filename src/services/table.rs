// src/services/table.rs

//! External table sink.
//!
//! Inserts new stargazer records as rows through the Feishu/Lark bitable
//! batch-create API.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::{AppError, Result};
use crate::models::{StargazerRecord, TableConfig, TableTarget};

/// Upper bound on rows per batch-create request.
pub const MAX_BATCH_ROWS: usize = 500;

/// How the sink authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCredentials {
    AccessToken(String),
    /// App credentials exchanged for a tenant token before inserting
    App { app_id: String, app_secret: String },
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
}

impl ApiResponse {
    fn check(self, action: &str) -> Result<Self> {
        if self.code == 0 {
            Ok(self)
        } else {
            Err(AppError::sink(
                "table",
                format!("{action} failed with code {}: {}", self.code, self.msg),
            ))
        }
    }
}

/// Batch inserter for one table.
pub struct TableSink {
    client: Client,
    api_base: String,
    target: TableTarget,
    credentials: TableCredentials,
}

impl TableSink {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        target: TableTarget,
        credentials: TableCredentials,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            target,
            credentials,
        }
    }

    /// Build the sink from configuration; `None` when no table URL is set.
    pub fn from_config(client: Client, config: &TableConfig) -> Result<Option<Self>> {
        let Some(url) = config.url.as_deref() else {
            return Ok(None);
        };
        let target = TableTarget::from_url(url)?;

        let credentials = match (&config.access_token, &config.app_id, &config.app_secret) {
            (Some(token), _, _) => TableCredentials::AccessToken(token.clone()),
            (None, Some(app_id), Some(app_secret)) => TableCredentials::App {
                app_id: app_id.clone(),
                app_secret: app_secret.clone(),
            },
            _ => {
                return Err(AppError::config(
                    "table.url is set but neither table.access_token nor table.app_id/app_secret are",
                ));
            }
        };

        Ok(Some(Self::new(client, &config.api_base, target, credentials)))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    pub fn batch_create_url(&self) -> String {
        self.endpoint(&format!(
            "/open-apis/bitable/v1/apps/{}/tables/{}/records/batch_create",
            self.target.app_token, self.target.table_id
        ))
    }

    async fn access_token(&self) -> Result<String> {
        match &self.credentials {
            TableCredentials::AccessToken(token) => Ok(token.clone()),
            TableCredentials::App { app_id, app_secret } => {
                let response: ApiResponse = self
                    .client
                    .post(self.endpoint("/open-apis/auth/v3/tenant_access_token/internal"))
                    .json(&json!({ "app_id": app_id, "app_secret": app_secret }))
                    .send()
                    .await?
                    .json()
                    .await?;

                response
                    .check("token exchange")?
                    .tenant_access_token
                    .ok_or_else(|| AppError::sink("table", "token exchange returned no token"))
            }
        }
    }

    /// Insert every record, in batches; returns the number of rows written.
    pub async fn insert(&self, records: &[StargazerRecord], web_base: &str) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let token = self.access_token().await?;
        let url = self.batch_create_url();
        let mut written = 0;

        for chunk in records.chunks(MAX_BATCH_ROWS) {
            let rows: Vec<Value> = chunk
                .iter()
                .map(|record| json!({ "fields": record_fields(record, web_base) }))
                .collect();

            let response = self
                .client
                .post(&url)
                .bearer_auth(&token)
                .json(&json!({ "records": rows }))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::sink(
                    "table",
                    format!("batch insert returned {status} after {written} row(s)"),
                ));
            }
            response.json::<ApiResponse>().await?.check("batch insert")?;

            written += chunk.len();
            log::debug!("Inserted {} table row(s)", written);
        }

        log::info!("Inserted {} row(s) into table {}", written, self.target.table_id);
        Ok(written)
    }
}

/// Column values for one record; dates are epoch milliseconds.
pub fn record_fields(record: &StargazerRecord, web_base: &str) -> Map<String, Value> {
    let profile = &record.profile;
    let mut fields = Map::new();
    fields.insert("Login".into(), json!(profile.login));
    fields.insert("Name".into(), json!(profile.name.clone().unwrap_or_default()));
    fields.insert(
        "Profile".into(),
        json!({ "text": profile.login, "link": record.profile_url(web_base) }),
    );
    fields.insert("Public Repos".into(), json!(profile.public_repos));
    fields.insert("Followers".into(), json!(profile.followers));
    fields.insert("Following".into(), json!(profile.following));
    fields.insert("Score".into(), json!(record.score()));
    if let Some(created_at) = profile.created_at {
        fields.insert("Created At".into(), json!(created_at.timestamp_millis()));
    }
    if let Some(updated_at) = profile.updated_at {
        fields.insert("Updated At".into(), json!(updated_at.timestamp_millis()));
    }
    fields.insert(
        "Discovered At".into(),
        json!(record.discovered_at.timestamp_millis()),
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;

    fn table_config() -> TableConfig {
        TableConfig {
            url: Some("https://acme.feishu.cn/base/AppTok?table=tblStars".to_string()),
            ..TableConfig::default()
        }
    }

    #[test]
    fn disabled_without_url() {
        let sink = TableSink::from_config(Client::new(), &TableConfig::default()).unwrap();
        assert!(sink.is_none());
    }

    #[test]
    fn requires_credentials() {
        assert!(matches!(
            TableSink::from_config(Client::new(), &table_config()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn access_token_preferred_over_app_credentials() {
        let config = TableConfig {
            access_token: Some("t-123".to_string()),
            app_id: Some("cli_a".to_string()),
            app_secret: Some("secret".to_string()),
            ..table_config()
        };
        let sink = TableSink::from_config(Client::new(), &config)
            .unwrap()
            .unwrap();
        assert_eq!(sink.credentials, TableCredentials::AccessToken("t-123".into()));
        assert_eq!(
            sink.batch_create_url(),
            "https://open.feishu.cn/open-apis/bitable/v1/apps/AppTok/tables/tblStars/records/batch_create"
        );
    }

    #[test]
    fn fields_carry_counts_and_link() {
        let fields = record_fields(&record("amy", 3, 1, 2), "https://github.com");
        assert_eq!(fields["Login"], "amy");
        assert_eq!(fields["Score"], 3 + 10 + 4);
        assert_eq!(fields["Profile"]["link"], "https://github.com/amy");
        assert_eq!(fields["Discovered At"], 1_792_314_000_000_i64);
        assert!(!fields.contains_key("Created At"));
    }
}
