//! Minimal client for the Cloudflare D1 REST API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shopping_lists_core::RecordError;
use tracing::{debug, instrument};

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// D1 query request body.
#[derive(Serialize)]
struct D1QueryRequest<'a> {
    sql: &'a str,
    params: Vec<String>,
}

/// D1 API response structure.
#[derive(Deserialize)]
struct D1Response {
    success: bool,
    result: Option<Vec<D1QueryResult>>,
    errors: Option<Vec<D1Error>>,
}

#[derive(Deserialize)]
struct D1QueryResult {
    results: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct D1Error {
    message: String,
}

#[derive(Deserialize)]
struct TokenVerifyResponse {
    success: bool,
    result: Option<TokenInfo>,
}

/// Details of the API token the client authenticates with.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub id: String,
    pub status: String,
}

pub struct D1Client {
    http: Client,
    api_base: String,
    account_id: String,
    api_token: String,
    database_id: String,
}

impl D1Client {
    pub fn new(account_id: String, api_token: String, database_id: String) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, account_id, api_token, database_id)
    }

    /// Point the client at another API root (a mock server in tests).
    pub fn with_api_base(
        api_base: &str,
        account_id: String,
        api_token: String,
        database_id: String,
    ) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            account_id,
            api_token,
            database_id,
        }
    }

    fn query_url(&self) -> String {
        format!(
            "{}/accounts/{}/d1/database/{}/query",
            self.api_base, self.account_id, self.database_id
        )
    }

    /// Execute a D1 query and return the rows of its only statement.
    #[instrument(skip(self, params), level = "debug")]
    pub async fn execute(
        &self,
        sql: &str,
        params: Vec<String>,
    ) -> Result<Vec<serde_json::Value>, RecordError> {
        let query = D1QueryRequest { sql, params };

        let response = self
            .http
            .post(self.query_url())
            .bearer_auth(&self.api_token)
            .json(&query)
            .send()
            .await
            .map_err(|e| RecordError::Transport(format!("D1 request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecordError::Transport(format!("Failed to read D1 response: {}", e)))?;

        if !status.is_success() {
            return Err(RecordError::Transport(format!(
                "D1 API returned {}: {}",
                status, body
            )));
        }

        let d1_response: D1Response = serde_json::from_str(&body)
            .map_err(|e| RecordError::Transport(format!("Invalid D1 response: {}", e)))?;

        if !d1_response.success {
            let error_msg = d1_response
                .errors
                .map(|errs| {
                    errs.into_iter()
                        .map(|e| e.message)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_else(|| "Unknown D1 error".to_string());
            return Err(RecordError::Transport(format!(
                "D1 query failed: {}",
                error_msg
            )));
        }

        let rows = d1_response
            .result
            .and_then(|mut r| r.pop())
            .map(|qr| qr.results)
            .ok_or(RecordError::EmptyResult)?;

        debug!("D1 returned {} rows", rows.len());
        Ok(rows)
    }

    /// Look up the API token this client uses.
    pub async fn verify_token(&self) -> Result<TokenInfo, RecordError> {
        let response = self
            .http
            .get(format!("{}/user/tokens/verify", self.api_base))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| RecordError::Transport(format!("Token verify failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecordError::Transport(format!(
                "Token verify returned {}",
                status
            )));
        }

        let verify: TokenVerifyResponse = response
            .json()
            .await
            .map_err(|e| RecordError::Transport(format!("Invalid verify response: {}", e)))?;

        match verify.result {
            Some(info) if verify.success => Ok(info),
            _ => Err(RecordError::EmptyResult),
        }
    }
}
