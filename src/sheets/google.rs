use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{ServiceAccountAuth, SheetsApi};
use crate::config::GoogleSettings;
use crate::error::SheetsError;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

/// Sheets v4 REST client authenticated as a service account.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    api_base: String,
    auth: ServiceAccountAuth,
}

impl GoogleSheetsClient {
    pub fn new(settings: &GoogleSettings) -> Self {
        let http = reqwest::Client::new();
        GoogleSheetsClient {
            auth: ServiceAccountAuth::new(settings, http.clone()),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn values_url(&self, sheet_id: &str, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.api_base,
            urlencoding::encode(sheet_id),
            urlencoding::encode(range)
        )
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn get_values(
        &self,
        sheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .get(self.values_url(sheet_id, range))
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::InvalidResponse(e.to_string()))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn update_value(
        &self,
        sheet_id: &str,
        range: &str,
        value: &str,
    ) -> Result<(), SheetsError> {
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .put(self.values_url(sheet_id, range))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token)
            .json(&serde_json::json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[value]],
            }))
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = upstream_message(&body)
        .unwrap_or_else(|| format!("Sheets API returned {}", status));

    Err(SheetsError::Api {
        status: status.as_u16(),
        message,
    })
}

fn upstream_message(body: &str) -> Option<String> {
    serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

// formatted values arrive as strings; anything else is rendered as JSON text
fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
