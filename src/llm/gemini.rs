use crate::common::error::{Result, ScraperError};
use crate::llm::{ExtractClient, LlmError};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const CALL_TIMEOUT_SECS: u64 = 90;

/// Gemini-backed implementation of the extraction collaborator.
///
/// Classifies every failure into the typed taxonomy at this boundary: the
/// rest of the pipeline never inspects transport details.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CALL_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }

    /// Reads `GEMINI_API_KEY`. A missing credential is a configuration
    /// error, fatal before any crawling starts.
    pub fn from_env(model: impl Into<String>, temperature: f32) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ScraperError::Config("GEMINI_API_KEY is not set".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(ScraperError::Config("GEMINI_API_KEY is empty".to_string()));
        }
        Ok(Self::new(api_key, model, temperature))
    }
}

fn extraction_prompt(chunk: &str, today: NaiveDate) -> String {
    format!(
        "あなたはイベント情報の抽出アシスタントです。今日は{today}です。\n\
         以下の記事本文から、イベント・新規オープン・新メニューの情報を抽出し、\n\
         JSON配列のみで出力してください。各要素のキーは name, place, address, \
         latitude, longitude, date_info, description です。\n\
         該当する情報がなければ [] を返してください。\n\n\
         --- 記事本文 ---\n{chunk}"
    )
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[async_trait::async_trait]
impl ExtractClient for GeminiClient {
    async fn extract(&self, chunk: &str, today: NaiveDate) -> std::result::Result<String, LlmError> {
        let url = format!(
            "{API_BASE}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "contents": [{"parts": [{"text": extraction_prompt(chunk, today)}]}],
            "generationConfig": {"temperature": self.temperature},
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transient(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if status.is_server_error() {
            return Err(LlmError::Transient(format!("server answered {}", status.as_u16())));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Permanent(format!(
                "status {}: {}",
                status.as_u16(),
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transient(format!("unreadable response body: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        debug!(chars = text.chars().count(), "model response received");
        Ok(text)
    }
}
