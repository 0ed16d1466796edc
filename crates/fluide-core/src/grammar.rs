//! Grammar check of a learner's sentence via the Gemini API.
//!
//! The model is asked for a structured JSON verdict; the client validates the
//! shape and hands back a [`Feedback`]. Any failure past the credential check
//! is a generic upstream error with no retry.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::credentials::{CredentialStore, Provider};
use crate::error::GrammarError;
use crate::storage::{GrammarConfig, KeyValueStore};

/// Verdict on one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,
    pub explanation: String,
}

/// Anything that can judge a sentence built around a chunk.
#[allow(async_fn_in_trait)]
pub trait GrammarChecker {
    async fn check(&self, chunk: &str, sentence: &str) -> Result<Feedback, GrammarError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, config: &GrammarConfig) -> Result<Self, GrammarError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Build a client from the stored key, falling back to the environment.
    ///
    /// # Errors
    /// `CredentialMissing` when no key is available anywhere.
    pub fn from_credentials<S: KeyValueStore>(
        credentials: &CredentialStore<S>,
        config: &GrammarConfig,
    ) -> Result<Self, GrammarError> {
        let provider = Provider::Gemini;
        let key = credentials
            .get_or_env(provider)
            .ok_or_else(|| GrammarError::CredentialMissing {
                provider: provider.to_string(),
            })?;
        Self::new(key, config)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl GrammarChecker for GeminiClient {
    async fn check(&self, chunk: &str, sentence: &str) -> Result<Feedback, GrammarError> {
        let body = request_body(chunk, sentence);
        tracing::debug!(model = %self.model, "requesting grammar check");

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(%status, "grammar check rejected");
            return Err(GrammarError::Upstream(format!("HTTP {status}")));
        }

        let data: Value = resp.json().await?;
        parse_response(&data)
    }
}

fn prompt(chunk: &str, sentence: &str) -> String {
    format!(
        "The student is learning the French chunk: \"{chunk}\".\n\
         They wrote this sentence using it: \"{sentence}\".\n\
         Check if the grammar is correct and if the chunk is used naturally.\n\
         If incorrect, provide the correction."
    )
}

fn request_body(chunk: &str, sentence: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(chunk, sentence) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "isCorrect": { "type": "BOOLEAN" },
                    "correction": { "type": "STRING" },
                    "explanation": { "type": "STRING" }
                },
                "required": ["isCorrect", "explanation"]
            }
        }
    })
}

/// Pull the model's JSON text out of the first candidate and decode it.
fn parse_response(data: &Value) -> Result<Feedback, GrammarError> {
    if let Some(err) = data.get("error") {
        return Err(GrammarError::Upstream(format!("API error: {err}")));
    }

    let text = data["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| GrammarError::Upstream("no response from model".into()))?;

    let mut feedback: Feedback = serde_json::from_str(text)
        .map_err(|e| GrammarError::Upstream(format!("malformed verdict: {e}")))?;
    feedback.correction = feedback.correction.filter(|c| !c.trim().is_empty());
    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn model_reply(verdict: &str) -> String {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": verdict }] } }]
        })
        .to_string()
    }

    fn config_for(server: &mockito::Server) -> GrammarConfig {
        GrammarConfig {
            base_url: server.url(),
            ..GrammarConfig::default()
        }
    }

    #[tokio::test]
    async fn correct_sentence_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(model_reply(r#"{"isCorrect":true,"explanation":"Parfait."}"#))
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", &config_for(&server)).unwrap();
        let feedback = client
            .check("Je pense que", "Je pense que c'est une bonne idée.")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(feedback.is_correct);
        assert_eq!(feedback.correction, None);
        assert_eq!(feedback.explanation, "Parfait.");
    }

    #[tokio::test]
    async fn correction_is_returned() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_body(model_reply(
                r#"{"isCorrect":false,"correction":"Il faut que je parte.","explanation":"Subjonctif."}"#,
            ))
            .create_async()
            .await;

        let client = GeminiClient::new("k", &config_for(&server)).unwrap();
        let feedback = client.check("Il faut que", "Il faut que je pars.").await.unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.correction.as_deref(), Some("Il faut que je parte."));
    }

    #[tokio::test]
    async fn http_failure_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(500)
            .create_async()
            .await;

        let client = GeminiClient::new("k", &config_for(&server)).unwrap();
        let err = client.check("a", "b").await.unwrap_err();
        assert!(matches!(err, GrammarError::Upstream(_)));
    }

    #[tokio::test]
    async fn malformed_verdict_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_body(model_reply("not json"))
            .create_async()
            .await;

        let client = GeminiClient::new("k", &config_for(&server)).unwrap();
        assert!(matches!(
            client.check("a", "b").await,
            Err(GrammarError::Upstream(_))
        ));
    }

    #[test]
    fn missing_key_is_a_precondition_error() {
        std::env::remove_var("FLUIDE_GEMINI_API_KEY");
        let creds = CredentialStore::new(MemoryStore::new());
        if creds.has_key(Provider::Gemini) {
            // A key was baked in at build time.
            return;
        }
        let result = GeminiClient::from_credentials(&creds, &GrammarConfig::default());
        assert!(matches!(result, Err(GrammarError::CredentialMissing { .. })));
    }

    #[test]
    fn empty_candidates_are_rejected() {
        let data = json!({ "candidates": [] });
        assert!(matches!(parse_response(&data), Err(GrammarError::Upstream(_))));
    }

    #[test]
    fn blank_correction_is_dropped() {
        let data: Value = serde_json::from_str(&model_reply(
            r#"{"isCorrect":true,"correction":" ","explanation":"ok"}"#,
        ))
        .unwrap();
        assert_eq!(parse_response(&data).unwrap().correction, None);
    }

    #[test]
    fn request_carries_schema_and_prompt() {
        let body = request_body("Je veux", "Je veux partir.");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"Je veux\""));
        assert!(text.contains("\"Je veux partir.\""));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }
}
