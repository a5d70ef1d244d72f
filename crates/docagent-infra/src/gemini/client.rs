//! GeminiBackend -- concrete [`GenerativeBackend`] for the Generative Language API.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed when
//! building the `x-goog-api-key` header.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use tracing::{Instrument, field};

use docagent_core::generation::GenerativeBackend;
use docagent_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
    OP_GENERATE_CONTENT, OP_UPLOAD_FILE, PROVIDER_GEMINI,
};
use docagent_types::error::{GenerationError, RemoteFileError};
use docagent_types::generation::{GenerationRequest, GenerationResponse, UploadRequest};
use docagent_types::remote_file::{RemoteFile, remote_file_name};

use super::types::{
    GeminiErrorEnvelope, GeminiFile, GenerateContentRequest, GenerateContentResponse,
    UploadFileResponse, UploadMetadata, UploadMetadataFile,
};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini generative backend.
///
/// Does NOT derive Debug so the client and key never end up in logs.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiBackend {
    const API_KEY_HEADER: &'static str = "x-goog-api-key";

    /// Create a backend with the given key and per-request timeout.
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Pull the provider's error message out of a failed response.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<GeminiErrorEnvelope>(&body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("HTTP {status} ({code}): {}", envelope.error.message),
            None => format!("HTTP {status}: {}", envelope.error.message),
        },
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
}

impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        PROVIDER_GEMINI
    }

    async fn upload_file(&self, request: &UploadRequest) -> Result<RemoteFile, RemoteFileError> {
        let span = tracing::info_span!(
            "gen_ai.upload_file",
            gen_ai.operation.name = OP_UPLOAD_FILE,
            gen_ai.provider.name = PROVIDER_GEMINI,
            remote_file = %remote_file_name(&request.name),
            bytes = request.bytes.len(),
        );

        async {
            let mime_type = mime_guess::from_path(&request.file_name)
                .first_or_octet_stream()
                .to_string();
            let metadata = UploadMetadata {
                file: UploadMetadataFile {
                    name: remote_file_name(&request.name),
                    display_name: request.name.clone(),
                },
            };
            let metadata_json = serde_json::to_string(&metadata)
                .map_err(|e| RemoteFileError::Upload(format!("failed to encode metadata: {e}")))?;

            let file_part = reqwest::multipart::Part::bytes(request.bytes.clone())
                .file_name(request.file_name.clone())
                .mime_str(&mime_type)
                .map_err(|e| RemoteFileError::Upload(format!("invalid MIME type: {e}")))?;
            let metadata_part = reqwest::multipart::Part::text(metadata_json)
                .mime_str("application/json")
                .map_err(|e| RemoteFileError::Upload(format!("invalid MIME type: {e}")))?;
            let form = reqwest::multipart::Form::new()
                .part("metadata", metadata_part)
                .part("file", file_part);

            let response = self
                .client
                .post(self.url("/upload/v1beta/files"))
                .header(Self::API_KEY_HEADER, self.api_key.expose_secret())
                .header("X-Goog-Upload-Protocol", "multipart")
                .multipart(form)
                .send()
                .await
                .map_err(|e| RemoteFileError::Upload(format!("HTTP request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(RemoteFileError::Upload(error_message(response).await));
            }

            let uploaded: UploadFileResponse = response
                .json()
                .await
                .map_err(|e| RemoteFileError::Upload(format!("failed to parse response: {e}")))?;
            let file = uploaded.file.into_remote_file();
            tracing::debug!(state = %file.state, "Upload accepted");
            Ok(file)
        }
        .instrument(span)
        .await
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, RemoteFileError> {
        let response = self
            .client
            .get(self.url(&format!("/v1beta/{name}")))
            .header(Self::API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| RemoteFileError::Lookup(format!("HTTP request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => {
                let file: GeminiFile = response.json().await.map_err(|e| {
                    RemoteFileError::Lookup(format!("failed to parse response: {e}"))
                })?;
                Ok(file.into_remote_file())
            }
            StatusCode::NOT_FOUND => Err(RemoteFileError::NotFound),
            _ => Err(RemoteFileError::Lookup(error_message(response).await)),
        }
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let span = tracing::info_span!(
            "gen_ai.generate_content",
            gen_ai.operation.name = OP_GENERATE_CONTENT,
            gen_ai.provider.name = PROVIDER_GEMINI,
            gen_ai.request.model = %request.model,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
        );

        let body = GenerateContentRequest::from(request);
        let url = self.url(&format!("/v1beta/models/{}:generateContent", request.model));

        let response = self
            .client
            .post(&url)
            .header(Self::API_KEY_HEADER, self.api_key.expose_secret())
            .json(&body)
            .send()
            .instrument(span.clone())
            .await
            .map_err(|e| GenerationError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GenerationError::AuthenticationFailed
                }
                StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited {
                    retry_after_ms: retry_after_ms(response.headers()),
                },
                StatusCode::BAD_REQUEST => {
                    GenerationError::InvalidRequest(error_message(response).await)
                }
                _ => GenerationError::Provider {
                    message: error_message(response).await,
                },
            });
        }

        let wire: GenerateContentResponse = response.json().await.map_err(|e| {
            GenerationError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        if let Some(usage) = &wire.usage_metadata {
            if let Some(input) = usage.prompt_token_count {
                span.record(GEN_AI_USAGE_INPUT_TOKENS, input);
            }
            if let Some(output) = usage.candidates_token_count {
                span.record(GEN_AI_USAGE_OUTPUT_TOKENS, output);
            }
        }
        let finish_reasons: Vec<&str> = wire
            .candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .collect();
        span.record(GEN_AI_RESPONSE_FINISH_REASONS, finish_reasons.join(",").as_str());

        Ok(wire.into_generation_response())
    }
}
