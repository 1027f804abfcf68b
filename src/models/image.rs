use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};

/// Body of the outbound generation call: `{"prompt": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// True when the prompt is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

impl From<&str> for GenerationRequest {
    fn from(prompt: &str) -> Self {
        Self::new(prompt)
    }
}

impl From<String> for GenerationRequest {
    fn from(prompt: String) -> Self {
        Self::new(prompt)
    }
}

/// One successfully generated image and the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    image_url: String,
    prompt: String,
}

impl GenerationResult {
    pub fn new(image_url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            prompt: prompt.into(),
        }
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Success envelope returned by the generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

impl ImageEnvelope {
    pub fn from_body(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))
    }

    /// Extracts the image URL exactly as sent. Relative references are
    /// accepted; only a missing or blank `message` is rejected.
    pub fn into_image_url(self) -> Result<String> {
        let message = self.message.ok_or_else(|| {
            GenerationError::MalformedResponse("envelope has no `message` field".into())
        })?;

        if message.trim().is_empty() {
            return Err(GenerationError::MalformedResponse(
                "envelope `message` is empty".into(),
            ));
        }

        Ok(message)
    }
}
