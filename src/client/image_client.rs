use super::ImageGenerator;
use crate::{
    config::ClientConfig,
    error::{GenerationError, Result},
    logger,
    models::{GenerationRequest, GenerationResult, ImageEnvelope},
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};

/// Calls a remote generation endpoint over HTTP.
#[derive(Clone)]
pub struct HttpImageClient {
    client: Client,
    endpoint: String,
}

impl HttpImageClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::ConfigError(e.to_string()))?;

        Self::with_client(client, config.endpoint)
    }

    /// Reuses a preconfigured reqwest client, e.g. one carrying default headers.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint).map_err(|e| {
            GenerationError::ConfigError(format!("invalid endpoint `{}`: {}", endpoint, e))
        })?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for HttpImageClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let request_json = serde_json::to_string(request)
            .map_err(|e| GenerationError::SerializationError(e.to_string()))?;

        log::info!("Requesting image from {}", self.endpoint);
        log::debug!("Image generation request payload: {}", request_json);
        let _timer = logger::timer("image generation request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(request_json)
            .send()
            .await
            .map_err(|e| GenerationError::TransportError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ResponseStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::TransportError(e.to_string()))?;

        let image_url = ImageEnvelope::from_body(&body)?.into_image_url()?;
        log::debug!("Endpoint returned image {}", image_url);

        Ok(GenerationResult::new(image_url, request.prompt.clone()))
    }
}
