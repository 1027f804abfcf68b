pub mod image_client;
pub mod mock;

use crate::{
    error::Result,
    models::{GenerationRequest, GenerationResult},
};
use async_trait::async_trait;
use std::sync::Arc;

pub use image_client::HttpImageClient;
pub use mock::{MockImageClient, MockOutcome};

/// Transport collaborator that turns one prompt into one generated image.
///
/// Implementations perform exactly one outbound call per invocation and
/// report every failure through the returned error; they never retry.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;
}

#[async_trait]
impl<G: ImageGenerator + ?Sized> ImageGenerator for Arc<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<G: ImageGenerator + ?Sized> ImageGenerator for Box<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        (**self).generate(request).await
    }
}
