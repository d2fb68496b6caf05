use aiadapter_common::Result;
use std::sync::Arc;
use tracing::debug;

use crate::context::AppContext;

/// Public entry points for other plugins
///
/// Every call goes through the request queue, so at most one request is
/// in flight against the active provider.
#[derive(Clone)]
pub struct AiAdapterApi {
    ctx: Arc<AppContext>,
}

impl AiAdapterApi {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Answer a text prompt
    ///
    /// Any failure is logged and answered with an empty string.
    pub async fn query(&self, prompt: &str) -> String {
        self.try_query(prompt).await.unwrap_or_else(|e| {
            debug!("Query failed: {}", e);
            String::new()
        })
    }

    /// Answer a prompt about a base64-encoded image
    ///
    /// Any failure is logged and answered with an empty string.
    pub async fn query_with_image(&self, prompt: &str, image: &str) -> String {
        self.try_query_with_image(prompt, image)
            .await
            .unwrap_or_else(|e| {
                debug!("Image query failed: {}", e);
                String::new()
            })
    }

    /// Answer a text prompt, reporting failures to the caller
    pub async fn try_query(&self, prompt: &str) -> Result<String> {
        let provider = self.ctx.require_provider()?;
        let prompt = prompt.to_string();
        debug!("Queueing query ({} chars) for {}", prompt.len(), provider.kind());

        self.ctx
            .queue()
            .add(async move { provider.query_handling(&prompt).await })
            .await
    }

    /// Answer a prompt about an image, reporting failures to the caller
    pub async fn try_query_with_image(&self, prompt: &str, image: &str) -> Result<String> {
        let provider = self.ctx.require_provider()?;
        let prompt = prompt.to_string();
        let image = image.to_string();
        debug!("Queueing image query for {}", provider.kind());

        self.ctx
            .queue()
            .add(async move { provider.query_with_image_handling(&prompt, &image).await })
            .await
    }
}
