use std::sync::Arc;
use tracing::{info, warn};

use crate::api::AiAdapterApi;
use crate::context::AppContext;
use crate::settings_tab::SettingsTab;

/// Plugin lifecycle
///
/// `onload` restores the persisted settings, builds the active provider and
/// registers the settings tab. `onunload` drops pending requests.
pub struct AiAdapterPlugin {
    ctx: Arc<AppContext>,
    settings_tab: Option<SettingsTab>,
}

impl AiAdapterPlugin {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            settings_tab: None,
        }
    }

    pub async fn onload(&mut self) {
        info!("Loading AI adapter");
        self.ctx.load_settings();

        if let Err(e) = self.ctx.activate_provider().await {
            warn!("Starting without a provider: {}", e);
        }

        self.settings_tab = Some(SettingsTab::new(self.ctx.clone()));
    }

    pub fn onunload(&mut self) {
        info!("Unloading AI adapter");
        self.ctx.queue().clear();
        self.settings_tab = None;
    }

    /// Query surface handed to other plugins
    pub fn api(&self) -> AiAdapterApi {
        AiAdapterApi::new(self.ctx.clone())
    }

    /// Registered settings tab, present between load and unload
    pub fn settings_tab(&mut self) -> Option<&mut SettingsTab> {
        self.settings_tab.as_mut()
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }
}
