// libs/conference-widget-cell/src/services/script.rs
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::models::WidgetError;

/// Loads the provider's `external_api.js` entry point once per process.
///
/// Every mount goes through [`ensure_loaded`]; the first successful fetch
/// is reused by all later mounts. A failed fetch does not poison the
/// loader, so the next mount attempt retries.
///
/// [`ensure_loaded`]: ScriptLoader::ensure_loaded
pub struct ScriptLoader {
    client: reqwest::Client,
    script_url: String,
    loaded: OnceCell<()>,
}

impl ScriptLoader {
    pub fn new(jitsi_base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            script_url: format!("{}/external_api.js", jitsi_base_url.trim_end_matches('/')),
            loaded: OnceCell::new(),
        }
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    #[instrument(skip(self))]
    pub async fn ensure_loaded(&self) -> Result<(), WidgetError> {
        self.loaded
            .get_or_try_init(|| async {
                debug!("Fetching conferencing script {}", self.script_url);

                let response = self
                    .client
                    .get(&self.script_url)
                    .send()
                    .await
                    .map_err(|e| WidgetError::ScriptLoad(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(WidgetError::ScriptLoad(format!(
                        "{} returned {}",
                        self.script_url, status
                    )));
                }

                let body = response
                    .text()
                    .await
                    .map_err(|e| WidgetError::ScriptLoad(e.to_string()))?;
                if body.trim().is_empty() {
                    return Err(WidgetError::ScriptLoad(
                        "script body was empty".to_string(),
                    ));
                }

                info!("Conferencing script loaded");
                Ok(())
            })
            .await
            .map(|_| ())
    }
}
