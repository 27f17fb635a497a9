//! CLI configuration file.

use anyhow::{anyhow, Context, Result};
use pensum_layout::{LayoutConfig, ViewportConfig};
use pensum_progress::EstimatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Presentation and planning parameters. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PensumConfig {
    /// Column layout spacing
    pub layout: LayoutConfig,
    /// Viewport limits handed to renderers
    pub viewport: ViewportConfig,
    /// Completion estimator settings
    pub estimator: EstimatorConfig,
}

impl PensumConfig {
    /// Load from a JSON file, or defaults when no file is given.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate().map_err(|e| anyhow!("layout: {e}"))?;
        self.viewport.validate().map_err(|e| anyhow!("viewport: {e}"))?;
        self.estimator.validate().map_err(|e| anyhow!("estimator: {e}"))?;
        Ok(())
    }
}
