//! Named scrape targets loaded from YAML.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vel_adapters::{BlankTarget, ScrapeTarget};

pub const DEFAULT_TARGET: &str = "default";

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub display_name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Product pages to scrape live; empty means the demo catalog.
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegistry {
    pub targets: Vec<TargetConfig>,
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self {
            targets: vec![TargetConfig {
                name: DEFAULT_TARGET.to_string(),
                display_name: "Demo Product Search".to_string(),
                enabled: true,
                urls: Vec::new(),
            }],
        }
    }
}

impl TargetRegistry {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing target registry")
    }

    /// Missing file falls back to the built-in demo target.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no target registry file, using built-in demo target");
                Ok(Self::default())
            }
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn enabled_names(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.name.clone())
            .collect()
    }

    /// Expand one raw target: URLs pass through, registry names expand to their pages,
    /// unknown names are treated as demo catalog names.
    pub fn resolve(&self, raw: &str) -> Result<Vec<ScrapeTarget>, BlankTarget> {
        let target = ScrapeTarget::parse(raw)?;
        let config = match &target {
            ScrapeTarget::Catalog(name) => self.get(name),
            ScrapeTarget::Live(_) => None,
        };
        let Some(config) = config else {
            return Ok(vec![target]);
        };
        if !config.enabled {
            warn!(scrape_target = %config.name, "skipping disabled scrape target");
            return Ok(Vec::new());
        }
        if config.urls.is_empty() {
            return Ok(vec![target]);
        }
        Ok(config
            .urls
            .iter()
            .filter_map(|url| ScrapeTarget::parse(url).ok())
            .collect())
    }

    /// Resolve a request; an empty request means every enabled registry target.
    pub fn resolve_all(&self, raw: &[String]) -> Result<Vec<ScrapeTarget>, BlankTarget> {
        let names = if raw.is_empty() {
            self.enabled_names()
        } else {
            raw.to_vec()
        };
        let mut out = Vec::new();
        for name in &names {
            for target in self.resolve(name)? {
                if !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        Ok(out)
    }
}
