use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::pipeline::DuplicatePolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Annotate,
            workers: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub max_records_per_file: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            max_records_per_file: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load `config_path`, falling back to defaults when the file does not exist,
    /// then apply `PROPINSIGHT_*` environment overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(config_path).map_err(|e| {
                PipelineError::Config(format!("Failed to read config file '{}': {}", config_path.display(), e))
            })?;
            toml::from_str(&config_content)?
        } else {
            Config::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = var("PROPINSIGHT_OUTPUT_DIR") {
            self.output.dir = dir;
        }
        if let Some(workers) = var("PROPINSIGHT_WORKERS") {
            self.pipeline.workers = workers
                .parse()
                .map_err(|_| PipelineError::Config(format!("PROPINSIGHT_WORKERS must be a number, got '{}'", workers)))?;
        }
        if let Some(policy) = var("PROPINSIGHT_DUPLICATE_POLICY") {
            self.pipeline.duplicate_policy = match policy.to_lowercase().as_str() {
                "annotate" => DuplicatePolicy::Annotate,
                "exclude" => DuplicatePolicy::Exclude,
                other => {
                    return Err(PipelineError::Config(format!(
                        "PROPINSIGHT_DUPLICATE_POLICY must be 'annotate' or 'exclude', got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }
}
