// crates/dcp-cli/src/config.rs
//
// Tool configuration, loaded from a TOML file or populated with defaults.
// Retry policy lives in the `[http]` table; nothing is read from the
// environment except `RUST_LOG`.

use serde::Deserialize;
use std::fs;

use dcp_http::HttpConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    /// Log level when `RUST_LOG` is unset: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory all artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Parallel file-reference uploads during submission.
    #[serde(default = "default_file_ref_concurrency")]
    pub file_ref_concurrency: usize,

    #[serde(default)]
    pub http: HttpConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_file_ref_concurrency() -> usize {
    4
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: default_output_dir(),
            file_ref_concurrency: default_file_ref_concurrency(),
            http: HttpConfig::default(),
        }
    }
}

/// Values given on the command line; `None` keeps the file's value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub record: bool,
    pub record_directory: Option<String>,
    pub retry_timeout_seconds: Option<u64>,
    pub retry_max_attempts: Option<u32>,
    pub output_dir: Option<String>,
}

impl ToolsConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: ToolsConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if overrides.record {
            self.http.record = true;
        }
        if let Some(dir) = &overrides.record_directory {
            self.http.record_directory = dir.clone();
        }
        if let Some(secs) = overrides.retry_timeout_seconds {
            self.http.retry_timeout_seconds = secs;
        }
        if let Some(attempts) = overrides.retry_max_attempts {
            self.http.retry_max_attempts = attempts;
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ToolsConfig = toml::from_str(
            r#"
            log_level = "debug"

            [http]
            retry_max_attempts = 5
            record = true
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.file_ref_concurrency, 4);
        assert_eq!(config.http.retry_max_attempts, 5);
        assert!(config.http.record);
        assert_eq!(config.http.retry_timeout_seconds, 7200);
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("dcp_missing_{}.toml", uuid::Uuid::new_v4()));
        assert!(ToolsConfig::load(&path.to_string_lossy()).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("dcp_config_{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "output_dir = \"/tmp/out\"\nfile_ref_concurrency = 8\n").unwrap();
        let config = ToolsConfig::load(&path.to_string_lossy()).unwrap();
        assert_eq!(config.output_dir, "/tmp/out");
        assert_eq!(config.file_ref_concurrency, 8);
        assert_eq!(config.http, HttpConfig::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn flags_override_file_values() {
        let mut config: ToolsConfig = toml::from_str(
            "output_dir = \"file_out\"\n[http]\nretry_max_attempts = 5\nretry_timeout_seconds = 30\n",
        )
        .unwrap();
        config.apply(&Overrides {
            record: true,
            record_directory: Some("recordings".to_string()),
            retry_max_attempts: Some(2),
            ..Overrides::default()
        });
        assert!(config.http.record);
        assert_eq!(config.http.record_directory, "recordings");
        assert_eq!(config.http.retry_max_attempts, 2);
        assert_eq!(config.http.retry_timeout_seconds, 30);
        assert_eq!(config.output_dir, "file_out");
    }
}
