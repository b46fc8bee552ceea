//! Configuration file loading for mendloop.
//!
//! Discovers and loads `mendloop.toml` from the target directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use mendloop_core::settings::RunSettings;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "mendloop.toml";

/// Artifact extension collected when neither config nor CLI names one.
pub const DEFAULT_EXT: &str = "py";

/// Top-level configuration from mendloop.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MendloopConfig {
    /// Run settings (retry budget, throttle delay, artifact extension).
    pub run: RunSection,

    /// Stage collaborator commands.
    pub stages: StagesSection,
}

/// `[run]` section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Maximum (fix, verify) rounds per artifact.
    pub max_rounds: Option<u32>,

    /// Delay in seconds between external requests.
    pub delay_secs: Option<u64>,

    /// Extension of the files collected from the target directory.
    pub ext: Option<String>,
}

/// `[stages]` section of the config. Each command is a word list; the
/// artifact path is appended as the final argument at invocation time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StagesSection {
    pub audit: Vec<String>,
    pub fix: Vec<String>,
    pub verify: Vec<String>,
}

/// Discover the mendloop.toml config file.
///
/// Searches the target directory only. Returns `None` if not found.
pub fn discover_config(target: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = target.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a mendloop.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<MendloopConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<MendloopConfig> {
    let config: MendloopConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the target directory, or return default if not found.
pub fn load_or_default(target: &Utf8Path) -> anyhow::Result<MendloopConfig> {
    match discover_config(target) {
        Some(path) => load_config(&path),
        None => Ok(MendloopConfig::default()),
    }
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    /// Effective retry budget per artifact.
    pub max_rounds: u32,

    /// Effective throttle delay.
    pub delay: Duration,

    /// Effective artifact extension.
    pub ext: String,

    /// Audit command words (empty when unconfigured).
    pub audit: Vec<String>,

    /// Fix command words (empty when unconfigured).
    pub fix: Vec<String>,

    /// Verify command words (empty when unconfigured).
    pub verify: Vec<String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: MendloopConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: MendloopConfig) -> Self {
        Self { config }
    }

    /// Merge with CLI arguments. Every CLI value, when present, replaces
    /// the config file value; command strings are split on whitespace.
    pub fn merge_args(
        self,
        max_rounds: Option<u32>,
        delay_secs: Option<u64>,
        ext: Option<&str>,
        audit_cmd: Option<&str>,
        fix_cmd: Option<&str>,
        verify_cmd: Option<&str>,
    ) -> MergedConfig {
        let defaults = RunSettings::default();
        MergedConfig {
            max_rounds: max_rounds
                .or(self.config.run.max_rounds)
                .unwrap_or(defaults.max_rounds),
            delay: Duration::from_secs(
                delay_secs
                    .or(self.config.run.delay_secs)
                    .unwrap_or(defaults.delay.as_secs()),
            ),
            ext: ext
                .map(str::to_string)
                .or(self.config.run.ext)
                .unwrap_or_else(|| DEFAULT_EXT.to_string()),
            audit: override_command(audit_cmd, self.config.stages.audit),
            fix: override_command(fix_cmd, self.config.stages.fix),
            verify: override_command(verify_cmd, self.config.stages.verify),
        }
    }
}

fn override_command(cli: Option<&str>, file: Vec<String>) -> Vec<String> {
    match cli {
        Some(cmd) => cmd.split_whitespace().map(str::to_string).collect(),
        None => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[run]
max_rounds = 5
delay_secs = 2
ext = "rs"

[stages]
audit = ["pylint", "--errors-only"]
fix = ["my-fixer", "--in-place"]
verify = ["pytest", "-q"]
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.run.max_rounds, Some(5));
        assert_eq!(config.run.delay_secs, Some(2));
        assert_eq!(config.run.ext.as_deref(), Some("rs"));
        assert_eq!(config.stages.audit, vec!["pylint", "--errors-only"]);
        assert_eq!(config.stages.verify, vec!["pytest", "-q"]);
    }

    #[test]
    fn test_parse_minimal_config() {
        let contents = r#"
[stages]
verify = ["pytest"]
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.stages.verify, vec!["pytest"]);
        assert!(config.stages.audit.is_empty());
        assert!(config.run.max_rounds.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.stages.audit.is_empty());
        assert!(config.run.ext.is_none());
    }

    #[test]
    fn test_merge_defaults_when_nothing_configured() {
        let merged = ConfigMerger::new(MendloopConfig::default())
            .merge_args(None, None, None, None, None, None);

        assert_eq!(merged.max_rounds, 3);
        assert_eq!(merged.delay, Duration::from_secs(10));
        assert_eq!(merged.ext, DEFAULT_EXT);
        assert!(merged.audit.is_empty());
    }

    #[test]
    fn test_merge_cli_overrides_config() {
        let config = parse_config(
            r#"
[run]
max_rounds = 5
delay_secs = 2
ext = "rs"

[stages]
audit = ["from-config"]
"#,
        )
        .unwrap();

        let merged = ConfigMerger::new(config).merge_args(
            Some(1),
            Some(0),
            Some("py"),
            Some("pylint --errors-only"),
            None,
            None,
        );

        assert_eq!(merged.max_rounds, 1);
        assert_eq!(merged.delay, Duration::ZERO);
        assert_eq!(merged.ext, "py");
        assert_eq!(merged.audit, vec!["pylint", "--errors-only"]);
    }

    #[test]
    fn test_merge_config_used_when_cli_absent() {
        let config = parse_config(
            r#"
[run]
max_rounds = 7

[stages]
verify = ["pytest", "-q"]
"#,
        )
        .unwrap();

        let merged = ConfigMerger::new(config).merge_args(None, None, None, None, None, None);
        assert_eq!(merged.max_rounds, 7);
        assert_eq!(merged.verify, vec!["pytest", "-q"]);
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(&root).expect("load default");
        assert!(cfg.stages.verify.is_empty());
        assert!(cfg.run.delay_secs.is_none());
    }
}
