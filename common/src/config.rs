// Configuration management with layered configuration (defaults, file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsConfig,
    pub rules: RulesConfig,
    pub observability: ObservabilityConfig,
}

/// Locations of the scheduler's job list and the board document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub jobs_file: PathBuf,
    pub tasks_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            jobs_file: PathBuf::from("cron/jobs.json"),
            tasks_file: PathBuf::from("data/tasks.json"),
        }
    }
}

/// One project inference rule: case-insensitive regex and the label it assigns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRuleConfig {
    pub pattern: String,
    pub project: String,
}

impl ProjectRuleConfig {
    fn new(pattern: &str, project: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            project: project.to_string(),
        }
    }
}

/// Heuristics applied to jobs the board has not seen before
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub default_project: String,
    pub projects: Vec<ProjectRuleConfig>,
    pub auto_hide: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            default_project: "openclaw".to_string(),
            projects: vec![
                ProjectRuleConfig::new("task worker", "crab-tasks"),
                ProjectRuleConfig::new("feature ideas", "crab-tasks"),
                ProjectRuleConfig::new("weekly summary", "crab-tasks"),
                ProjectRuleConfig::new("price update|finance", "crab-tasks"),
                ProjectRuleConfig::new("digest", "openclaw"),
                ProjectRuleConfig::new("update check", "openclaw"),
                ProjectRuleConfig::new("backup", "openclaw"),
                ProjectRuleConfig::new("learning", "personal"),
                ProjectRuleConfig::new("финплан|финансов", "personal"),
                ProjectRuleConfig::new("o-?1|виза", "personal"),
            ],
            auto_hide: vec!["backup".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.paths.jobs_file.as_os_str().is_empty() {
            return Err("Jobs file path cannot be empty".to_string());
        }
        if self.paths.tasks_file.as_os_str().is_empty() {
            return Err("Tasks file path cannot be empty".to_string());
        }

        if self.rules.default_project.trim().is_empty() {
            return Err("Default project cannot be empty".to_string());
        }
        if let Some(rule) = self.rules.projects.iter().find(|r| r.pattern.is_empty()) {
            return Err(format!(
                "Project rule for '{}' has an empty pattern",
                rule.project
            ));
        }
        if self.rules.projects.iter().any(|r| r.project.trim().is_empty()) {
            return Err("Project rule labels cannot be empty".to_string());
        }
        if self.rules.auto_hide.iter().any(|p| p.is_empty()) {
            return Err("Auto-hide patterns cannot be empty".to_string());
        }

        if self.observability.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_tasks_path() {
        let mut settings = Settings::default();
        settings.paths.tasks_file = PathBuf::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_empty_default_project() {
        let mut settings = Settings::default();
        settings.rules.default_project = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_empty_pattern() {
        let mut settings = Settings::default();
        settings
            .rules
            .projects
            .push(ProjectRuleConfig::new("", "misc"));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_config_dir_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load_from_path(dir.path().join("absent")).unwrap();
        assert_eq!(settings.rules.default_project, "openclaw");
        assert_eq!(settings.rules.projects.len(), 10);
        assert_eq!(settings.paths.tasks_file, PathBuf::from("data/tasks.json"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[observability]\nlog_level = \"debug\"\njson_logs = false\n",
        )
        .unwrap();

        std::env::set_var("APP__OBSERVABILITY__JSON_LOGS", "true");
        std::env::set_var("APP__PATHS__JOBS_FILE", "/srv/scheduler/jobs.json");
        let loaded = Settings::load_from_path(dir.path());
        std::env::remove_var("APP__OBSERVABILITY__JSON_LOGS");
        std::env::remove_var("APP__PATHS__JOBS_FILE");

        let settings = loaded.unwrap();
        assert!(settings.observability.json_logs);
        assert_eq!(settings.observability.log_level, "debug");
        assert_eq!(
            settings.paths.jobs_file,
            PathBuf::from("/srv/scheduler/jobs.json")
        );
        assert_eq!(settings.paths.tasks_file, PathBuf::from("data/tasks.json"));
    }
}
