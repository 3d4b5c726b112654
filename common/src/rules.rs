// Name-based heuristics for jobs the board has not seen before
//
// Both tables are ordered and evaluated top to bottom; the first matching
// pattern wins. Patterns are matched case-insensitively anywhere in the name.

use crate::config::RulesConfig;
use crate::errors::ValidationError;
use regex::{Regex, RegexBuilder};

/// A project label assigned to names matching `pattern`
#[derive(Debug, Clone)]
pub struct ProjectRule {
    pattern: Regex,
    project: String,
}

impl ProjectRule {
    pub fn new(pattern: &str, project: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            pattern: compile(pattern)?,
            project: project.into(),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}

/// Compiled project inference and auto-hide tables
#[derive(Debug, Clone)]
pub struct RuleSet {
    projects: Vec<ProjectRule>,
    default_project: String,
    auto_hide: Vec<Regex>,
}

impl RuleSet {
    /// Compile the configured tables, rejecting the first invalid pattern
    pub fn compile(config: &RulesConfig) -> Result<Self, ValidationError> {
        if config.default_project.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "rules.default_project".to_string(),
            ));
        }

        let projects = config
            .projects
            .iter()
            .map(|rule| ProjectRule::new(&rule.pattern, rule.project.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let auto_hide = config
            .auto_hide
            .iter()
            .map(|pattern| compile(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            project_rules = projects.len(),
            auto_hide_rules = auto_hide.len(),
            default_project = %config.default_project,
            "Compiled job rules"
        );

        Ok(Self {
            projects,
            default_project: config.default_project.clone(),
            auto_hide,
        })
    }

    /// The tables shipped with the board
    pub fn builtin() -> Result<Self, ValidationError> {
        Self::compile(&RulesConfig::default())
    }

    /// Project label for a new job: first matching rule, else the default
    pub fn infer_project(&self, name: &str) -> &str {
        self.projects
            .iter()
            .find(|rule| rule.matches(name))
            .map(ProjectRule::project)
            .unwrap_or(self.default_project.as_str())
    }

    /// Whether a new job starts out hidden
    pub fn should_auto_hide(&self, name: &str) -> bool {
        self.auto_hide.iter().any(|pattern| pattern.is_match(name))
    }

    pub fn default_project(&self) -> &str {
        &self.default_project
    }
}

fn compile(pattern: &str) -> Result<Regex, ValidationError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ValidationError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
