//! DK-008: Project file parsing, validation, and run configuration.
//!
//! Parses declkit.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - Project name must not be empty
//! - Stack name must be a single path component (non-empty, no separators,
//!   not `.` or `..`)
//! - Config keys must not be empty

use super::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the stack name.
pub const STACK_ENV: &str = "DECLKIT_STACK";

/// Root of declkit.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Project name
    pub project: String,

    /// Stack name
    #[serde(default = "default_stack")]
    pub stack: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Project configuration values (e.g. `pkg:region`)
    #[serde(default)]
    pub config: IndexMap<String, String>,
}

fn default_stack() -> String {
    "dev".to_string()
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn stack_name_problem(stack: &str) -> Option<&'static str> {
    if stack.trim().is_empty() {
        Some("stack must not be empty")
    } else if stack == "." || stack == ".." {
        Some("stack must not be \".\" or \"..\"")
    } else if stack.contains(['/', '\\', '\0']) {
        Some("stack must not contain path separators")
    } else {
        None
    }
}

/// Check a stack name before it is joined under a state directory.
pub fn check_stack_name(stack: &str) -> Result<()> {
    match stack_name_problem(stack) {
        Some(problem) => Err(Error::Config(format!("{}, got \"{}\"", problem, stack))),
        None => Ok(()),
    }
}

/// Run-scoped configuration carried by the execution context.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub project: String,
    pub stack: String,
    pub config: IndexMap<String, String>,
    /// Declare only; never persist a snapshot
    pub dry_run: bool,
    /// Where snapshots and event logs go, if anywhere
    pub state_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            project: "declkit".to_string(),
            stack: default_stack(),
            config: IndexMap::new(),
            dry_run: false,
            state_dir: None,
        }
    }
}

impl RunConfig {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            ..Self::default()
        }
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Build from a validated project file.
    pub fn from_project(project: &ProjectConfig) -> Self {
        Self {
            project: project.project.clone(),
            stack: project.stack.clone(),
            config: project.config.clone(),
            ..Self::default()
        }
    }
}

/// Parse a declkit.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    parse_config(&content)
}

/// Parse a declkit.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<ProjectConfig> {
    serde_yaml_ng::from_str(yaml).map_err(|e| Error::Config(format!("YAML parse error: {}", e)))
}

/// Validate a parsed project file. Returns a list of errors (empty = valid).
pub fn validate_config(config: &ProjectConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", config.version),
        });
    }

    if config.project.is_empty() {
        errors.push(ValidationError {
            message: "project must not be empty".to_string(),
        });
    }

    if let Some(problem) = stack_name_problem(&config.stack) {
        errors.push(ValidationError {
            message: problem.to_string(),
        });
    }

    for key in config.config.keys() {
        if key.trim().is_empty() {
            errors.push(ValidationError {
                message: "config keys must not be empty".to_string(),
            });
        }
    }

    errors
}

/// Parse, validate, and apply the stack override. A missing file yields defaults.
pub fn load_run_config(path: &Path, stack_override: Option<&str>) -> Result<RunConfig> {
    let mut run = if path.exists() {
        let project = parse_config_file(path)?;
        let errors = validate_config(&project);
        if !errors.is_empty() {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(Error::Config(joined.join("; ")));
        }
        RunConfig::from_project(&project)
    } else {
        tracing::debug!(path = %path.display(), "no project file, using defaults");
        RunConfig::default()
    };
    if let Some(stack) = stack_override {
        check_stack_name(stack)?;
        run.stack = stack.to_string();
    }
    Ok(run)
}
