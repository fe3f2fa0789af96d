//! DK-014: CLI subcommands (init, validate, run, status).

use crate::core::config::{self, STACK_ENV};
use crate::core::driver::{self, RunOutcome};
use crate::core::error::{Error, Result};
use crate::core::registry::Registry;
use crate::core::state;
use crate::program;
use clap::{Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Output format for `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Yaml,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new declkit project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate declkit.yaml
    Validate {
        /// Path to declkit.yaml
        #[arg(short, long, default_value = "declkit.yaml")]
        file: PathBuf,
    },

    /// Run the third-party-package program and print its declarations
    Run {
        /// Path to declkit.yaml (defaults apply if missing)
        #[arg(short, long, default_value = "declkit.yaml")]
        file: PathBuf,

        /// Stack name override
        #[arg(long, env = STACK_ENV)]
        stack: Option<String>,

        /// State directory for snapshots and event logs
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Declare only; write nothing to the state directory
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the last snapshot saved for a stack
    Status {
        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,

        /// Stack name
        #[arg(long, env = STACK_ENV, default_value = "dev")]
        stack: String,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Run {
            file,
            stack,
            state_dir,
            dry_run,
            format,
        } => cmd_run(&file, stack.as_deref(), state_dir, dry_run, format),
        Commands::Status { state_dir, stack } => cmd_status(&state_dir, &stack),
    }
}

fn cmd_init(path: &Path) -> Result<()> {
    let config_path = path.join("declkit.yaml");
    if config_path.exists() {
        return Err(Error::Config(format!(
            "{} already exists",
            config_path.display()
        )));
    }
    std::fs::create_dir_all(path)
        .map_err(|e| Error::Config(format!("cannot create {}: {}", path.display(), e)))?;

    let template = r#"version: "1.0"
project: my-project
stack: dev
description: "Managed by declkit"

config: {}
"#;
    std::fs::write(&config_path, template)
        .map_err(|e| Error::Config(format!("cannot write {}: {}", config_path.display(), e)))?;

    println!("Initialized declkit project at {}", path.display());
    println!("  Created: {}", config_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let project = config::parse_config_file(file)?;
    let errors = config::validate_config(&project);

    if errors.is_empty() {
        println!(
            "OK: {} (stack {}, {} config values)",
            project.project,
            project.stack,
            project.config.len()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(Error::Config(format!("{} validation error(s)", errors.len())))
    }
}

fn cmd_run(
    file: &Path,
    stack: Option<&str>,
    state_dir: Option<PathBuf>,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut run_config = config::load_run_config(file, stack)?;
    run_config.state_dir = state_dir;
    run_config.dry_run = dry_run;
    let project = run_config.project.clone();
    let stack = run_config.stack.clone();

    match driver::run(run_config, program::third_party_package) {
        RunOutcome::Succeeded(registry) => print_registry(&registry, &project, &stack, format),
        RunOutcome::Failed(e) => Err(e),
    }
}

/// Render a registry in the requested format.
pub fn render_registry(
    registry: &Registry,
    project: &str,
    stack: &str,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "Declared: {}/{} ({} resources)\n\n",
                project,
                stack,
                registry.len()
            );
            for d in registry {
                out.push_str(&format!("  + {} [{}]\n", d.name(), d.type_token()));
                for (key, value) in d.inputs() {
                    out.push_str(&format!("      {}: {}\n", key, value));
                }
            }
            out.push_str(&format!("\nFingerprint: {}\n", registry.fingerprint()));
            Ok(out)
        }
        OutputFormat::Yaml => {
            let snap = state::snapshot(registry, project, stack, "-");
            serde_yaml_ng::to_string(&snap)
                .map_err(|e| Error::State(format!("serialize error: {}", e)))
        }
        OutputFormat::Json => {
            let snap = state::snapshot(registry, project, stack, "-");
            serde_json::to_string_pretty(&snap)
                .map_err(|e| Error::State(format!("serialize error: {}", e)))
        }
    }
}

fn print_registry(registry: &Registry, project: &str, stack: &str, format: OutputFormat) -> Result<()> {
    let out = render_registry(registry, project, stack, format)?;
    print!("{}", out);
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn cmd_status(state_dir: &Path, stack: &str) -> Result<()> {
    config::check_stack_name(stack)?;
    let snap = state::load_snapshot(state_dir, stack)?.ok_or_else(|| {
        Error::State(format!(
            "no snapshot for stack '{}' in {}",
            stack,
            state_dir.display()
        ))
    })?;

    println!("Stack: {}/{}", snap.project, snap.stack);
    println!("  Run:         {}", snap.run_id);
    println!("  Generated:   {}", snap.generated_at);
    println!("  Generator:   {}", snap.generator);
    println!("  Fingerprint: {}", snap.fingerprint);
    println!("  Resources:   {}", snap.resources.len());
    for (name, entry) in &snap.resources {
        println!("    {}: [{}] {}", name, entry.type_token, entry.hash);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RunConfig;

    fn reference_registry() -> Registry {
        driver::run(RunConfig::default(), program::third_party_package)
            .into_result()
            .unwrap()
    }

    #[test]
    fn test_dk014_init_creates_config() {
        let dir = tempfile::tempdir().unwrap();
        cmd_init(dir.path()).unwrap();
        let project = config::parse_config_file(&dir.path().join("declkit.yaml")).unwrap();
        assert!(config::validate_config(&project).is_empty());
        assert!(cmd_init(dir.path()).is_err());
    }

    #[test]
    fn test_dk014_validate_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("declkit.yaml");
        std::fs::write(&file, "version: \"0.9\"\nproject: p\n").unwrap();
        assert!(cmd_validate(&file).is_err());
        std::fs::write(&file, "version: \"1.0\"\nproject: p\n").unwrap();
        assert!(cmd_validate(&file).is_ok());
    }

    #[test]
    fn test_dk014_render_text() {
        let out = render_registry(&reference_registry(), "p", "dev", OutputFormat::Text).unwrap();
        assert!(out.contains("(4 resources)"));
        assert!(out.contains("+ Other [pkg:index:Thing]"));
        assert!(out.contains("answer: 42"));
        assert!(out.contains(r#"objectProp: {prop1: "foo", prop2: "bar", prop3: "fizz"}"#));
    }

    #[test]
    fn test_dk014_render_json() {
        let out = render_registry(&reference_registry(), "p", "dev", OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["resources"]["Question2"]["inputs"]["answer"], 24.0);
        assert_eq!(v["resources"]["Provider"]["type"], "pulumi:providers:pkg");
    }

    #[test]
    fn test_dk014_run_then_status() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        cmd_run(
            &dir.path().join("missing.yaml"),
            Some("ci"),
            Some(state_dir.clone()),
            false,
            OutputFormat::Text,
        )
        .unwrap();
        assert!(state::snapshot_path(&state_dir, "ci").exists());
        cmd_status(&state_dir, "ci").unwrap();
        assert!(cmd_status(&state_dir, "other").is_err());
        assert!(matches!(cmd_status(&state_dir, ".."), Err(Error::Config(_))));
    }
}
