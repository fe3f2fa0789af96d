//! DK-011: Registry snapshots: load, atomic save, path derivation.
//!
//! A snapshot is the declared intent of the last successful run, handed to
//! whatever provisions it. Failed runs never write one.

use super::config::check_stack_name;
use super::error::{Error, Result};
use super::registry::Registry;
use super::types::TypeToken;
use super::value::PropertyValue;
use crate::tripwire::eventlog::now_iso8601;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serialised form of a successful run's registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Schema version
    pub schema: String,

    pub project: String,

    pub stack: String,

    /// Run that produced this snapshot
    pub run_id: String,

    /// When the snapshot was generated
    pub generated_at: String,

    /// Generator version
    pub generator: String,

    /// Registry fingerprint
    pub fingerprint: String,

    /// Declarations in order
    pub resources: IndexMap<String, SnapshotEntry>,
}

/// One declaration in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(rename = "type")]
    pub type_token: TypeToken,

    pub hash: String,

    #[serde(default)]
    pub inputs: IndexMap<String, PropertyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Build a snapshot from a registry.
pub fn snapshot(registry: &Registry, project: &str, stack: &str, run_id: &str) -> RegistrySnapshot {
    let resources = registry
        .iter()
        .map(|d| {
            (
                d.name().to_string(),
                SnapshotEntry {
                    type_token: d.type_token().clone(),
                    hash: d.hash(),
                    inputs: d.inputs().clone(),
                    parent: d.options().parent.clone(),
                    provider: d.options().provider.clone(),
                },
            )
        })
        .collect();
    RegistrySnapshot {
        schema: "1.0".to_string(),
        project: project.to_string(),
        stack: stack.to_string(),
        run_id: run_id.to_string(),
        generated_at: now_iso8601(),
        generator: format!("declkit {}", env!("CARGO_PKG_VERSION")),
        fingerprint: registry.fingerprint(),
        resources,
    }
}

/// Derive the snapshot path for a stack within the state directory.
pub fn snapshot_path(state_dir: &Path, stack: &str) -> PathBuf {
    state_dir.join(stack).join("registry.yaml")
}

/// Load a stack's snapshot. Returns None if the file doesn't exist.
pub fn load_snapshot(state_dir: &Path, stack: &str) -> Result<Option<RegistrySnapshot>> {
    let path = snapshot_path(state_dir, stack);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::State(format!("cannot read {}: {}", path.display(), e)))?;
    let snap: RegistrySnapshot = serde_yaml_ng::from_str(&content)
        .map_err(|e| Error::State(format!("invalid snapshot {}: {}", path.display(), e)))?;
    Ok(Some(snap))
}

/// Save a snapshot atomically (write to temp, then rename).
pub fn save_snapshot(state_dir: &Path, snap: &RegistrySnapshot) -> Result<()> {
    check_stack_name(&snap.stack)?;
    let path = snapshot_path(state_dir, &snap.stack);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::State(format!("cannot create dir {}: {}", parent.display(), e)))?;
    }

    let yaml = serde_yaml_ng::to_string(snap)
        .map_err(|e| Error::State(format!("serialize error: {}", e)))?;

    let tmp_path = path.with_extension("yaml.tmp");
    std::fs::write(&tmp_path, &yaml)
        .map_err(|e| Error::State(format!("cannot write {}: {}", tmp_path.display(), e)))?;
    std::fs::rename(&tmp_path, &path).map_err(|e| {
        Error::State(format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RunConfig;
    use crate::core::context::Context;
    use crate::sdk::pkg::{module, Provider, ProviderArgs, Thing, ThingArgs};
    use crate::core::value::StringMap;

    fn make_registry() -> Registry {
        let mut ctx = Context::new(RunConfig::default(), "r-1");
        Thing::new(&mut ctx, "zeta", ThingArgs::default().idea("z")).unwrap();
        module::Object::new(&mut ctx, "alpha", module::ObjectArgs::default().answer(1.0)).unwrap();
        Provider::new(
            &mut ctx,
            "prov",
            ProviderArgs::default().object_prop(StringMap::from([("k", "v")])),
        )
        .unwrap();
        ctx.registry().clone()
    }

    #[test]
    fn test_dk011_snapshot_path() {
        let p = snapshot_path(Path::new("/state"), "dev");
        assert_eq!(p, PathBuf::from("/state/dev/registry.yaml"));
    }

    #[test]
    fn test_dk011_save_and_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = make_registry();
        let snap = snapshot(&registry, "proj", "dev", "r-1");
        save_snapshot(dir.path(), &snap).unwrap();

        let loaded = load_snapshot(dir.path(), "dev").unwrap().unwrap();
        let keys: Vec<_> = loaded.resources.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "prov"]);
        assert_eq!(loaded.fingerprint, registry.fingerprint());
        assert_eq!(loaded.resources["alpha"], snap.resources["alpha"]);
        assert_eq!(
            loaded.resources["prov"].inputs["objectProp"].as_map().unwrap()["k"].as_str(),
            Some("v")
        );
    }

    #[test]
    fn test_dk011_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let snap = snapshot(&make_registry(), "proj", "dev", "r-1");
        save_snapshot(dir.path(), &snap).unwrap();

        assert!(!dir.path().join("dev").join("registry.yaml.tmp").exists());
        assert!(snapshot_path(dir.path(), "dev").exists());
    }

    #[test]
    fn test_dk011_save_rejects_escaping_stack() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let snap = snapshot(&make_registry(), "proj", "../escaped", "r-1");
        assert!(matches!(
            save_snapshot(&state_dir, &snap),
            Err(Error::Config(_))
        ));
        assert!(!dir.path().join("escaped").exists());
    }

    #[test]
    fn test_dk011_load_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(dir.path(), "ghost").unwrap().is_none());
    }

    #[test]
    fn test_dk011_load_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(dir.path(), "dev");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "schema: [").unwrap();
        assert!(matches!(load_snapshot(dir.path(), "dev"), Err(Error::State(_))));
    }

    #[test]
    fn test_dk011_snapshot_metadata() {
        let snap = snapshot(&Registry::new(), "proj", "prod", "r-9");
        assert_eq!(snap.schema, "1.0");
        assert_eq!(snap.stack, "prod");
        assert_eq!(snap.run_id, "r-9");
        assert!(snap.generator.starts_with("declkit "));
        assert!(snap.resources.is_empty());
    }
}
