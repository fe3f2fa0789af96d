//! DK-004: Execution context, the handle threaded through one run.

use super::config::RunConfig;
use super::error::{Error, Result};
use super::registry::Registry;
use super::types::{ResourceDescriptor, RunEvent};

/// Owns the declaration registry and run configuration for a single run.
///
/// Passed explicitly as `&mut Context`; there is no ambient instance.
#[derive(Debug)]
pub struct Context {
    run_id: String,
    config: RunConfig,
    registry: Registry,
    events: Vec<RunEvent>,
}

impl Context {
    pub fn new(config: RunConfig, run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            config,
            registry: Registry::new(),
            events: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn project(&self) -> &str {
        &self.config.project
    }

    pub fn stack(&self) -> &str {
        &self.config.stack
    }

    pub fn dry_run(&self) -> bool {
        self.config.dry_run
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.config.get(key).map(String::as_str)
    }

    pub fn require_config(&self, key: &str) -> Result<&str> {
        self.config_value(key)
            .ok_or_else(|| Error::MissingConfig(key.to_string()))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Append a descriptor to the registry and queue its provenance event.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> Result<()> {
        let resource = descriptor.name().to_string();
        let type_token = descriptor.type_token().to_string();
        let hash = descriptor.hash();
        self.registry.insert(descriptor)?;
        tracing::debug!(%resource, %type_token, "registered resource");
        let run_id = self.run_id.clone();
        self.log_event(RunEvent::ResourceRegistered {
            run_id,
            resource,
            type_token,
            hash,
        });
        Ok(())
    }

    /// Queue a provenance event. Lifecycle events are the driver's to write.
    pub(crate) fn log_event(&mut self, event: RunEvent) {
        self.events.push(event);
    }

    pub(crate) fn into_parts(self) -> (Registry, Vec<RunEvent>) {
        (self.registry, self.events)
    }
}
