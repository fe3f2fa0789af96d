//! DK-003: Declaration registry. Ordered, name-keyed descriptors for one run.

use super::error::{Error, Result};
use super::types::ResourceDescriptor;
use crate::tripwire::hasher;
use indexmap::IndexMap;

/// Declarations in insertion order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    resources: IndexMap<String, ResourceDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor. Fails without modifying the registry if the name is taken.
    pub(crate) fn insert(&mut self, descriptor: ResourceDescriptor) -> Result<()> {
        if self.resources.contains_key(descriptor.name()) {
            return Err(Error::DuplicateName(descriptor.name().to_string()));
        }
        self.resources
            .insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    /// Composite hash of every descriptor hash, in order.
    pub fn fingerprint(&self) -> String {
        let hashes: Vec<String> = self.iter().map(ResourceDescriptor::hash).collect();
        let refs: Vec<&str> = hashes.iter().map(String::as_str).collect();
        hasher::composite_hash(&refs)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ResourceDescriptor;
    type IntoIter = indexmap::map::Values<'a, String, ResourceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.values()
    }
}
