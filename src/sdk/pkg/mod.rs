//! DK-006: The `pkg` package: `Thing` and its `Provider`.

pub mod module;

use super::Resource;
use crate::core::context::Context;
use crate::core::error::Result;
use crate::core::resource::{construct, Inputs, ResourceArgs};
use crate::core::types::{ResourceDescriptor, ResourceOptions};
use crate::core::value::{PropertyValue, StringMap};
use indexmap::IndexMap;

// ============================================================================
// Thing
// ============================================================================

/// Arguments for [`Thing`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThingArgs {
    pub idea: Option<String>,
}

impl ThingArgs {
    pub fn idea(mut self, idea: impl Into<String>) -> Self {
        self.idea = Some(idea.into());
        self
    }
}

impl ResourceArgs for ThingArgs {
    const TYPE_TOKEN: &'static str = "pkg:index:Thing";

    fn to_inputs(&self) -> Result<IndexMap<String, PropertyValue>> {
        Ok(Inputs::new().set("idea", self.idea.as_deref())?.finish())
    }
}

#[derive(Debug, Clone)]
pub struct Thing {
    descriptor: ResourceDescriptor,
}

impl Thing {
    pub fn new(ctx: &mut Context, name: &str, args: ThingArgs) -> Result<Self> {
        Self::new_with_options(ctx, name, args, ResourceOptions::default())
    }

    pub fn new_with_options(
        ctx: &mut Context,
        name: &str,
        args: ThingArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let descriptor = construct(ctx, name, &args, options)?;
        Ok(Self { descriptor })
    }

    pub fn idea(&self) -> Option<&str> {
        self.descriptor.input("idea").and_then(PropertyValue::as_str)
    }
}

impl Resource for Thing {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Arguments for [`Provider`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderArgs {
    pub object_prop: Option<StringMap>,
}

impl ProviderArgs {
    pub fn object_prop(mut self, props: StringMap) -> Self {
        self.object_prop = Some(props);
        self
    }
}

impl ResourceArgs for ProviderArgs {
    const TYPE_TOKEN: &'static str = "pulumi:providers:pkg";

    fn to_inputs(&self) -> Result<IndexMap<String, PropertyValue>> {
        Ok(Inputs::new()
            .set("objectProp", self.object_prop.clone())?
            .finish())
    }
}

/// The `pkg` provider resource.
#[derive(Debug, Clone)]
pub struct Provider {
    descriptor: ResourceDescriptor,
}

impl Provider {
    pub fn new(ctx: &mut Context, name: &str, args: ProviderArgs) -> Result<Self> {
        Self::new_with_options(ctx, name, args, ResourceOptions::default())
    }

    pub fn new_with_options(
        ctx: &mut Context,
        name: &str,
        args: ProviderArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let descriptor = construct(ctx, name, &args, options)?;
        Ok(Self { descriptor })
    }

    /// Value for `key` in `objectProp`, if set.
    pub fn object_prop(&self, key: &str) -> Option<&str> {
        self.descriptor
            .input("objectProp")
            .and_then(PropertyValue::as_map)
            .and_then(|m| m.get(key))
            .and_then(PropertyValue::as_str)
    }
}

impl Resource for Provider {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }
}
