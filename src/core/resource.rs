//! DK-005: The constructor path shared by every typed resource.
//!
//! Validation runs in a fixed order and stops at the first failure:
//! 1. logical name is non-empty
//! 2. logical name is not yet registered
//! 3. every provided argument field converts to a valid value
//! 4. parent/provider options name registered resources
//!
//! Nothing is registered unless all four pass.

use super::context::Context;
use super::error::{Error, Result};
use super::types::{ResourceDescriptor, ResourceOptions, TypeToken};
use super::value::{IntoPropertyValue, PropertyValue};
use indexmap::IndexMap;

/// A generated arguments struct for one resource type.
pub trait ResourceArgs {
    /// Type token recorded on every descriptor this args type produces.
    const TYPE_TOKEN: &'static str;

    /// Convert the provided fields into named inputs. Omitted fields are skipped.
    fn to_inputs(&self) -> Result<IndexMap<String, PropertyValue>>;
}

/// Builder used by [`ResourceArgs::to_inputs`] implementations.
#[derive(Debug, Default)]
pub struct Inputs {
    map: IndexMap<String, PropertyValue>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `name` if present. Conversion errors carry the field name.
    pub fn set<V: IntoPropertyValue>(mut self, name: &str, value: Option<V>) -> Result<Self> {
        if let Some(v) = value {
            let pv = v.into_property_value().map_err(|e| e.within(name))?;
            self.map.insert(name.to_string(), pv);
        }
        Ok(self)
    }

    pub fn finish(self) -> IndexMap<String, PropertyValue> {
        self.map
    }
}

/// Validate, build, and register a descriptor for `A`.
pub fn construct<A: ResourceArgs>(
    ctx: &mut Context,
    name: &str,
    args: &A,
    options: ResourceOptions,
) -> Result<ResourceDescriptor> {
    if name.is_empty() {
        return Err(Error::invalid("name", "logical name must not be empty"));
    }
    if ctx.registry().contains(name) {
        return Err(Error::DuplicateName(name.to_string()));
    }
    let type_token = TypeToken::parse(A::TYPE_TOKEN)?;
    let inputs = args.to_inputs()?;
    check_options(ctx, &options)?;

    let descriptor = ResourceDescriptor::new(name.to_string(), type_token, inputs, options);
    ctx.register(descriptor.clone())?;
    Ok(descriptor)
}

fn check_options(ctx: &Context, options: &ResourceOptions) -> Result<()> {
    if let Some(ref parent) = options.parent {
        if !ctx.registry().contains(parent) {
            return Err(Error::invalid(
                "parent",
                format!("parent '{}' is not registered", parent),
            ));
        }
    }
    if let Some(ref provider) = options.provider {
        match ctx.registry().get(provider) {
            None => {
                return Err(Error::invalid(
                    "provider",
                    format!("provider '{}' is not registered", provider),
                ))
            }
            Some(d) if !d.type_token().is_provider() => {
                return Err(Error::invalid(
                    "provider",
                    format!("'{}' is a {}, not a provider", provider, d.type_token()),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}
