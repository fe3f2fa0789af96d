//! The `pkg:module` namespace.

use crate::core::context::Context;
use crate::core::error::Result;
use crate::core::resource::{construct, Inputs, ResourceArgs};
use crate::core::types::{ResourceDescriptor, ResourceOptions};
use crate::core::value::PropertyValue;
use crate::sdk::Resource;
use indexmap::IndexMap;

/// Arguments for [`Object`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectArgs {
    pub answer: Option<f64>,
}

impl ObjectArgs {
    pub fn answer(mut self, answer: f64) -> Self {
        self.answer = Some(answer);
        self
    }
}

impl ResourceArgs for ObjectArgs {
    const TYPE_TOKEN: &'static str = "pkg:module:Object";

    fn to_inputs(&self) -> Result<IndexMap<String, PropertyValue>> {
        Ok(Inputs::new().set("answer", self.answer)?.finish())
    }
}

#[derive(Debug, Clone)]
pub struct Object {
    descriptor: ResourceDescriptor,
}

impl Object {
    pub fn new(ctx: &mut Context, name: &str, args: ObjectArgs) -> Result<Self> {
        Self::new_with_options(ctx, name, args, ResourceOptions::default())
    }

    pub fn new_with_options(
        ctx: &mut Context,
        name: &str,
        args: ObjectArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let descriptor = construct(ctx, name, &args, options)?;
        Ok(Self { descriptor })
    }

    pub fn answer(&self) -> Option<f64> {
        self.descriptor
            .input("answer")
            .and_then(PropertyValue::as_number)
    }
}

impl Resource for Object {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }
}
