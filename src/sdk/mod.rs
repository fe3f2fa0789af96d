//! Generated provider SDK surface.
//!
//! Each resource type pairs an args struct (implementing
//! [`ResourceArgs`](crate::core::resource::ResourceArgs)) with a handle type
//! returned by its constructor. All constructors share
//! [`construct`](crate::core::resource::construct).

pub mod pkg;

use crate::core::types::{ResourceDescriptor, TypeToken};

/// Common view over every typed resource handle.
pub trait Resource {
    fn descriptor(&self) -> &ResourceDescriptor;

    fn name(&self) -> &str {
        self.descriptor().name()
    }

    fn type_token(&self) -> &TypeToken {
        self.descriptor().type_token()
    }
}
