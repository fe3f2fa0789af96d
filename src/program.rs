//! DK-013: The third-party-package program.
//!
//! Declares a thing, two objects from the `pkg:module` namespace, and a
//! provider with a property map. Each declaration returns early on error.

use crate::core::context::Context;
use crate::core::error::Result;
use crate::core::value::StringMap;
use crate::sdk::pkg::{module, Provider, ProviderArgs, Thing, ThingArgs};

pub fn third_party_package(ctx: &mut Context) -> Result<()> {
    Thing::new(ctx, "Other", ThingArgs::default().idea("Support Third Party"))?;
    module::Object::new(ctx, "Question", module::ObjectArgs::default().answer(42.0))?;
    module::Object::new(ctx, "Question2", module::ObjectArgs::default().answer(24.0))?;
    Provider::new(
        ctx,
        "Provider",
        ProviderArgs::default().object_prop(StringMap::from([
            ("prop1", "foo"),
            ("prop2", "bar"),
            ("prop3", "fizz"),
        ])),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RunConfig;
    use crate::core::driver;

    #[test]
    fn test_dk013_declares_four_in_order() {
        let outcome = driver::run(RunConfig::default(), third_party_package);
        let registry = outcome.into_result().unwrap();
        assert_eq!(
            registry.names(),
            vec!["Other", "Question", "Question2", "Provider"]
        );
        let tokens: Vec<&str> = registry.iter().map(|d| d.type_token().as_str()).collect();
        assert_eq!(
            tokens,
            vec![
                "pkg:index:Thing",
                "pkg:module:Object",
                "pkg:module:Object",
                "pulumi:providers:pkg"
            ]
        );
    }
}
