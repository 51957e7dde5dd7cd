//! Built-in annotation modules.
//!
//! Each module is registered under the name of its directory in the modules
//! root, where its `<name>.toml` configuration lives.

use std::sync::OnceLock;

use annot_core::AnnotatorRegistry;

pub mod ref_len;
pub mod secondary_count;

pub use ref_len::RefLen;
pub use secondary_count::SecondaryCount;

static DEFAULT_REGISTRY: OnceLock<AnnotatorRegistry> = OnceLock::new();

/// Registry of every built-in module, built on first access.
pub fn default_registry() -> &'static AnnotatorRegistry {
    DEFAULT_REGISTRY.get_or_init(builtin_registry)
}

pub fn builtin_registry() -> AnnotatorRegistry {
    let mut registry = AnnotatorRegistry::new();
    registry.register(ref_len::NAME, ref_len::DESCRIPTION, || {
        Box::new(RefLen::default())
    });
    registry.register(secondary_count::NAME, secondary_count::DESCRIPTION, || {
        Box::new(SecondaryCount)
    });
    registry
}
