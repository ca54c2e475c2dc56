//! Authorization policy value objects.

pub mod rule;

pub use rule::{GroupingRule, OBJECT_ANY, OBJECT_NONE, PolicyRule, normalize_object};
