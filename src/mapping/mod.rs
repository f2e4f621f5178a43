//! Resolution of expanded RDF property IRIs to bundle attributes.

mod loader;
mod strategy;

pub(crate) use self::loader::{AttributeMapping, MappingUnavailable, load_attribute_mappings};
pub(crate) use self::strategy::Strategy;
