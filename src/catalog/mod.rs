//! Bundles, their fields and their RDF mappings.

mod context_gen;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use crate::config::{BundleConfig, Config};

pub(crate) use crate::config::RdfMapping;

use self::context_gen::generate_context;

/// Knows which bundles exist for a record type.
pub(crate) trait BundleRegistry: Send + Sync {
    fn bundle_exists(&self, record_type: &str, bundle: &str) -> bool;
}

/// Field definitions of a bundle and their RDF mapping.
pub(crate) trait FieldSource: Send + Sync {
    /// Declared fields, in declaration order.
    fn field_names(&self, record_type: &str, bundle: &str) -> Vec<String>;
    /// `None` when the bundle has no RDF mapping registered.
    fn rdf_mapping(&self, record_type: &str, bundle: &str) -> Option<RdfMapping>;
}

/// Serves the JSON-LD context document of a bundle.
pub(crate) trait ContextProvider: Send + Sync {
    fn get_context(&self, bundle_id: &str) -> Result<String>;
}

pub(crate) fn bundle_id(record_type: &str, bundle: &str) -> String {
    format!("{record_type}.{bundle}")
}

pub(crate) fn parse_bundle_id(bundle_id: &str) -> Option<(&str, &str)> {
    bundle_id.split_once('.')
}

/// Configuration backed catalog of the bundles of a single record type.
#[derive(Debug, Clone)]
pub(crate) struct Catalog {
    record_type: String,
    namespaces: BTreeMap<String, String>,
    bundles: BTreeMap<String, BundleConfig>,
}

impl Catalog {
    pub(crate) fn new(config: &Config) -> Catalog {
        let bundles = config
            .bundles
            .iter()
            .map(|bundle| (bundle.name.clone(), bundle.clone()))
            .collect();
        Catalog {
            record_type: config.server.record_type.clone(),
            namespaces: config.namespaces.clone(),
            bundles,
        }
    }

    pub(crate) fn record_type(&self) -> &str {
        &self.record_type
    }

    fn bundle(&self, record_type: &str, bundle: &str) -> Option<&BundleConfig> {
        if record_type != self.record_type {
            return None;
        }
        self.bundles.get(bundle)
    }

    pub(crate) fn context_document(&self, record_type: &str, bundle: &str) -> Option<JsonValue> {
        let bundle = self.bundle(record_type, bundle)?;
        Some(generate_context(
            &self.namespaces,
            bundle.rdf_mapping.as_ref(),
        ))
    }
}

impl BundleRegistry for Catalog {
    fn bundle_exists(&self, record_type: &str, bundle: &str) -> bool {
        self.bundle(record_type, bundle).is_some()
    }
}

impl FieldSource for Catalog {
    fn field_names(&self, record_type: &str, bundle: &str) -> Vec<String> {
        self.bundle(record_type, bundle)
            .map(|bundle| bundle.fields.clone())
            .unwrap_or_default()
    }
    fn rdf_mapping(&self, record_type: &str, bundle: &str) -> Option<RdfMapping> {
        self.bundle(record_type, bundle)?.rdf_mapping.clone()
    }
}

impl ContextProvider for Catalog {
    fn get_context(&self, bundle_id: &str) -> Result<String> {
        let document = parse_bundle_id(bundle_id)
            .and_then(|(record_type, bundle)| self.context_document(record_type, bundle))
            .with_context(|| format!("unknown bundle {bundle_id}"))?;
        serde_json::to_string(&document).context("unable to serialize context")
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::Value;

    use crate::config::test_config;

    use super::{BundleRegistry, Catalog, ContextProvider, FieldSource, bundle_id};

    #[test]
    fn bundles_of_the_record_type() {
        let catalog = Catalog::new(&test_config());
        assert!(catalog.bundle_exists("fedora_resource", "rdf_source"));
        assert!(catalog.bundle_exists("fedora_resource", "binary"));
        assert!(!catalog.bundle_exists("fedora_resource", "image"));
        assert!(!catalog.bundle_exists("node", "rdf_source"));
    }

    #[test]
    fn fields_keep_declaration_order() {
        let catalog = Catalog::new(&test_config());
        assert_eq!(
            catalog.field_names("fedora_resource", "rdf_source"),
            vec!["id", "uuid", "name", "description", "created"]
        );
        assert!(catalog.field_names("fedora_resource", "image").is_empty());
        assert!(catalog.rdf_mapping("fedora_resource", "binary").is_none());
        assert!(catalog.rdf_mapping("fedora_resource", "collection").is_some());
    }

    #[test]
    fn context_for_bundle_id() -> Result<()> {
        let catalog = Catalog::new(&test_config());
        let context: Value =
            serde_json::from_str(&catalog.get_context(&bundle_id("fedora_resource", "rdf_source"))?)?;
        assert_eq!(context["@context"]["dc11"], "http://purl.org/dc/elements/1.1/");
        assert!(catalog.get_context("fedora_resource.image").is_err());
        assert!(catalog.get_context("rdf_source").is_err());
        Ok(())
    }
}
