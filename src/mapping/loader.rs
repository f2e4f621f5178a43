use thiserror::Error;

use crate::catalog::{FieldSource, bundle_id};

/// The bundle has no RDF mapping registered.
#[derive(Debug, Error)]
#[error("RDF mapping not found for {bundle_id}")]
pub(crate) struct MappingUnavailable {
    pub(crate) bundle_id: String,
}

/// Attribute name to the RDF terms (`prefix:localName`) it satisfies, in
/// declared-field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AttributeMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl AttributeMapping {
    pub(crate) fn insert(&mut self, attribute: impl Into<String>, terms: Vec<String>) {
        let attribute = attribute.into();
        match self.entries.iter_mut().find(|(name, _)| *name == attribute) {
            Some((_, existing)) => *existing = terms,
            None => self.entries.push((attribute, terms)),
        }
    }
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
    #[cfg(test)]
    pub(crate) fn terms(&self, attribute: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, terms)| terms.as_slice())
    }
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, terms)| (name.as_str(), terms.as_slice()))
    }
}

/// Collect the RDF terms of every declared field of a bundle. Fields
/// without RDF terms are left out.
pub(crate) fn load_attribute_mappings(
    fields: &dyn FieldSource,
    record_type: &str,
    bundle: &str,
) -> Result<AttributeMapping, MappingUnavailable> {
    let rdf_mapping =
        fields
            .rdf_mapping(record_type, bundle)
            .ok_or_else(|| MappingUnavailable {
                bundle_id: bundle_id(record_type, bundle),
            })?;

    let mut result = AttributeMapping::default();
    for field_name in fields.field_names(record_type, bundle) {
        let Some(field_mapping) = rdf_mapping.field(&field_name) else {
            continue;
        };
        if field_mapping.properties.is_empty() {
            continue;
        }
        result.insert(field_name, field_mapping.properties.clone());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::catalog::Catalog;
    use crate::config::test_config;

    use super::{AttributeMapping, load_attribute_mappings};

    #[test]
    fn load_mapped_fields_in_declared_order() -> Result<()> {
        let catalog = Catalog::new(&test_config());
        let mapping = load_attribute_mappings(&catalog, "fedora_resource", "rdf_source")?;
        let attributes: Vec<&str> = mapping.iter().map(|(name, _)| name).collect();
        assert_eq!(attributes, vec!["name", "description", "created"]);
        assert_eq!(
            mapping.terms("name"),
            Some(&["dc11:title".to_owned(), "rdfs:label".to_owned()][..])
        );
        assert_eq!(mapping.terms("uuid"), None);
        Ok(())
    }

    #[test]
    fn load_is_stable() -> Result<()> {
        let catalog = Catalog::new(&test_config());
        let first = load_attribute_mappings(&catalog, "fedora_resource", "rdf_source")?;
        let second = load_attribute_mappings(&catalog, "fedora_resource", "rdf_source")?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn mapping_without_mapped_fields_is_empty() -> Result<()> {
        let catalog = Catalog::new(&test_config());
        let mapping = load_attribute_mappings(&catalog, "fedora_resource", "collection")?;
        assert!(mapping.is_empty());
        Ok(())
    }

    #[test]
    fn missing_mapping_is_an_error() {
        let catalog = Catalog::new(&test_config());
        let error = load_attribute_mappings(&catalog, "fedora_resource", "binary")
            .expect_err("binary has no RDF mapping");
        assert_eq!(error.bundle_id, "fedora_resource.binary");
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut mapping = AttributeMapping::default();
        mapping.insert("name", vec!["dc11:title".to_owned()]);
        mapping.insert("description", vec!["dcterms:description".to_owned()]);
        mapping.insert("name", vec!["rdfs:label".to_owned()]);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.iter().next(), Some(("name", &["rdfs:label".to_owned()][..])));
    }
}
