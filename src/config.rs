use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fjall::Keyspace;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::warn;

use crate::ingest::MissingMappingPolicy;
use crate::mapping::Strategy;

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) server: ServerConfig,
    pub(crate) ingest: IngestConfig,
    /// Namespace prefixes shared by every bundle context.
    pub(crate) namespaces: BTreeMap<String, String>,
    pub(crate) bundles: Vec<BundleConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct ServerConfig {
    pub(crate) listen: String,
    pub(crate) http_port: u16,
    pub(crate) base_url: String,
    pub(crate) data_dir: PathBuf,
    pub(crate) record_type: String,
    pub(crate) auth: Option<AuthConfig>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthConfig {
    pub(crate) username: String,
    pub(crate) password: SecretString,
}

#[derive(Clone, Copy, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct IngestConfig {
    pub(crate) strategy: Strategy,
    pub(crate) missing_mapping: MissingMappingPolicy,
}

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct BundleConfig {
    pub(crate) name: String,
    /// Declared fields, in declaration order.
    pub(crate) fields: Vec<String>,
    pub(crate) rdf_mapping: Option<RdfMapping>,
}

#[derive(Clone, Default, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct RdfMapping {
    pub(crate) types: Vec<String>,
    pub(crate) fields: BTreeMap<String, FieldMapping>,
}

#[derive(Clone, Default, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct FieldMapping {
    pub(crate) properties: Vec<String>,
    pub(crate) datatype: Option<String>,
}

pub(crate) struct RuntimeConfig {
    pub(crate) init: Config,
    pub(crate) keyspace: Keyspace,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0".to_owned(),
            http_port: 8080,
            base_url: "http://localhost:8080".to_owned(),
            data_dir: PathBuf::from("data"),
            record_type: "fedora_resource".to_owned(),
            auth: None,
        }
    }
}

impl RdfMapping {
    pub(crate) fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.get(name)
    }
}

impl Config {
    pub(crate) fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("unable to parse config file {}", path.display()))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let record_type = &self.server.record_type;
        if record_type.is_empty() || record_type.contains(['.', '/']) {
            bail!("invalid record type {record_type:?}");
        }
        for prefix in self.namespaces.keys() {
            if prefix.is_empty() || prefix.contains(':') || prefix.starts_with('@') {
                bail!("invalid namespace prefix {prefix:?}");
            }
        }
        let mut names = BTreeSet::new();
        for bundle in &self.bundles {
            if bundle.name.is_empty() || bundle.name.contains(['.', '/']) {
                bail!("invalid bundle name {:?}", bundle.name);
            }
            if !names.insert(bundle.name.as_str()) {
                bail!("bundle {} is declared twice", bundle.name);
            }
            let Some(mapping) = &bundle.rdf_mapping else {
                continue;
            };
            for field in mapping.fields.keys() {
                if !bundle.fields.contains(field) {
                    warn!(
                        target: "config",
                        bundle = %bundle.name,
                        %field,
                        "RDF mapping refers to an undeclared field; it will be ignored"
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) const TEST_CONFIG: &str = r#"
[server]
base_url = "http://localhost:8080"
record_type = "fedora_resource"

[namespaces]
dc11 = "http://purl.org/dc/elements/1.1/"
dcterms = "http://purl.org/dc/terms/"
pcdm = "http://pcdm.org/models#"
rdfs = "http://www.w3.org/2000/01/rdf-schema#"
schema = "http://schema.org"
xsd = "http://www.w3.org/2001/XMLSchema#"

[[bundles]]
name = "rdf_source"
fields = ["id", "uuid", "name", "description", "created"]

[bundles.rdf_mapping]
types = ["pcdm:Object"]

[bundles.rdf_mapping.fields.name]
properties = ["dc11:title", "rdfs:label"]
datatype = "xsd:string"

[bundles.rdf_mapping.fields.description]
properties = ["dcterms:description"]

[bundles.rdf_mapping.fields.created]
properties = ["schema:dateCreated"]

[[bundles]]
name = "collection"
fields = ["name"]

[bundles.rdf_mapping]
types = ["pcdm:Collection"]

[[bundles]]
name = "binary"
fields = ["name", "mimetype"]
"#;

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    toml::from_str(TEST_CONFIG).expect("test config should parse")
}
