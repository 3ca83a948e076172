//! Conversion settings
//!
//! Publisher fallbacks, doctype preamble and schema file names live in one
//! explicit [`Config`] value handed to the builder and validator. Every field
//! has a default, so a partial `config.toml` only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub publisher: PublisherConfig,
    pub doctype: DoctypeConfig,
    pub schema: SchemaConfig,
}

/// Bibliographic values used when no metadata record supplies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    pub jid: String,
    pub aid: String,
    pub pii: String,
    pub copyright_type: String,
    pub copyright_year: String,
    pub copyright_text: String,

    /// Root `article` attributes
    pub version: String,
    pub docsubtype: String,
    pub lang: String,
}

/// Preamble written ahead of heuristic output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctypeConfig {
    pub public_id: String,
    pub system_id: String,
    /// `gr1..grN` entities are always declared up to at least this N.
    pub min_graphics: u32,
    pub extra_entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Shared-entity file that sits next to the DTD.
    pub companion: String,
    /// Optional MathML module; when it is missing the companion is patched.
    pub mathml_module: String,
    /// External validator executable.
    pub program: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        PublisherConfig {
            jid: "CHAOS".to_string(),
            aid: "115581".to_string(),
            pii: "UNKNOWN".to_string(),
            copyright_type: "unknown".to_string(),
            copyright_year: "2024".to_string(),
            copyright_text: "Copyright (c) Elsevier B.V.".to_string(),
            version: "5.6".to_string(),
            docsubtype: "fla".to_string(),
            lang: "en".to_string(),
        }
    }
}

impl Default for DoctypeConfig {
    fn default() -> Self {
        DoctypeConfig {
            public_id: "-//ES//DTD journal article DTD version 5.6.0//EN//XML".to_string(),
            system_id: "art560.dtd".to_string(),
            min_graphics: 22,
            extra_entities: vec!["fx1".to_string()],
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        SchemaConfig {
            companion: "common170.ent".to_string(),
            mathml_module: "mathml3-qname.mod".to_string(),
            program: "xmllint".to_string(),
        }
    }
}

impl Config {
    /// Load from the user config directory, falling back to defaults.
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                return Self::from_path(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Load an explicit config file. A missing file is an error here.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ResourceNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("artxml").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[publisher]
jid = "JOURNAL"

[doctype]
min_graphics = 4
"#,
        )
        .unwrap();

        assert_eq!(config.publisher.jid, "JOURNAL");
        assert_eq!(config.publisher.aid, "115581");
        assert_eq!(config.doctype.min_graphics, 4);
        assert_eq!(config.doctype.system_id, "art560.dtd");
        assert_eq!(config.schema, SchemaConfig::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Config::from_path(Path::new("no/such/config.toml")).unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[schema]\nprogram = \"/opt/bin/xmllint\"\n").unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.schema.program, "/opt/bin/xmllint");
        assert_eq!(config.schema.companion, "common170.ent");
    }

    #[test]
    fn test_config_path_is_namespaced() {
        if let Some(path) = Config::get_config_path() {
            assert!(path.ends_with("artxml/config.toml"));
        }
    }
}
