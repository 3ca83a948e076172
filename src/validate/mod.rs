//! Schema (DTD) validation
//!
//! Validation runs in at most two stages. The document is checked against
//! the schema as given; if the schema itself does not parse, it is checked
//! once more against a patched scratch copy (see [`recovery`]). A schema that
//! still does not parse ends validation with [`Error::SchemaParse`].
//!
//! A document that simply does not conform is not an error: the result is a
//! [`ValidationReport`] with `valid == false` and the first few violations.

pub mod oracle;
pub mod recovery;

pub use oracle::{OracleVerdict, SchemaOracle, Violation, XmllintOracle};
pub use recovery::{PatchedSchema, patch_schema};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::SchemaConfig;
use crate::error::{Error, Result};

/// Violations beyond this many are dropped from the report.
pub const MAX_VIOLATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn conforming() -> Self {
        ValidationReport {
            valid: true,
            violations: Vec::new(),
        }
    }

    /// A failed report keeping the first [`MAX_VIOLATIONS`] violations.
    pub fn from_violations(mut violations: Vec<Violation>) -> Self {
        violations.truncate(MAX_VIOLATIONS);
        ValidationReport {
            valid: false,
            violations,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Direct,
    PatchedRetry,
}

/// Validate `document` against the DTD at `schema`.
pub fn validate(
    document: &str,
    schema: &Path,
    config: &SchemaConfig,
    oracle: &dyn SchemaOracle,
) -> Result<ValidationReport> {
    if !schema.is_file() {
        return Err(Error::ResourceNotFound(schema.to_path_buf()));
    }
    if looks_like_html(schema)? {
        return Err(Error::SchemaResourceInvalid(schema.to_path_buf()));
    }

    let mut stage = Stage::Direct;
    // Keeps the scratch copy alive until the retry has run.
    let mut patched: Option<PatchedSchema> = None;
    loop {
        let target = patched.as_ref().map_or(schema, PatchedSchema::path);
        match (stage, oracle.check(document, target)?) {
            (Stage::Direct, OracleVerdict::SchemaUnreadable(reason)) => {
                log::warn!(
                    "schema {} did not parse, retrying with a patched copy: {reason}",
                    schema.display()
                );
                patched = Some(patch_schema(schema, config)?);
                stage = Stage::PatchedRetry;
            }
            (Stage::PatchedRetry, OracleVerdict::SchemaUnreadable(reason)) => {
                return Err(Error::SchemaParse(reason));
            }
            (_, OracleVerdict::Conforms) => {
                log::info!("document conforms to {}", schema.display());
                return Ok(ValidationReport::conforming());
            }
            (_, OracleVerdict::Violations(violations)) => {
                let report = ValidationReport::from_violations(violations);
                log::info!(
                    "document does not conform to {} ({} violation(s) reported)",
                    schema.display(),
                    report.violations.len()
                );
                return Ok(report);
            }
        }
    }
}

/// Validate with the configured external program.
pub fn validate_with_xmllint(
    document: &str,
    schema: &Path,
    config: &SchemaConfig,
) -> Result<ValidationReport> {
    let oracle = XmllintOracle::new(&config.program);
    validate(document, schema, config, &oracle)
}

/// A schema saved from a browser is an HTML page; catch that before parsing.
fn looks_like_html(schema: &Path) -> Result<bool> {
    let mut first_line = Vec::new();
    BufReader::new(File::open(schema)?).read_until(b'\n', &mut first_line)?;
    let first_line = String::from_utf8_lossy(&first_line).to_lowercase();
    Ok(first_line.contains("<html") || first_line.contains("<!doctype html"))
}
