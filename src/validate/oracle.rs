//! External schema checkers
//!
//! DTD validation itself is delegated. A [`SchemaOracle`] reports one of three
//! outcomes for a document and a schema file; the validator decides what each
//! means.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

// "-:12: element head: validity error : Element head content does not follow the DTD"
static DIAGNOSTIC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[^:\n]*:(\d+): (.+)$").unwrap());

/// One structural problem reported against the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub line: u32,
    pub message: String,
}

impl Violation {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleVerdict {
    Conforms,
    /// The schema was read; the document does not conform to it.
    Violations(Vec<Violation>),
    /// The schema itself could not be parsed.
    SchemaUnreadable(String),
}

pub trait SchemaOracle {
    fn check(&self, document: &str, schema: &Path) -> Result<OracleVerdict>;
}

/// Runs `xmllint --noout --dtdvalid <schema> -` with the document on stdin.
#[derive(Debug, Clone)]
pub struct XmllintOracle {
    program: String,
}

impl XmllintOracle {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for XmllintOracle {
    fn default() -> Self {
        Self::new("xmllint")
    }
}

impl SchemaOracle for XmllintOracle {
    fn check(&self, document: &str, schema: &Path) -> Result<OracleVerdict> {
        log::debug!("running {} against {}", self.program, schema.display());
        let mut child = Command::new(&self.program)
            .arg("--noout")
            .arg("--dtdvalid")
            .arg(schema)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::OracleUnavailable(format!("{}: {e}", self.program)))?;

        // A checker that rejects the schema exits without reading its input.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(document.as_bytes()) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    log::debug!("{} stopped reading the document early", self.program);
                }
                other => other?,
            }
        }
        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        Ok(interpret(output.status.code(), &stderr))
    }
}

/// Map an xmllint exit code and its diagnostics onto a verdict.
fn interpret(code: Option<i32>, stderr: &str) -> OracleVerdict {
    if code == Some(0) {
        return OracleVerdict::Conforms;
    }
    if code == Some(2) || stderr.contains("Could not parse DTD") {
        return OracleVerdict::SchemaUnreadable(stderr.trim().to_string());
    }

    let mut violations: Vec<Violation> = DIAGNOSTIC_LINE
        .captures_iter(stderr)
        .filter_map(|caps| {
            let line = caps[1].parse().ok()?;
            Some(Violation::new(line, caps[2].trim()))
        })
        .collect();

    if violations.is_empty() {
        let message = match stderr.trim() {
            "" => format!("validator exited with status {code:?}"),
            text => text.to_string(),
        };
        violations.push(Violation::new(0, message));
    }
    OracleVerdict::Violations(violations)
}
