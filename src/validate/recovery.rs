//! Patched schema copies
//!
//! Publisher DTDs pull in a MathML module through the shared-entity file.
//! When the module is not installed next to the DTD, the DTD cannot be parsed.
//! A scratch copy of the DTD and its companion, with that inclusion removed,
//! usually can.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::SchemaConfig;
use crate::error::{Error, Result};

static MATHML_INCLUSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!ENTITY % mathml-dtd[\s\S]*?>\s*%mathml-dtd;\s*").unwrap());

const MATHML_PLACEHOLDER: &str = "<!ENTITY % mathml-dtd \"\" >\n";

/// A schema copy living in a scratch directory, removed on drop.
#[derive(Debug)]
pub struct PatchedSchema {
    _dir: TempDir,
    schema: PathBuf,
    mathml_removed: bool,
}

impl PatchedSchema {
    pub fn path(&self) -> &Path {
        &self.schema
    }

    /// Whether the MathML inclusion was taken out of the companion file.
    pub fn mathml_removed(&self) -> bool {
        self.mathml_removed
    }
}

/// Copy `schema` and its companion entity file into a scratch directory,
/// dropping the MathML inclusion when the module is absent beside `schema`.
pub fn patch_schema(schema: &Path, config: &SchemaConfig) -> Result<PatchedSchema> {
    let source_dir = schema.parent().unwrap_or_else(|| Path::new("."));
    let companion = source_dir.join(&config.companion);
    let file_name = schema
        .file_name()
        .ok_or_else(|| Error::SchemaParse(format!("not a schema file: {}", schema.display())))?;

    if !schema.is_file() || !companion.is_file() {
        return Err(Error::SchemaParse(format!(
            "required schema files are missing ({} and {})",
            schema.display(),
            companion.display()
        )));
    }

    let dir = tempfile::tempdir()?;
    let patched_schema = dir.path().join(file_name);
    fs::copy(schema, &patched_schema)?;

    let mut content = fs::read_to_string(&companion)?;
    let mut mathml_removed = false;
    if !source_dir.join(&config.mathml_module).is_file() {
        let patched = MATHML_INCLUSION.replace(&content, MATHML_PLACEHOLDER);
        mathml_removed = patched != content;
        content = patched.into_owned();
    }
    fs::write(dir.path().join(&config.companion), content)?;

    if mathml_removed {
        log::warn!("patched schema copy: MathML module skipped for validation");
    }
    Ok(PatchedSchema {
        _dir: dir,
        schema: patched_schema,
        mathml_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANION: &str = "<!ENTITY % ce.common \"INCLUDE\">\n\
        <!ENTITY % mathml-dtd PUBLIC \"-//W3C//DTD MathML 3.0//EN\" \"mathml3.dtd\">\n\
        %mathml-dtd;\n\
        <!ENTITY % after \"x\">\n";

    fn schema_dir(with_module: bool) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("art560.dtd"), "<!ELEMENT article ANY>\n").unwrap();
        fs::write(dir.path().join("common170.ent"), COMPANION).unwrap();
        if with_module {
            fs::write(dir.path().join("mathml3-qname.mod"), "").unwrap();
        }
        dir
    }

    #[test]
    fn test_mathml_inclusion_is_removed_when_module_missing() {
        let dir = schema_dir(false);
        let patched = patch_schema(&dir.path().join("art560.dtd"), &SchemaConfig::default()).unwrap();

        assert!(patched.mathml_removed());
        assert_ne!(patched.path(), dir.path().join("art560.dtd").as_path());
        let companion =
            fs::read_to_string(patched.path().parent().unwrap().join("common170.ent")).unwrap();
        assert_eq!(
            companion,
            "<!ENTITY % ce.common \"INCLUDE\">\n<!ENTITY % mathml-dtd \"\" >\n<!ENTITY % after \"x\">\n"
        );
        // The source files are untouched.
        assert_eq!(fs::read_to_string(dir.path().join("common170.ent")).unwrap(), COMPANION);
    }

    #[test]
    fn test_companion_kept_when_module_present() {
        let dir = schema_dir(true);
        let patched = patch_schema(&dir.path().join("art560.dtd"), &SchemaConfig::default()).unwrap();

        assert!(!patched.mathml_removed());
        let companion =
            fs::read_to_string(patched.path().parent().unwrap().join("common170.ent")).unwrap();
        assert_eq!(companion, COMPANION);
    }

    #[test]
    fn test_missing_companion_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("art560.dtd");
        fs::write(&schema, "<!ELEMENT article ANY>\n").unwrap();

        let err = patch_schema(&schema, &SchemaConfig::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaParse(_)));
    }

    #[test]
    fn test_scratch_directory_is_removed_on_drop() {
        let dir = schema_dir(false);
        let patched = patch_schema(&dir.path().join("art560.dtd"), &SchemaConfig::default()).unwrap();
        let scratch = patched.path().parent().unwrap().to_path_buf();
        assert!(scratch.is_dir());
        drop(patched);
        assert!(!scratch.exists());
    }
}
