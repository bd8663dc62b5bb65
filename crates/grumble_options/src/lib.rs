//! grumble_options: Per-unit compile options.
//!
//! Options describe where the generated Go package lives and which runtime
//! it links against. They are read from JSON (camelCase keys); every field
//! has a default so an empty document `{}` is valid.

use serde::{Deserialize, Serialize};

/// Canonical import path of the support runtime.
pub const DEFAULT_RUNTIME: &str = "github.com/google/grumpy/runtime";

/// Prefix under which relative Python imports are resolved to Go packages.
pub const DEFAULT_LIBROOT: &str = "__python__";

/// Options for compiling one Python module into one Go package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitOptions {
    /// Go import path of the package being generated, e.g. `__python__/foo/bar`.
    pub full_package_name: String,
    /// Fully qualified path of the support runtime package.
    pub runtime: String,
    pub libroot: String,
    /// Source file name, reported in diagnostics and code objects.
    pub filename: String,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            full_package_name: "__main__".to_string(),
            runtime: DEFAULT_RUNTIME.to_string(),
            libroot: DEFAULT_LIBROOT.to_string(),
            filename: "<stdin>".to_string(),
        }
    }
}

impl UnitOptions {
    pub fn new(full_package_name: &str, filename: &str) -> Self {
        Self {
            full_package_name: full_package_name.to_string(),
            filename: filename.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Name used in the Go `package` clause: the last path component.
    pub fn package_name(&self) -> &str {
        self.full_package_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.full_package_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let options = UnitOptions::from_json("{}").unwrap();
        assert_eq!(options, UnitOptions::default());
        assert_eq!(options.runtime, DEFAULT_RUNTIME);
    }

    #[test]
    fn test_camel_case_keys() {
        let options = UnitOptions::from_json(
            r#"{"fullPackageName": "__python__/foo/bar", "filename": "bar.py"}"#,
        )
        .unwrap();
        assert_eq!(options.full_package_name, "__python__/foo/bar");
        assert_eq!(options.filename, "bar.py");
        assert_eq!(options.libroot, DEFAULT_LIBROOT);
        assert_eq!(options.package_name(), "bar");
    }

    #[test]
    fn test_package_name_without_separator() {
        let options = UnitOptions::new("__main__", "main.py");
        assert_eq!(options.package_name(), "__main__");
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(UnitOptions::from_json("{\"runtime\": 3}").is_err());
    }
}
