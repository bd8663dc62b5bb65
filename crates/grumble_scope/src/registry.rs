//! Unit-wide tables: external package imports and interned strings.

use grumble_options::UnitOptions;
use grumble_writer::go_str;
use std::collections::{BTreeMap, BTreeSet};

/// Alias under which generated code refers to the support runtime.
pub const RUNTIME_ALIAS: &str = "πg";

/// Strings longer than this are never interned.
pub const MAX_INTERN_LEN: usize = 64;

/// Name that always refers to the support runtime, wherever it lives.
const RUNTIME_PACKAGE: &str = "grumpy";

/// An imported Go package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Fully qualified import path.
    pub name: String,
    pub alias: String,
}

impl Package {
    /// Package with the alias derived from its path: `a/b` becomes `π_aΓb`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: format!("π_{}", name.replace('/', "Γ")),
        }
    }

    pub fn with_alias(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.to_string(),
        }
    }
}

/// Imports and string constants shared by every scope of one unit.
#[derive(Debug)]
pub struct UnitRegistry {
    runtime: String,
    libroot: String,
    imports: BTreeMap<String, Package>,
    strings: BTreeSet<String>,
}

impl UnitRegistry {
    pub fn new(options: &UnitOptions) -> Self {
        Self {
            runtime: options.runtime.clone(),
            libroot: options.libroot.clone(),
            imports: BTreeMap::new(),
            strings: BTreeSet::new(),
        }
    }

    /// Register a package path relative to the library root.
    pub fn add_import(&mut self, name: &str) -> Package {
        let full = format!("{}/{}", self.libroot, name);
        self.add_native_import(&full)
    }

    /// Register a fully qualified package path. Repeated calls return the
    /// first registration.
    pub fn add_native_import(&mut self, name: &str) -> Package {
        let (name, alias) = if name == RUNTIME_PACKAGE {
            (self.runtime.clone(), Some(RUNTIME_ALIAS))
        } else {
            (name.to_string(), None)
        };
        if let Some(package) = self.imports.get(&name) {
            return package.clone();
        }
        let package = match alias {
            Some(alias) => Package::with_alias(&name, alias),
            None => Package::new(&name),
        };
        tracing::debug!(name = %package.name, alias = %package.alias, "register import");
        self.imports.insert(name, package.clone());
        package
    }

    /// Go expression evaluating to a string object for `s`.
    ///
    /// Short identifier-like strings are registered once and referenced by
    /// name (`ßfoo`); anything else is materialized as a fresh literal each
    /// time so arbitrary data never grows the constant table.
    pub fn intern(&mut self, s: &str) -> String {
        if s.len() > MAX_INTERN_LEN || !is_word(s) {
            return format!("{}.NewStr({})", RUNTIME_ALIAS, go_str(s));
        }
        if !self.strings.contains(s) {
            self.strings.insert(s.to_string());
        }
        format!("ß{}", s)
    }

    /// Registered packages, sorted by import path.
    pub fn imports(&self) -> impl Iterator<Item = &Package> {
        self.imports.values()
    }

    /// Interned strings, sorted.
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    pub fn is_interned(&self, s: &str) -> bool {
        self.strings.contains(s)
    }
}

/// True when `s` has no byte outside `[A-Za-z0-9_]`; the empty string
/// qualifies.
fn is_word(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> UnitRegistry {
        UnitRegistry::new(&UnitOptions::default())
    }

    #[test]
    fn test_intern_is_idempotent() {
        let mut r = registry();
        assert_eq!(r.intern("foo"), "ßfoo");
        assert_eq!(r.intern("foo"), "ßfoo");
        assert_eq!(r.strings().collect::<Vec<_>>(), vec!["foo"]);
    }

    #[test]
    fn test_intern_long_or_non_word_is_fresh_literal() {
        let mut r = registry();
        let long = "a".repeat(100);
        assert_eq!(r.intern(&long), format!("πg.NewStr(\"{}\")", long));
        assert_eq!(r.intern("foo bar"), "πg.NewStr(\"foo bar\")");
        assert_eq!(r.intern("foo bar"), "πg.NewStr(\"foo bar\")");
        assert_eq!(r.strings().count(), 0);
    }

    #[test]
    fn test_intern_empty_string_is_registered() {
        let mut r = registry();
        assert_eq!(r.intern(""), "ß");
        assert_eq!(r.intern(""), "ß");
        assert!(r.is_interned(""));
        assert_eq!(r.strings().collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn test_intern_length_threshold() {
        let mut r = registry();
        let exactly = "b".repeat(MAX_INTERN_LEN);
        assert_eq!(r.intern(&exactly), format!("ß{}", exactly));
        assert!(r.is_interned(&exactly));
    }

    #[test]
    fn test_add_import_is_deduplicated() {
        let mut r = registry();
        let first = r.add_import("foo/bar");
        let second = r.add_native_import("__python__/foo/bar");
        assert_eq!(first, second);
        assert_eq!(first.alias, "π___python__ΓfooΓbar");
        assert_eq!(r.imports().count(), 1);
    }

    #[test]
    fn test_runtime_gets_canonical_alias() {
        let mut r = registry();
        let rt = r.add_native_import("grumpy");
        assert_eq!(rt.name, grumble_options::DEFAULT_RUNTIME);
        assert_eq!(rt.alias, "πg");
        assert_eq!(r.add_native_import("grumpy"), rt);
    }

    #[test]
    fn test_imports_sorted_by_path() {
        let mut r = registry();
        r.add_native_import("fmt");
        r.add_native_import("bytes");
        let names: Vec<_> = r.imports().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bytes", "fmt"]);
    }
}
