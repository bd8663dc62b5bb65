//! grumble_compiler: Module code generation.
//!
//! Drives the scope layer over a whole module: classifies every function
//! and class body, walks statements and expressions through the scope
//! operations and assembles one Go source file per module:
//! 1. Generate the module body (nested code objects inline)
//! 2. Emit the package clause and import block
//! 3. Emit interned string declarations
//! 4. Emit the module code object and its registration

mod codegen;
mod error;
mod expr;
mod stmt;

pub use error::CompileError;

use codegen::Codegen;
use grumble_ast::node::Module;
use grumble_core::intern::StringInterner;
use grumble_core::text::LineMap;
use grumble_options::UnitOptions;
use grumble_scope::ScopeId;
use grumble_writer::{go_str, CodeWriter, GoWriter};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset; repeated calls are no-ops.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Source text a module was parsed from, used for `// line N:` comments.
pub(crate) struct SourceText {
    pub(crate) text: String,
    pub(crate) lines: LineMap,
}

/// Compiles one module into one Go source file.
pub struct ModuleCompiler {
    options: UnitOptions,
    interner: StringInterner,
    source: Option<SourceText>,
}

impl ModuleCompiler {
    /// `interner` must be the one the module's names were interned with.
    pub fn new(options: UnitOptions, interner: &StringInterner) -> Self {
        Self {
            options,
            interner: interner.clone(),
            source: None,
        }
    }

    /// Annotate generated statements with the source lines they came from.
    pub fn with_source(mut self, text: &str) -> Self {
        self.source = Some(SourceText {
            text: text.to_string(),
            lines: LineMap::new(text),
        });
        self
    }

    pub fn options(&self) -> &UnitOptions {
        &self.options
    }

    /// Generate the Go file for `module`.
    ///
    /// Each call starts from a fresh scope tree, so compiling the same
    /// module twice yields identical text.
    #[tracing::instrument(level = "debug", skip_all, fields(package = %self.options.full_package_name))]
    pub fn compile(&self, module: &Module<'_>) -> Result<String, CompileError> {
        let mut codegen = Codegen::new(&self.options, &self.interner, self.source.as_ref());
        codegen.tree.add_native_import("grumpy");
        let body = codegen.code_body(ScopeId::MODULE, module.body)?;
        let registry = codegen.tree.registry();

        let mut w = GoWriter::new();
        w.write(&format!("package {}", self.options.package_name()));
        w.write_import_block(registry.imports().map(|p| (p.name.as_str(), p.alias.as_str())));
        for s in registry.strings() {
            w.write(&format!("var ß{} = πg.InternStr({})", s, go_str(s)));
        }
        w.write("var Code *πg.Code");
        w.write("func init() {");
        w.indent_block(1, |w| {
            w.write(&format!(
                "Code = πg.NewCode(\"<module>\", {}, nil, 0, func(πF *πg.Frame, _ []*πg.Object) (*πg.Object, *πg.BaseException) {{",
                go_str(&self.options.filename)
            ));
            w.indent_block(1, |w| {
                w.write(&body.decls);
                w.write(&body.dispatch);
            });
            w.write("})");
            w.write(&format!("πg.RegisterModule({}, Code)", go_str(&module_name(&self.options))));
        });
        w.write("}");

        tracing::debug!(
            imports = registry.imports().count(),
            strings = registry.strings().count(),
            "module compiled"
        );
        Ok(w.into_output())
    }
}

/// Dotted Python name of the unit: the package path below the library root.
pub(crate) fn module_name(options: &UnitOptions) -> String {
    let prefix = format!("{}/", options.libroot);
    options
        .full_package_name
        .strip_prefix(&prefix)
        .unwrap_or(&options.full_package_name)
        .replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_strips_libroot() {
        assert_eq!(module_name(&UnitOptions::new("__python__/foo/bar", "bar.py")), "foo.bar");
        assert_eq!(module_name(&UnitOptions::default()), "__main__");
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
