//! Code objects: scope bodies, function definitions and class definitions.

use crate::error::CompileError;
use crate::expr::join_exprs;
use crate::{module_name, SourceText};
use grumble_ast::node::{ClassDef, FunctionDef, Identifier, Stmt};
use grumble_core::intern::StringInterner;
use grumble_options::UnitOptions;
use grumble_scope::{
    adjust_local_name, classify_class, classify_function, ScopeId, ScopeKind, ScopeTree, DEFAULT_TEMP_TYPE,
};
use grumble_writer::{go_str, CodeWriter, GoWriter};

/// A rendered code body, split so generators can keep the declarations
/// outside their resumable closure.
pub(crate) struct CodeBody {
    /// `πGlobals` and scratch variable declarations.
    pub(crate) decls: String,
    /// Error variable, state dispatch loop and final return.
    pub(crate) dispatch: String,
}

/// Generation state for one module: the scope tree plus what every visitor
/// needs to read.
pub(crate) struct Codegen<'c> {
    pub(crate) tree: ScopeTree,
    pub(crate) interner: StringInterner,
    pub(crate) options: &'c UnitOptions,
    pub(crate) source: Option<&'c SourceText>,
}

impl<'c> Codegen<'c> {
    pub(crate) fn new(options: &'c UnitOptions, interner: &StringInterner, source: Option<&'c SourceText>) -> Self {
        Self {
            tree: ScopeTree::new(options, interner),
            interner: interner.clone(),
            options,
            source,
        }
    }

    /// Interned reference for an identifier's text.
    pub(crate) fn intern_ident(&mut self, id: Identifier) -> String {
        self.tree.intern(self.interner.resolve(id.name))
    }

    /// Render the Go function body of scope `id`: declarations of its
    /// scratch variables followed by the state dispatch loop around `body`.
    pub(crate) fn code_body(&mut self, id: ScopeId, body: &[Stmt<'_>]) -> Result<CodeBody, CompileError> {
        let mut block = GoWriter::new();
        block.indent(1);
        self.visit_body(id, &mut block, body)?;
        let epilogue = match self.tree.scope(id).kind {
            ScopeKind::Function { is_generator: false, .. } => "return πg.None, nil",
            _ => "return nil, nil",
        };
        block.write(epilogue);

        let resources = &self.tree.scope(id).resources;
        let mut decls = GoWriter::new();
        decls.write("πGlobals := πF.Globals()");
        decls.write("_ = πGlobals");
        for temp in resources.declared_temps() {
            decls.write(&temp.declaration());
            decls.write(&format!("_ = {}", temp.name));
        }
        let mut dispatch = GoWriter::new();
        dispatch.write("var πE *πg.BaseException");
        dispatch.write("_ = πE");
        dispatch.write_block(&resources.checkpoints(), block.output());
        dispatch.write("return nil, πE");
        Ok(CodeBody {
            decls: decls.into_output(),
            dispatch: dispatch.into_output(),
        })
    }

    #[tracing::instrument(level = "debug", skip_all, fields(name = %self.interner.resolve(def.name.name)))]
    pub(crate) fn visit_function_def(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        def: &FunctionDef<'_>,
    ) -> Result<(), CompileError> {
        let name = self.interner.resolve(def.name.name).to_string();
        let vars = classify_function(def, &self.interner)?;
        let is_generator = vars.is_generator;
        let slots: Vec<(String, String)> = vars
            .vars
            .values()
            .filter_map(|var| {
                var.init_expr()
                    .map(|init| (adjust_local_name(self.interner.resolve(var.name)), init))
            })
            .collect();

        let func_scope = self.tree.push_function(scope, &name, vars);
        let body = self.code_body(func_scope, def.body)?;

        let params: Vec<String> = def
            .args
            .args
            .iter()
            .map(|param| format!("{{Name: {}}}", go_str(self.interner.resolve(param.name))))
            .collect();
        let mut flags = Vec::new();
        if def.args.vararg.is_some() {
            flags.push("πg.CodeFlagVarArg");
        }
        if def.args.kwarg.is_some() {
            flags.push("πg.CodeFlagKWArg");
        }
        let flags = if flags.is_empty() { "0".to_string() } else { flags.join(" | ") };

        let func = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        w.write(&format!(
            "{} = πg.NewFunction(πg.NewCode({}, {}, []πg.Param{{{}}}, {}, func(πF *πg.Frame, πArgs []*πg.Object) (*πg.Object, *πg.BaseException) {{",
            func.name,
            go_str(&name),
            go_str(&self.options.filename),
            params.join(", "),
            flags
        ));
        w.indent_block(1, |w| {
            // Slots and temps live outside the generator closure so they
            // survive suspension.
            for (slot, init) in &slots {
                w.write(&format!("var {} *πg.Object = {}", slot, init));
                w.write(&format!("_ = {}", slot));
            }
            w.write(&body.decls);
            if is_generator {
                w.write("return πg.NewGenerator(πF, func(πSent *πg.Object) (*πg.Object, *πg.BaseException) {");
                w.indent_block(1, |w| w.write(&body.dispatch));
                w.write("}).ToObject(), nil");
            } else {
                w.write(&body.dispatch);
            }
        });
        w.write("}), πGlobals).ToObject()");

        self.tree.bind_var(scope, w, def.name.name, &func.name)?;
        self.tree.free_temp(scope, &func)?;
        tracing::debug!(slots = slots.len(), is_generator, "function compiled");
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(name = %self.interner.resolve(def.name.name)))]
    pub(crate) fn visit_class_def(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        def: &ClassDef<'_>,
    ) -> Result<(), CompileError> {
        let name = self.interner.resolve(def.name.name).to_string();
        let vars = classify_class(def, &self.interner)?;

        let mut bases = Vec::with_capacity(def.bases.len());
        for base in def.bases.iter() {
            bases.push(self.visit_expr(scope, w, base)?);
        }
        let base_tuple = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        w.write(&format!("{} = πg.NewTuple({}).ToObject()", base_tuple.name, join_exprs(&bases)));
        for base in &bases {
            self.tree.free_expr(scope, base)?;
        }

        let namespace = self.tree.alloc_temp(scope, "*πg.Dict");
        w.write(&format!("{} = πg.NewDict()", namespace.name));
        let module = self.tree.intern(&module_name(self.options));
        w.write_checked_call1(&format!(
            "{}.SetItemString(πF, \"__module__\", {}.ToObject())",
            namespace.name, module
        ));

        let class_scope = self.tree.push_class(scope, &name, &vars);
        let body = self.code_body(class_scope, def.body)?;

        let code = self.tree.alloc_temp(scope, "*πg.Code");
        w.write(&format!(
            "{} = πg.NewCode({}, {}, nil, 0, func(πF *πg.Frame, _ []*πg.Object) (*πg.Object, *πg.BaseException) {{",
            code.name,
            go_str(&name),
            go_str(&self.options.filename)
        ));
        w.indent_block(1, |w| {
            w.write(&format!("πClass := {}", namespace.name));
            w.write("_ = πClass");
            w.write(&body.decls);
            w.write(&body.dispatch);
        });
        w.write("})");
        w.write_checked_call2("_", &format!("{}.Eval(πF, πGlobals, nil, nil)", code.name));

        let class_name = self.tree.intern(&name);
        let class = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        w.write_checked_call2(
            &class.name,
            &format!(
                "πg.TypeType.ToObject().Call(πF, πg.Args{{{}.ToObject(), {}, {}.ToObject()}}, nil)",
                class_name, base_tuple.name, namespace.name
            ),
        );
        self.tree.bind_var(scope, w, def.name.name, &class.name)?;

        for temp in [&class, &code, &namespace, &base_tuple] {
            self.tree.free_temp(scope, temp)?;
        }
        Ok(())
    }
}
