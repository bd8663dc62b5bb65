//! Go source rendering.

use crate::CodeWriter;

/// Accumulates tab-indented Go source.
///
/// Multi-line writes are indented line by line and blank lines are dropped,
/// so callers can pass pre-formatted snippets without tracking layout.
#[derive(Debug, Default)]
pub struct GoWriter {
    output: String,
    indent_level: usize,
}

impl GoWriter {
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            indent_level: 0,
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    pub fn indent(&mut self, n: usize) {
        self.indent_level += n;
    }

    pub fn dedent(&mut self, n: usize) {
        self.indent_level = self.indent_level.saturating_sub(n);
    }

    /// Run `f` with the indentation shifted by `n` levels (negative dedents).
    pub fn indent_block<F: FnOnce(&mut Self)>(&mut self, n: isize, f: F) {
        let saved = self.indent_level;
        self.indent_level = (saved as isize + n).max(0) as usize;
        f(self);
        self.indent_level = saved;
    }

    /// `// line N: text`, tying the following statements to their source.
    pub fn write_py_context(&mut self, line: u32, text: &str) {
        self.write(&format!("// line {}: {}", line, text.trim()));
    }

    /// Emit the resumable dispatch loop around a function or class body.
    ///
    /// Every checkpoint becomes a `case` that jumps to its label so a
    /// suspended frame continues where it left off.
    pub fn write_block(&mut self, checkpoints: &[u32], body: &str) {
        self.write("for ; πF.State() >= 0; πF.PopCheckpoint() {");
        self.indent_block(1, |w| {
            w.write("switch πF.State() {");
            w.write("case 0:");
            for checkpoint in checkpoints {
                w.write(&format!("case {0}: goto Label{0}", checkpoint));
            }
            w.write("default: panic(\"unexpected function state\")");
            w.write("}");
            // Labels sit one level left of the body, so the body is aligned
            // with the switch rather than nested under it.
            w.indent_block(-1, |w| w.write(body));
        });
        self.write("}");
    }

    /// Emit a Go import block for `(name, alias)` pairs, sorted by name.
    pub fn write_import_block<I, N, A>(&mut self, imports: I)
    where
        I: IntoIterator<Item = (N, A)>,
        N: AsRef<str>,
        A: AsRef<str>,
    {
        let mut imports: Vec<(N, A)> = imports.into_iter().collect();
        if imports.is_empty() {
            return;
        }
        imports.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));
        self.write("import (");
        self.indent_block(1, |w| {
            for (name, alias) in &imports {
                w.write(&format!("{} \"{}\"", alias.as_ref(), name.as_ref()));
            }
        });
        self.write(")");
    }

    fn write_line(&mut self, line: &str) {
        for _ in 0..self.indent_level {
            self.output.push('\t');
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}

impl CodeWriter for GoWriter {
    fn write(&mut self, output: &str) {
        for line in output.lines() {
            if !line.trim().is_empty() {
                self.write_line(line);
            }
        }
    }

    fn write_checked_call1(&mut self, call: &str) {
        self.write(&format!("if πE = {}; πE != nil {{\n\tcontinue\n}}", call));
    }

    fn write_checked_call2(&mut self, result: &str, call: &str) {
        self.write(&format!(
            "if {}, πE = {}; πE != nil {{\n\tcontinue\n}}",
            result, call
        ));
    }

    fn write_label(&mut self, id: u32) {
        self.indent_block(-1, |w| w.write(&format!("Label{}:", id)));
    }
}

/// Render `value` as a Go string literal.
///
/// Bytes outside printable ASCII are written as `\xNN`, so the literal is
/// byte-exact for any UTF-8 input.
pub fn go_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for byte in value.bytes() {
        match byte {
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            b'\n' => out.push_str("\\n"),
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b' '..=b'~' => out.push(byte as char),
            _ => out.push_str(&format!("\\x{:02x}", byte)),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_indent_block() {
        let mut w = GoWriter::new();
        w.write("foo");
        w.indent_block(2, |w| w.write("bar"));
        w.write("baz");
        assert_eq!(w.output(), "foo\n\t\tbar\nbaz\n");
    }

    #[test]
    fn test_write_multiline_skips_blank_lines() {
        let mut w = GoWriter::new();
        w.indent(2);
        w.write("foo\n\nbar\nbaz\n");
        assert_eq!(w.output(), "\t\tfoo\n\t\tbar\n\t\tbaz\n");
    }

    #[test]
    fn test_dedent() {
        let mut w = GoWriter::new();
        w.indent(4);
        w.dedent(3);
        w.write("foo");
        assert_eq!(w.output(), "\tfoo\n");
    }

    #[test]
    fn test_checked_calls() {
        let mut w = GoWriter::new();
        w.write_checked_call1("πg.DelVar(πF, πGlobals, ßx)");
        w.write_checked_call2("πTemp001", "πg.ResolveGlobal(πF, πGlobals, ßx)");
        assert_eq!(
            w.output(),
            "if πE = πg.DelVar(πF, πGlobals, ßx); πE != nil {\n\tcontinue\n}\n\
             if πTemp001, πE = πg.ResolveGlobal(πF, πGlobals, ßx); πE != nil {\n\tcontinue\n}\n"
        );
    }

    #[test]
    fn test_write_label_is_outdented() {
        let mut w = GoWriter::new();
        w.indent(1);
        w.write_label(3);
        w.write("x");
        assert_eq!(w.output(), "Label3:\n\tx\n");
    }

    #[test]
    fn test_write_block_dispatches_checkpoints() {
        let mut w = GoWriter::new();
        w.write_block(&[2], "BODY");
        assert_eq!(
            w.output(),
            "for ; πF.State() >= 0; πF.PopCheckpoint() {\n\
             \tswitch πF.State() {\n\
             \tcase 0:\n\
             \tcase 2: goto Label2\n\
             \tdefault: panic(\"unexpected function state\")\n\
             \t}\n\
             BODY\n\
             }\n"
        );
    }

    #[test]
    fn test_import_block_empty() {
        let mut w = GoWriter::new();
        w.write_import_block(Vec::<(String, String)>::new());
        assert_eq!(w.output(), "");
    }

    #[test]
    fn test_import_block_sorted() {
        let mut w = GoWriter::new();
        w.write_import_block(vec![("c", "π_c"), ("a", "π_a"), ("b", "π_b")]);
        assert_eq!(w.output(), "import (\n\tπ_a \"a\"\n\tπ_b \"b\"\n\tπ_c \"c\"\n)\n");
    }

    #[test]
    fn test_py_context() {
        let mut w = GoWriter::new();
        w.write_py_context(12, "print \"foo\"");
        assert_eq!(w.output(), "// line 12: print \"foo\"\n");
    }

    #[test]
    fn test_go_str() {
        assert_eq!(go_str("foo"), "\"foo\"");
        assert_eq!(go_str("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(go_str("tab\there\n"), "\"tab\\there\\n\"");
        assert_eq!(go_str("é"), "\"\\xc3\\xa9\"");
    }
}
