//! A writer that keeps fragments as data.

use crate::CodeWriter;

/// One emitted instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Raw(String),
    CheckedCall { call: String },
    CheckedCallResult { result: String, call: String },
    Label(u32),
}

/// Records every fragment in emission order.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    fragments: Vec<Fragment>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Drain the fragments recorded so far.
    pub fn take(&mut self) -> Vec<Fragment> {
        std::mem::take(&mut self.fragments)
    }
}

impl CodeWriter for RecordingWriter {
    fn write(&mut self, output: &str) {
        self.fragments.push(Fragment::Raw(output.to_string()));
    }

    fn write_checked_call1(&mut self, call: &str) {
        self.fragments.push(Fragment::CheckedCall {
            call: call.to_string(),
        });
    }

    fn write_checked_call2(&mut self, result: &str, call: &str) {
        self.fragments.push(Fragment::CheckedCallResult {
            result: result.to_string(),
            call: call.to_string(),
        });
    }

    fn write_label(&mut self, id: u32) {
        self.fragments.push(Fragment::Label(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut w = RecordingWriter::new();
        w.write_checked_call1("a()");
        w.write("x = y");
        w.write_label(1);
        assert_eq!(
            w.take(),
            vec![
                Fragment::CheckedCall { call: "a()".to_string() },
                Fragment::Raw("x = y".to_string()),
                Fragment::Label(1),
            ]
        );
        assert!(w.fragments().is_empty());
    }
}
