//! grumble_writer: Output side of code generation.
//!
//! Scope operations do not format Go code themselves. They hand fragments to
//! a [`CodeWriter`], which knows two shapes of instruction besides plain
//! text: a checked call whose only effect is a possible failure, and a
//! checked call that also stores one result. [`GoWriter`] renders them as Go
//! source; [`RecordingWriter`] keeps them as data.

mod go;
mod recording;

pub use go::{go_str, GoWriter};
pub use recording::{Fragment, RecordingWriter};

/// The instruction sink used by scope operations and the driver.
pub trait CodeWriter {
    /// Emit a plain statement, e.g. a direct slot assignment.
    fn write(&mut self, output: &str);

    /// Emit a call to a runtime primitive that may fail. A failure leaves the
    /// enclosing generated function.
    fn write_checked_call1(&mut self, call: &str);

    /// Like [`write_checked_call1`](Self::write_checked_call1), storing the
    /// call's value into `result` on success.
    fn write_checked_call2(&mut self, result: &str, call: &str);

    /// Emit the jump target for label `id`.
    fn write_label(&mut self, id: u32);
}
