mod writer;

#[cfg(test)]
pub use writer::MockWriter;
pub use writer::{MessageWriter, StdoutWriter};
