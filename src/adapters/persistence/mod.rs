//! Response sink adapters.

mod file_sink;
mod in_memory;

pub use file_sink::FileResponseSink;
pub use in_memory::InMemoryResponseSink;
