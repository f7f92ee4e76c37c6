//! The on-disk command log.
//!
//! While a build runs, every intercepted process appends length-delimited
//! records to one shared file; afterwards the driver compacts the stream
//! into a single `Log` manifest that the offline tools consume.

mod compact;
mod frame;
mod reader;
mod record;
mod writer;

pub use compact::{compact, read_log};
pub use reader::decode_stream;
pub use record::{Log, Meta, Record};
pub use writer::append_record;
