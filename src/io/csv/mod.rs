//! Delimited text reading and writing.

mod read;
mod write;

pub use read::read_voter_file;
pub(crate) use write::write_csv;
