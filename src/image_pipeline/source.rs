//! Raw byte sources

pub mod data_source;
pub mod row_reader;

pub use data_source::{FileDataSource, ImageDataSource, MemoryDataSource, SharedDataSource};
pub use row_reader::RowReader;
