pub mod reader_source;
