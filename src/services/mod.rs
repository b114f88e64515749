pub mod archive;
pub mod blend;
pub mod export_parser;
pub mod ingest;

pub use blend::blend;
