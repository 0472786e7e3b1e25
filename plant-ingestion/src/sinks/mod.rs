pub mod sqlite;

pub use sqlite::SqlitePlantSink;
