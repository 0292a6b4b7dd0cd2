pub mod sqlite;

pub use sqlite::SqliteQuoteStore;
