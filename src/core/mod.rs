//! Core business logic abstractions

pub mod config;
pub mod deadline;
pub mod error;
pub mod log;
pub mod quote;

// Re-export main types for cleaner imports
pub use deadline::{Deadline, DeadlineExceeded};
pub use error::{ClientError, FetchError, StoreError};
pub use quote::{Quote, QuoteProvider, QuoteRecord, QuoteResponse, QuoteStore};
