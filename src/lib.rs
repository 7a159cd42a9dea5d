pub mod api;
pub mod autofill;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod llm;
pub mod providers;

// Re-export commonly used items
pub use autofill::{FieldDescriptor, FormFiller, StructuredResponse};
pub use error::AutofillError;
