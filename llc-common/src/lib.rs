//! Low-Level Compiler - Common Types
//! 
//! This crate contains the storage-slot model shared by the IR and the
//! emitter: variables, the variable store query interface, and its
//! in-memory table implementation.

pub mod error;
pub mod types;
pub mod store;

pub use error::StoreError;
pub use types::Variable;
pub use store::{VariableStore, VariableTable, VariableEntry, RESULT_VARIABLE};
