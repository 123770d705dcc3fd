pub mod config;
pub mod store;

// Public export of all error types from the nested modules.
pub use config::*;
pub use store::*;
