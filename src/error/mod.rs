pub mod global;

pub use global::{GridError, GridResult};
pub use gridcover_error::{ConfigError, ErrorExt, StatusCode, StoreError, StoreResult};
