use std::{any::Any, io};

use gridcover_error::{ConfigError, ErrorExt, StatusCode, StoreError};
use thiserror::Error;

use crate::{
    grid::{CellId, CellStatus},
    scan::SearchFailure,
};

pub type GridResult<T> = Result<T, GridError>;

#[derive(Error, Debug)]
pub enum GridError {
    // ==== Startup ====
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    // ==== Collaborators ====
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Search failed for cell {cell}: {source}")]
    Search {
        cell: CellId,
        #[source]
        source: SearchFailure,
    },

    #[error("Cell {cell} is {status} and no longer accepts results")]
    CellClosed { cell: CellId, status: CellStatus },

    // ==== Grid versions ====
    #[error("Grid version '{version}' already holds {cells} cells")]
    TargetVersionNotEmpty { version: String, cells: usize },
}

impl ErrorExt for GridError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(e) => e.status_code(),
            Self::Source(_) => StatusCode::ConfigLoadFailed,
            Self::InvalidBoundary(_) => StatusCode::InvalidBoundary,
            Self::Store(e) => e.status_code(),
            Self::Io(_) => StatusCode::Io,
            Self::Search { .. } => StatusCode::SearchFailed,
            Self::CellClosed { .. } => StatusCode::CellClosed,
            Self::TargetVersionNotEmpty { .. } => StatusCode::VersionConflict,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::Config(e) => e.client_message(),
            Self::Store(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
