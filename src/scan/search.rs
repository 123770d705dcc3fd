use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Error type of a search collaborator. Its retry and backoff policy is its
/// own business; a failure here aborts the current step.
pub type SearchFailure = Box<dyn std::error::Error + Send + Sync>;

/// What a search returned for one rectangle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Number of results reported, possibly clipped by the provider's
    /// pagination cap.
    pub results_count: u32,
    pub place_ids: Vec<String>,
}

/// External place search over a rectangle.
pub trait PlaceSearch: Send + Sync {
    fn search(
        &self,
        bbox: &BoundingBox,
    ) -> Result<SearchOutcome, SearchFailure>;
}

impl SearchOutcome {
    pub fn new(place_ids: Vec<String>) -> Self {
        Self {
            results_count: u32::try_from(place_ids.len()).unwrap_or(u32::MAX),
            place_ids,
        }
    }
}

impl<F> PlaceSearch for F
where
    F: Fn(&BoundingBox) -> Result<SearchOutcome, SearchFailure> + Send + Sync,
{
    fn search(
        &self,
        bbox: &BoundingBox,
    ) -> Result<SearchOutcome, SearchFailure> {
        self(bbox)
    }
}
