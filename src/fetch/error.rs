//! Fetch error taxonomy.

use crate::cache::CacheKey;
use crate::session::SessionAcquisitionError;
use crate::upstream::UpstreamError;

/// Why a fetch produced no payload.
///
/// `Clone` so coalesced callers can all receive the same failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Session(#[from] SessionAcquisitionError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to fetch {cache_key} after {attempts} attempts: {last}")]
    Exhausted {
        cache_key: CacheKey,
        attempts: u32,
        last: Box<FetchError>,
    },

    #[error("fetch for {0} was interrupted")]
    Interrupted(CacheKey),
}

impl FetchError {
    /// The innermost cause, looking through `Exhausted`.
    pub fn root_cause(&self) -> &FetchError {
        match self {
            FetchError::Exhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}
