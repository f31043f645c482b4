use thiserror::Error;

use crate::fetch::FetchError;
use crate::store::StoreError;
use marquee_feed::FeedParseError;

/// Systemic failures that abort a sync run. Row-level problems never surface
/// here; they accumulate inside the run's report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("source payload rejected: {0}")]
    Payload(#[from] FeedParseError),

    #[error("datastore failure: {0}")]
    Store(#[from] StoreError),
}
