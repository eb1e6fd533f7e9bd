//! FX engine error types.

use fxrate_common::{Currency, RateKind};
use thiserror::Error;

/// Errors that can occur in the rate cache and conversion engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// No source registered under the given name.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A source with this name is already registered.
    #[error("source already registered: {0}")]
    DuplicateSource(String),

    /// No direct, inverse or triangulated path exists for the pair.
    #[error("no rate for {from}/{to}")]
    NoRate { from: Currency, to: Currency },

    /// A path exists but the source does not publish the requested kind.
    #[error("{kind} rate not published for {from}/{to}")]
    RateTypeUnavailable {
        from: Currency,
        to: Currency,
        kind: RateKind,
    },

    /// The source adapter failed and no previous snapshot is servable.
    #[error("fetch failed for source {source_name}: {message}")]
    FetchFailed { source_name: String, message: String },
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
