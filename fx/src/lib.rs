//! fxrate FX Engine
//!
//! Rate cache and conversion engine: stores quoted rates per source,
//! decides when a source must be re-fetched, and answers conversion
//! queries against the cached graph.
//!
//! # Features
//!
//! - Direct, inverse and anchor-triangulated pair resolution
//! - Cash, remit and middle rate selection with unit scaling
//! - Per-source freshness state machine with refresh deduplication
//! - Scheduled background refresh per registered source
//!
//! # Example
//!
//! ```rust,ignore
//! use fxrate_fx::{convert, Registry};
//! use fxrate_common::{ConversionDirection, Currency, RateKind};
//!
//! let registry = Registry::new();
//! registry.register(adapter)?;
//!
//! let graph = registry.ensure_fresh("hsbc.cn").await?;
//! let answer = convert(
//!     &graph,
//!     Currency::cny(),
//!     Currency::usd(),
//!     RateKind::Remit,
//!     amount,
//!     ConversionDirection::Forward,
//! )?;
//! ```

pub mod cache;
pub mod convert;
pub mod error;
pub mod graph;
pub mod registry;
pub mod source;

pub use cache::{CacheStatus, SourceCache};
pub use convert::{convert, resolved_rate, updated_date};
pub use error::{FxError, FxResult};
pub use graph::{LegDirection, Lookup, RateGraph, ResolvedLeg};
pub use registry::{Registry, DEFAULT_REFRESH_INTERVAL};
pub use source::{RateSource, SourceError};

#[cfg(any(test, feature = "test-utils"))]
pub use source::MockRateSource;
