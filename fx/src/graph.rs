//! Per-source rate graph with direct, inverse and triangulated lookup.

use std::collections::{BTreeSet, HashMap};

use fxrate_common::{Currency, RateQuad, Timestamp};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// How a leg of a lookup was resolved against the stored entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegDirection {
    /// The stored entry matches the queried order.
    Forward,
    /// The stored entry is keyed the other way round; the numeric
    /// computation must be inverted.
    Inverse,
}

/// One stored entry participating in a lookup, with its orientation.
#[derive(Debug, Clone)]
pub struct ResolvedLeg {
    pub quad: RateQuad,
    pub direction: LegDirection,
}

/// Result of resolving a currency pair against the graph.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// A single direct or inverse entry covers the pair.
    Single(ResolvedLeg),
    /// Two legs through the anchor currency: `first` goes from the
    /// queried `from` to the anchor, `second` from the anchor to the
    /// queried `to`.
    Triangulated {
        first: ResolvedLeg,
        second: ResolvedLeg,
    },
}

impl Lookup {
    /// The observation time of the entries used; for triangulated pairs
    /// the older leg, since the answer is only as fresh as its weakest
    /// input.
    pub fn updated_at(&self) -> Timestamp {
        match self {
            Lookup::Single(leg) => leg.quad.observed_at,
            Lookup::Triangulated { first, second } => {
                first.quad.observed_at.min(second.quad.observed_at)
            }
        }
    }
}

#[derive(Debug, Default)]
struct GraphInner {
    entries: HashMap<(Currency, Currency), RateQuad>,
    anchor: Option<Currency>,
}

impl GraphInner {
    /// The anchor is the source's home currency: the one appearing in
    /// the majority of entries. Ties resolve to the smallest code so
    /// the choice is deterministic.
    fn recompute_anchor(&mut self) {
        let mut counts: HashMap<Currency, usize> = HashMap::new();
        for (from, to) in self.entries.keys() {
            *counts.entry(*from).or_default() += 1;
            *counts.entry(*to).or_default() += 1;
        }
        self.anchor = counts
            .into_iter()
            .max_by(|(ca, na), (cb, nb)| na.cmp(nb).then_with(|| cb.cmp(ca)))
            .map(|(currency, _)| currency);
    }

    fn resolve_single(&self, from: Currency, to: Currency) -> Option<ResolvedLeg> {
        if let Some(quad) = self.entries.get(&(from, to)) {
            return Some(ResolvedLeg {
                quad: quad.clone(),
                direction: LegDirection::Forward,
            });
        }
        self.entries.get(&(to, from)).map(|quad| ResolvedLeg {
            quad: quad.clone(),
            direction: LegDirection::Inverse,
        })
    }
}

/// Stores the quoted rates of one source and answers pair lookups.
///
/// The store is swapped wholesale on refresh; readers concurrent with a
/// swap observe either the old or the new contents, never a mix.
#[derive(Debug, Default)]
pub struct RateGraph {
    inner: RwLock<GraphInner>,
}

impl RateGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry keyed by the quad's pair.
    pub fn put(&self, quad: RateQuad) {
        if quad.from == quad.to {
            debug!(pair = %quad, "Ignoring self-referential quote");
            return;
        }
        let mut inner = self.inner.write();
        inner.entries.insert(quad.pair(), quad);
        inner.recompute_anchor();
    }

    /// Apply a refresh batch atomically.
    ///
    /// A batch of N records replaces exactly those N keys; entries not
    /// revisited by the batch survive as their last known value.
    pub fn replace_all(&self, quads: Vec<RateQuad>) {
        let mut inner = self.inner.write();
        for quad in quads {
            if quad.from == quad.to {
                continue;
            }
            inner.entries.insert(quad.pair(), quad);
        }
        inner.recompute_anchor();
    }

    /// Resolve a pair: direct entry, then inverse entry, then two legs
    /// through the anchor currency.
    pub fn lookup(&self, from: Currency, to: Currency) -> FxResult<Lookup> {
        let inner = self.inner.read();

        if let Some(leg) = inner.resolve_single(from, to) {
            return Ok(Lookup::Single(leg));
        }

        if let Some(anchor) = inner.anchor {
            if anchor != from && anchor != to {
                if let (Some(first), Some(second)) = (
                    inner.resolve_single(from, anchor),
                    inner.resolve_single(anchor, to),
                ) {
                    return Ok(Lookup::Triangulated { first, second });
                }
            }
        }

        Err(FxError::NoRate { from, to })
    }

    /// All currencies one hop away from `base`, excluding `base` itself.
    pub fn counter_currencies(&self, base: Currency) -> BTreeSet<Currency> {
        let inner = self.inner.read();
        inner
            .entries
            .keys()
            .filter_map(|&(from, to)| {
                if from == base {
                    Some(to)
                } else if to == base {
                    Some(from)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Every currency appearing in any stored pair, sorted.
    pub fn currencies(&self) -> BTreeSet<Currency> {
        let inner = self.inner.read();
        inner
            .entries
            .keys()
            .flat_map(|&(from, to)| [from, to])
            .collect()
    }

    /// The observation time backing the pair's resolution.
    pub fn updated_at(&self, from: Currency, to: Currency) -> FxResult<Timestamp> {
        Ok(self.lookup(from, to)?.updated_at())
    }

    /// The anchor currency, if the graph has any entries.
    pub fn anchor(&self) -> Option<Currency> {
        self.inner.read().anchor
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the graph holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}
