//! Cumulative areas and the guide table
//!
//! The guide table turns the search for the interval that holds a given
//! cumulative hat area into an O(1) expected lookup. Slot `j` points at the
//! first interval whose cumulative area reaches `j * Atotal / size`.

use crate::{tdr::interval::IntervalStore, types::IntervalId};

/// Totals gathered while accumulating areas along the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    /// Number of non-terminal intervals
    pub n_intervals: usize,
    /// Sum of hat areas
    pub hat_area: f64,
    /// Sum of squeeze areas
    pub squeeze_area: f64,
}

/// Recompute `Acum` for every interval and return the totals.
///
/// The terminal sentinel gets `Acum = +inf` so that no lookup ever stops
/// there.
pub fn accumulate(store: &mut IntervalStore, head: IntervalId) -> Totals {
    let mut totals = Totals {
        n_intervals: 0,
        hat_area: 0.0,
        squeeze_area: 0.0,
    };

    let mut cursor = Some(head);
    while let Some(id) = cursor {
        let iv = &mut store[id];
        if iv.is_terminal() {
            iv.acum = f64::INFINITY;
            break;
        }
        totals.hat_area += iv.ahat();
        totals.squeeze_area += iv.asqueeze;
        totals.n_intervals += 1;
        iv.acum = totals.hat_area;
        cursor = iv.next;
    }
    totals
}

/// Step to the successor unless that would land on the terminal sentinel.
#[inline]
fn step(store: &IntervalStore, id: IntervalId) -> Option<IntervalId> {
    store[id].next.filter(|next| !store[*next].is_terminal())
}

/// Index from uniform numbers into the interval chain.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideTable {
    slots: Vec<IntervalId>,
    hat_area: f64,
}

impl GuideTable {
    /// Build a table with `max(1, ceil(n_intervals * guide_factor))` slots.
    ///
    /// Expects `Acum` to be current (see [`accumulate`]).
    pub fn build(
        store: &IntervalStore,
        head: IntervalId,
        totals: &Totals,
        guide_factor: f64,
    ) -> Self {
        let size = ((totals.n_intervals as f64 * guide_factor).ceil() as usize).max(1);
        let step_area = totals.hat_area / size as f64;

        let mut slots = Vec::with_capacity(size);
        let mut cursor = head;
        for j in 0..size {
            let target = j as f64 * step_area;
            while store[cursor].acum < target {
                match step(store, cursor) {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
            slots.push(cursor);
        }

        Self {
            slots,
            hat_area: totals.hat_area,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the table has no slots (never the case after [`build`](Self::build)).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot contents in order.
    pub fn slots(&self) -> &[IntervalId] {
        &self.slots
    }

    /// Total hat area the table was built for.
    pub fn hat_area(&self) -> f64 {
        self.hat_area
    }

    /// The interval holding cumulative area `u * Atotal`, for `u` in `[0, 1)`.
    ///
    /// Never returns the terminal sentinel (unless the chain has no other
    /// record).
    pub fn locate(&self, store: &IntervalStore, u: f64) -> IntervalId {
        let size = self.slots.len();
        let j = ((u * size as f64) as usize).min(size.saturating_sub(1));
        let mut id = self.slots[j];

        let target = u * self.hat_area;
        while store[id].acum < target {
            match step(store, id) {
                Some(next) => id = next,
                None => break,
            }
        }
        id
    }
}
