//! Interval records and the block arena that owns them
//!
//! The partition of the domain is a singly linked chain of [`Interval`]
//! records. Links are [`IntervalId`] indices into an [`IntervalStore`], never
//! references, so splicing and chopping cannot leave dangling links.
//! Storage grows in blocks of [`BLOCK_SIZE`] records; released records go to
//! a free list and are reused before the store grows again.

use std::ops::{Index, IndexMut};

use crate::types::IntervalId;

/// Number of records added to the arena whenever the free list runs dry.
pub const BLOCK_SIZE: usize = 32;

/// One piece `[x, next.x]` of the partition.
///
/// The hat is the tangent at `x` on `[x, ip]` and the tangent at `next.x` on
/// `[ip, next.x]`; the squeeze is the secant between the two transformed
/// points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Construction point
    pub x: f64,
    /// PDF at `x`
    pub fx: f64,
    /// Transformed PDF at `x`
    pub tfx: f64,
    /// Derivative of the transformed PDF at `x` (`+inf` for a vertical tangent)
    pub dtfx: f64,
    /// Slope of the squeeze secant towards the next construction point
    pub sq: f64,
    /// Division point between the two tangents
    pub ip: f64,
    /// Hat area on `[x, ip]`
    pub ahatl: f64,
    /// Hat area on `[ip, next.x]`
    pub ahatr: f64,
    /// Squeeze area on `[x, next.x]`
    pub asqueeze: f64,
    /// Cumulative hat area up to and including this interval
    pub acum: f64,
    /// Successor in the chain; `None` marks the terminal sentinel
    pub next: Option<IntervalId>,
}

impl Interval {
    /// Create a record for construction point `x`. Areas are zero until the
    /// parameters are computed.
    pub fn new(x: f64, fx: f64, tfx: f64, dtfx: f64) -> Self {
        Self {
            x,
            fx,
            tfx,
            dtfx,
            sq: 0.0,
            ip: x,
            ahatl: 0.0,
            ahatr: 0.0,
            asqueeze: 0.0,
            acum: 0.0,
            next: None,
        }
    }

    /// Total hat area over the interval.
    #[inline]
    pub fn ahat(&self) -> f64 {
        self.ahatl + self.ahatr
    }

    /// True for the right-most record, which only carries the right boundary.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }

    /// True when the density vanishes at `x`; the tangent there is vertical.
    #[inline]
    pub fn has_vertical_tangent(&self) -> bool {
        !(self.fx > 0.0)
    }

    /// Reset every derived quantity (used for the terminal sentinel).
    pub fn clear_areas(&mut self) {
        self.sq = 0.0;
        self.ip = self.x;
        self.ahatl = 0.0;
        self.ahatr = 0.0;
        self.asqueeze = 0.0;
    }
}

/// Arena of interval records addressed by stable indices.
#[derive(Debug, Clone, Default)]
pub struct IntervalStore {
    slots: Vec<Interval>,
    in_use: Vec<bool>,
    free: Vec<IntervalId>,
    blocks: usize,
}

impl IntervalStore {
    /// Create an empty store. No memory is reserved until the first
    /// allocation.
    pub fn new() -> Self {
        Self::default()
    }

    fn grow(&mut self) {
        let start = self.slots.len();
        let blank = Interval::new(0.0, 0.0, f64::NEG_INFINITY, f64::INFINITY);
        self.slots.extend(std::iter::repeat_n(blank, BLOCK_SIZE));
        self.in_use.extend(std::iter::repeat_n(false, BLOCK_SIZE));
        // pop() hands out the lowest index of the block first
        self.free
            .extend((start..start + BLOCK_SIZE).rev().map(IntervalId::new));
        self.blocks += 1;
    }

    /// Store `interval` and return its id.
    pub fn alloc(&mut self, interval: Interval) -> IntervalId {
        if self.free.is_empty() {
            self.grow();
        }
        let id = match self.free.pop() {
            Some(id) => id,
            None => unreachable!("grow() always refills the free list"),
        };
        self.slots[id.index()] = interval;
        self.in_use[id.index()] = true;
        id
    }

    /// Return a record to the free list.
    pub fn release(&mut self, id: IntervalId) {
        debug_assert!(self.in_use[id.index()], "double release of interval {id}");
        self.in_use[id.index()] = false;
        self.free.push(id);
    }

    /// Allocate `interval` and splice it into the chain right after `id`.
    pub fn insert_after(&mut self, id: IntervalId, mut interval: Interval) -> IntervalId {
        interval.next = self.slots[id.index()].next;
        let new_id = self.alloc(interval);
        self.slots[id.index()].next = Some(new_id);
        new_id
    }

    /// Unlink the successor of `id` from the chain and release it.
    ///
    /// Returns the removed record, or `None` when `id` is the last record.
    pub fn remove_after(&mut self, id: IntervalId) -> Option<Interval> {
        let victim = self.slots[id.index()].next?;
        let removed = self.slots[victim.index()];
        self.slots[id.index()].next = removed.next;
        self.release(victim);
        Some(removed)
    }

    /// Iterate over the chain starting at `head`, yielding ids and records.
    pub fn chain(&self, head: IntervalId) -> Chain<'_> {
        Chain {
            store: self,
            cursor: Some(head),
        }
    }

    /// Number of records currently in use.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of records the arena can hold without growing.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of blocks allocated so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// True if `id` refers to a record in use.
    pub fn is_live(&self, id: IntervalId) -> bool {
        self.in_use.get(id.index()).copied().unwrap_or(false)
    }
}

impl Index<IntervalId> for IntervalStore {
    type Output = Interval;

    fn index(&self, id: IntervalId) -> &Interval {
        &self.slots[id.index()]
    }
}

impl IndexMut<IntervalId> for IntervalStore {
    fn index_mut(&mut self, id: IntervalId) -> &mut Interval {
        &mut self.slots[id.index()]
    }
}

/// Iterator over an interval chain.
pub struct Chain<'a> {
    store: &'a IntervalStore,
    cursor: Option<IntervalId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (IntervalId, &'a Interval);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let interval = &self.store[id];
        self.cursor = interval.next;
        Some((id, interval))
    }
}
