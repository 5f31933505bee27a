/*!
An insertion-ordered set of instruction ids with constant time insert,
membership test and clear.

The Pike VM keeps two of these per search: the threads alive at the current
position and the threads being built for the next one. Iteration order is
thread priority, which is what gives leftmost-first match semantics.

Based on https://research.swtch.com/sparse, without uninitialized memory.
*/

use regex_automata::util::primitives::StateID;

#[derive(Clone, Debug)]
pub(crate) struct SparseSet {
    len: usize,
    /// Members in insertion order.
    dense: Vec<StateID>,
    /// `sparse[id]` is the position of `id` in `dense`, if it is a member.
    sparse: Vec<usize>,
}

impl SparseSet {
    /// Creates a set able to hold the ids `0..capacity`.
    pub(crate) fn new(capacity: usize) -> SparseSet {
        SparseSet { len: 0, dense: vec![StateID::ZERO; capacity], sparse: vec![0; capacity] }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `id` and returns true if it was not already a member.
    ///
    /// # Panics
    ///
    /// When `id` is not below the capacity of this set.
    #[cfg_attr(feature = "perf-inline", inline(always))]
    pub(crate) fn insert(&mut self, id: StateID) -> bool {
        if self.contains(id) {
            return false;
        }
        self.dense[self.len] = id;
        self.sparse[id.as_usize()] = self.len;
        self.len += 1;
        true
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    pub(crate) fn contains(&self, id: StateID) -> bool {
        let index = self.sparse[id.as_usize()];
        index < self.len && self.dense[index] == id
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = StateID> + '_ {
        self.dense[..self.len].iter().copied()
    }
}
