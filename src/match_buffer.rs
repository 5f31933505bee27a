/*!
Capture-slot storage filled in by an execution.

A [`MatchBuffer`] holds one pair of slots per capture group plus one for the
whole match. A slot is either set to a code unit offset or unset; an unset
pair means the group did not participate in the match.
*/

use regex_automata::util::primitives::NonMaxUsize;
use regex_automata::Span;

use crate::error::Error;

/// Capture pairs produced by a successful execution.
///
/// Pair `0` is the whole match. Before an execution, every pair is unset.
/// After a successful one, every pair is either unset or a span with
/// `start <= end <= input.len()`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchBuffer {
    slots: Vec<Option<NonMaxUsize>>,
}

impl MatchBuffer {
    /// Creates an empty buffer. It is sized by the first execution that uses
    /// it.
    pub fn new() -> MatchBuffer {
        MatchBuffer { slots: Vec::new() }
    }

    /// Returns the number of pairs in this buffer.
    pub fn pair_count(&self) -> usize {
        self.slots.len() / 2
    }

    /// Returns the span of the given pair, or `None` if it is unset or out of
    /// range.
    pub fn get(&self, pair: usize) -> Option<Span> {
        let start = self.slots.get(pair * 2).copied()??;
        let end = self.slots.get(pair * 2 + 1).copied()??;
        Some(Span { start: start.get(), end: end.get() })
    }

    /// Returns the span of the whole match.
    pub fn whole_match(&self) -> Option<Span> {
        self.get(0)
    }

    /// Returns an iterator over every pair in group order.
    pub fn iter(&self) -> impl Iterator<Item = Option<Span>> + '_ {
        (0..self.pair_count()).map(move |i| self.get(i))
    }

    /// Resizes the buffer to `pair_count` pairs and resets every pair to
    /// unset. Growth uses a fallible reservation.
    pub(crate) fn alloc_or_expand(&mut self, pair_count: usize) -> Result<(), Error> {
        let len = pair_count.checked_mul(2).ok_or_else(Error::out_of_memory)?;
        if len > self.slots.len() {
            self.slots.try_reserve_exact(len - self.slots.len())?;
        }
        self.slots.clear();
        self.slots.resize(len, None);
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<NonMaxUsize>] {
        &mut self.slots
    }

    /// Adds `amount` to every set bound.
    pub(crate) fn displace(&mut self, amount: usize) {
        if amount == 0 {
            return;
        }
        for slot in self.slots.iter_mut().flatten() {
            // OK because displaced offsets never exceed the haystack length.
            *slot = NonMaxUsize::new(slot.get() + amount).unwrap();
        }
    }

    /// Returns true when every set pair is a valid span within `[0, len]`
    /// and every pair is either fully set or fully unset.
    pub(crate) fn check_against(&self, len: usize) -> bool {
        self.slots.chunks(2).all(|pair| match (pair[0], pair[1]) {
            (None, None) => true,
            (Some(start), Some(end)) => start.get() <= end.get() && end.get() <= len,
            _ => false,
        })
    }
}
