/*!
Natively compiled bodies.

These wrap a `regex_automata::meta::Regex` built from the same `Hir` the
byte-code compiler consumes. The meta engine searches UTF-8, so a narrow
(Latin-1) haystack is transcoded before the search and the resulting offsets
are mapped back to code units. Only the part of the haystack a search can
observe is transcoded: everything from the start offset on, plus the one unit
before it for look-behind assertions. An ASCII tail is already valid UTF-8 and
is searched in place.
*/

use std::borrow::Cow;

use log::debug;
use regex_automata::util::primitives::NonMaxUsize;
use regex_automata::{meta, Anchored, Input, MatchKind};
use regex_syntax::hir::Hir;

use crate::pattern::CompileMode;

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub(crate) struct NativeCode {
    regex: meta::Regex,
    mode: CompileMode,
}

impl NativeCode {
    /// Builds a native body, or returns `None` when the meta engine refuses
    /// the pattern (usually because it exceeds `size_limit`).
    pub(crate) fn new(
        hir: &Hir,
        mode: CompileMode,
        size_limit: Option<usize>,
    ) -> Option<NativeCode> {
        let config =
            meta::Config::new().match_kind(MatchKind::LeftmostFirst).nfa_size_limit(size_limit);
        match meta::Builder::new().configure(config).build_from_hir(hir) {
            Ok(regex) => {
                debug!("native body built ({} bytes)", regex.memory_usage());
                Some(NativeCode { regex, mode })
            }
            Err(err) => {
                debug!("native body skipped: {}", err);
                None
            }
        }
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.regex.memory_usage()
    }

    /// Searches `haystack` from `start`. In normal mode the slots of the
    /// match are written to `slots` as code unit offsets.
    pub(crate) fn search(
        &self,
        haystack: &[u8],
        start: usize,
        anchored: bool,
        slots: &mut [Option<NonMaxUsize>],
    ) -> bool {
        let text = Transcoded::new(haystack, start);
        let anchored = if anchored { Anchored::Yes } else { Anchored::No };
        let input = Input::new(&*text.bytes)
            .span(text.to_byte(start)..text.bytes.len())
            .anchored(anchored);
        match self.mode {
            CompileMode::MatchOnly => self.regex.is_match(input),
            CompileMode::Normal => {
                if self.regex.search_slots(&input, slots).is_none() {
                    return false;
                }
                for slot in slots.iter_mut() {
                    *slot = slot.and_then(|offset| NonMaxUsize::new(text.to_unit(offset.get())));
                }
                true
            }
        }
    }
}

/// The tail of a Latin-1 haystack re-encoded as UTF-8.
struct Transcoded<'h> {
    bytes: Cow<'h, [u8]>,
    /// The code unit offset in the haystack where `bytes` begins.
    base: usize,
    /// The byte offset of every code unit from `base` on, plus the end.
    /// Absent when the tail is ASCII and both offset spaces coincide.
    offsets: Option<Vec<usize>>,
}

impl<'h> Transcoded<'h> {
    /// Transcodes the units a search from `start` can observe.
    fn new(haystack: &'h [u8], start: usize) -> Transcoded<'h> {
        let base = start.saturating_sub(1);
        let tail = &haystack[base..];
        if tail.is_ascii() {
            return Transcoded { bytes: Cow::Borrowed(tail), base, offsets: None };
        }
        let mut bytes = Vec::with_capacity(tail.len() * 2);
        let mut offsets = Vec::with_capacity(tail.len() + 1);
        for &unit in tail {
            offsets.push(bytes.len());
            let mut buf = [0; 4];
            bytes.extend_from_slice(char::from(unit).encode_utf8(&mut buf).as_bytes());
        }
        offsets.push(bytes.len());
        Transcoded { bytes: Cow::Owned(bytes), base, offsets: Some(offsets) }
    }

    fn to_byte(&self, unit: usize) -> usize {
        let unit = unit - self.base;
        match self.offsets {
            None => unit,
            Some(ref offsets) => offsets[unit],
        }
    }

    /// Maps a byte offset reported by the meta engine back to a code unit
    /// offset. Reported offsets always fall on character boundaries.
    fn to_unit(&self, byte: usize) -> usize {
        let unit = match self.offsets {
            None => byte,
            Some(ref offsets) => offsets.binary_search(&byte).unwrap_or_else(|i| i),
        };
        self.base + unit
    }
}
