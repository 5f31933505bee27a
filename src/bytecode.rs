/*!
Byte-code programs and their compiler.

A [`Program`] is a Thompson-style instruction graph specialized for one
execution mode and one character width. It is executed by the Pike VM in
[`crate::engines::pikevm`].

Width specialization happens at compile time: literal characters and class
ranges are lowered to code unit values of the target width. Characters that
cannot be represented in the width compile to [`Inst::Fail`], and class ranges
are clipped to the largest code unit of the width. In the wide width an astral
literal becomes its surrogate pair, matched unit by unit.

In [`CompileMode::MatchOnly`] no `Save` instructions are emitted at all, since
nobody will read the slots.
*/

use core::mem::size_of;

use regex_automata::util::primitives::StateID;
use regex_syntax::hir::{self, Class, Hir, HirKind, Look};

use crate::error::Error;
use crate::input::CharWidth;
use crate::pattern::CompileMode;


/// A single byte-code instruction.
#[derive(Clone, Debug)]
pub(crate) enum Inst {
    /// The whole program matched.
    Match,
    /// Never matches. Used for characters unrepresentable in the width.
    Fail,
    /// An unconditional epsilon transition.
    Goto { next: StateID },
    /// Consumes one code unit equal to `unit`.
    Unit { unit: u32, next: StateID },
    /// Consumes one code unit that falls in one of the sorted, disjoint
    /// inclusive ranges.
    Ranges { ranges: Box<[(u32, u32)]>, next: StateID },
    /// A zero-width assertion.
    Look { look: Look, next: StateID },
    /// Records the current offset into a capture slot.
    Save { slot: usize, next: StateID },
    /// Epsilon transitions to every alternate, in priority order.
    Union { alternates: Vec<StateID> },
}

impl Inst {
    /// Returns true when this instruction consumes `unit`.
    #[cfg_attr(feature = "perf-inline", inline(always))]
    pub(crate) fn matches_unit(&self, unit: u32) -> bool {
        match *self {
            Inst::Unit { unit: expected, .. } => unit == expected,
            Inst::Ranges { ref ranges, .. } => ranges
                .binary_search_by(|&(start, end)| {
                    if end < unit {
                        core::cmp::Ordering::Less
                    } else if start > unit {
                        core::cmp::Ordering::Greater
                    } else {
                        core::cmp::Ordering::Equal
                    }
                })
                .is_ok(),
            _ => false,
        }
    }
}

/// A compiled byte-code program.
#[derive(Clone, Debug)]
pub(crate) struct Program {
    insts: Vec<Inst>,
    start: StateID,
    slot_len: usize,
    width: CharWidth,
    memory_usage: usize,
}

impl Program {
    pub(crate) fn start(&self) -> StateID {
        self.start
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    pub(crate) fn inst(&self, id: StateID) -> &Inst {
        &self.insts[id.as_usize()]
    }

    pub(crate) fn len(&self) -> usize {
        self.insts.len()
    }

    /// The number of capture slots written by this program. Zero for
    /// match-only programs.
    pub(crate) fn slot_len(&self) -> usize {
        self.slot_len
    }

    pub(crate) fn width(&self) -> CharWidth {
        self.width
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.memory_usage
    }
}

/// Compiles `hir` into a program for the given mode and width.
///
/// Fails with an out-of-memory error carrying `size_limit` when the program
/// would use more heap than allowed.
pub(crate) fn compile(
    hir: &Hir,
    mode: CompileMode,
    width: CharWidth,
    size_limit: usize,
) -> Result<Program, Error> {
    let mut c = Compiler { insts: vec![], mode, width, size_limit, memory_usage: 0 };
    let body = match mode {
        CompileMode::Normal => c.c_capture(0, hir)?,
        CompileMode::MatchOnly => c.c(hir)?,
    };
    let matched = c.add(Inst::Match)?;
    c.patch(body.end, matched);
    let slot_len = match mode {
        CompileMode::Normal => (hir.properties().explicit_captures_len() + 1) * 2,
        CompileMode::MatchOnly => 0,
    };
    Ok(Program { insts: c.insts, start: body.start, slot_len, width, memory_usage: c.memory_usage })
}

/// The entry and exit of a compiled sub-expression. `end` is always an
/// instruction whose outgoing transition is still unset.
#[derive(Clone, Copy, Debug)]
struct ThompsonRef {
    start: StateID,
    end: StateID,
}

struct Compiler {
    insts: Vec<Inst>,
    mode: CompileMode,
    width: CharWidth,
    size_limit: usize,
    memory_usage: usize,
}

impl Compiler {
    fn c(&mut self, hir: &Hir) -> Result<ThompsonRef, Error> {
        match *hir.kind() {
            HirKind::Empty => self.c_empty(),
            HirKind::Literal(hir::Literal(ref bytes)) => self.c_literal(bytes),
            HirKind::Class(Class::Unicode(ref cls)) => self.c_ranges(
                cls.ranges().iter().map(|r| (u32::from(r.start()), u32::from(r.end()))),
            ),
            HirKind::Class(Class::Bytes(ref cls)) => self.c_ranges(
                cls.ranges().iter().map(|r| (u32::from(r.start()), u32::from(r.end()))),
            ),
            HirKind::Look(look) => self.c_look(look),
            HirKind::Repetition(ref rep) => self.c_repetition(rep),
            HirKind::Capture(ref cap) => match self.mode {
                CompileMode::Normal => self.c_capture(cap.index as usize, &cap.sub),
                CompileMode::MatchOnly => self.c(&cap.sub),
            },
            HirKind::Concat(ref subs) => self.c_concat(subs),
            HirKind::Alternation(ref subs) => self.c_alternation(subs),
        }
    }

    fn c_empty(&mut self) -> Result<ThompsonRef, Error> {
        let id = self.add_empty()?;
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_fail(&mut self) -> Result<ThompsonRef, Error> {
        let id = self.add(Inst::Fail)?;
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_literal(&mut self, bytes: &[u8]) -> Result<ThompsonRef, Error> {
        let Some(units) = self.literal_units(bytes) else {
            return self.c_fail();
        };
        let mut units = units.into_iter();
        let Some(first) = units.next() else {
            return self.c_empty();
        };
        let start = self.add(Inst::Unit { unit: first, next: StateID::ZERO })?;
        let mut end = start;
        for unit in units {
            let id = self.add(Inst::Unit { unit, next: StateID::ZERO })?;
            self.patch(end, id);
            end = id;
        }
        Ok(ThompsonRef { start, end })
    }

    /// Lowers a literal to code units of the target width, or `None` when
    /// some character has no representation in it.
    fn literal_units(&self, bytes: &[u8]) -> Option<Vec<u32>> {
        let Ok(text) = core::str::from_utf8(bytes) else {
            // Only reachable through `(?-u)` escapes, which denote raw units.
            return Some(bytes.iter().map(|&b| u32::from(b)).collect());
        };
        match self.width {
            CharWidth::Narrow => {
                text.chars().map(|ch| u8::try_from(u32::from(ch)).ok().map(u32::from)).collect()
            }
            CharWidth::Wide => Some(text.encode_utf16().map(u32::from).collect()),
        }
    }

    fn c_ranges(
        &mut self,
        ranges: impl Iterator<Item = (u32, u32)>,
    ) -> Result<ThompsonRef, Error> {
        let max = self.width.max_unit();
        let mut clipped: Vec<(u32, u32)> = Vec::new();
        for (start, end) in ranges.filter(|&(start, _)| start <= max) {
            let end = end.min(max);
            match clipped.last_mut() {
                // Scalar value classes skip the surrogate block, but a lone
                // surrogate is still a single wide code unit.
                Some(last) if last.1 == 0xD7FF && start == 0xE000 => last.1 = end,
                _ => clipped.push((start, end)),
            }
        }
        let ranges = clipped.into_boxed_slice();
        let id = match ranges.len() {
            0 => return self.c_fail(),
            1 if ranges[0].0 == ranges[0].1 => {
                self.add(Inst::Unit { unit: ranges[0].0, next: StateID::ZERO })?
            }
            _ => {
                self.memory_usage += ranges.len() * size_of::<(u32, u32)>();
                self.add(Inst::Ranges { ranges, next: StateID::ZERO })?
            }
        };
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_look(&mut self, look: Look) -> Result<ThompsonRef, Error> {
        let id = self.add(Inst::Look { look, next: StateID::ZERO })?;
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_capture(&mut self, index: usize, sub: &Hir) -> Result<ThompsonRef, Error> {
        let slot = index * 2;
        let start = self.add(Inst::Save { slot, next: StateID::ZERO })?;
        let inner = self.c(sub)?;
        let end = self.add(Inst::Save { slot: slot + 1, next: StateID::ZERO })?;
        self.patch(start, inner.start);
        self.patch(inner.end, end);
        Ok(ThompsonRef { start, end })
    }

    fn c_concat(&mut self, subs: &[Hir]) -> Result<ThompsonRef, Error> {
        let Some((first, rest)) = subs.split_first() else {
            return self.c_empty();
        };
        let first = self.c(first)?;
        let mut end = first.end;
        for sub in rest {
            let compiled = self.c(sub)?;
            self.patch(end, compiled.start);
            end = compiled.end;
        }
        Ok(ThompsonRef { start: first.start, end })
    }

    fn c_alternation(&mut self, subs: &[Hir]) -> Result<ThompsonRef, Error> {
        match subs {
            [] => return self.c_fail(),
            [only] => return self.c(only),
            _ => {}
        }
        let union = self.add_union()?;
        let end = self.add_empty()?;
        for sub in subs {
            let compiled = self.c(sub)?;
            self.patch(union, compiled.start);
            self.patch(compiled.end, end);
        }
        Ok(ThompsonRef { start: union, end })
    }

    fn c_repetition(&mut self, rep: &hir::Repetition) -> Result<ThompsonRef, Error> {
        match (rep.min, rep.max) {
            (0, Some(1)) => self.c_zero_or_one(&rep.sub, rep.greedy),
            (min, None) => self.c_at_least(&rep.sub, rep.greedy, min),
            (min, Some(max)) if min == max => self.c_exactly(&rep.sub, min),
            (min, Some(max)) => self.c_bounded(&rep.sub, rep.greedy, min, max),
        }
    }

    fn c_exactly(&mut self, sub: &Hir, n: u32) -> Result<ThompsonRef, Error> {
        if n == 0 {
            return self.c_empty();
        }
        let first = self.c(sub)?;
        let mut end = first.end;
        for _ in 1..n {
            let compiled = self.c(sub)?;
            self.patch(end, compiled.start);
            end = compiled.end;
        }
        Ok(ThompsonRef { start: first.start, end })
    }

    fn c_zero_or_one(&mut self, sub: &Hir, greedy: bool) -> Result<ThompsonRef, Error> {
        let union = self.add_union()?;
        let compiled = self.c(sub)?;
        let empty = self.add_empty()?;
        self.patch_union(union, compiled.start, empty, greedy);
        self.patch(compiled.end, empty);
        Ok(ThompsonRef { start: union, end: empty })
    }

    fn c_at_least(&mut self, sub: &Hir, greedy: bool, n: u32) -> Result<ThompsonRef, Error> {
        if n == 0 {
            if sub.properties().minimum_len().map_or(false, |len| len > 0) {
                let union = self.add_union()?;
                let compiled = self.c(sub)?;
                let empty = self.add_empty()?;
                self.patch_union(union, compiled.start, empty, greedy);
                self.patch(compiled.end, union);
                return Ok(ThompsonRef { start: union, end: empty });
            }
            // A body that can match empty is compiled as `(?:sub+)?`, or an
            // empty iteration reaches the loop head twice and leftmost-first
            // preference breaks.
            let compiled = self.c(sub)?;
            let plus = self.add_union()?;
            let question = self.add_union()?;
            let empty = self.add_empty()?;
            self.patch(compiled.end, plus);
            self.patch_union(plus, compiled.start, empty, greedy);
            self.patch_union(question, compiled.start, empty, greedy);
            return Ok(ThompsonRef { start: question, end: empty });
        }
        let prefix = if n > 1 { Some(self.c_exactly(sub, n - 1)?) } else { None };
        let last = self.c(sub)?;
        let union = self.add_union()?;
        let empty = self.add_empty()?;
        self.patch(last.end, union);
        self.patch_union(union, last.start, empty, greedy);
        let start = match prefix {
            None => last.start,
            Some(prefix) => {
                self.patch(prefix.end, last.start);
                prefix.start
            }
        };
        Ok(ThompsonRef { start, end: empty })
    }

    fn c_bounded(
        &mut self,
        sub: &Hir,
        greedy: bool,
        min: u32,
        max: u32,
    ) -> Result<ThompsonRef, Error> {
        let prefix = self.c_exactly(sub, min)?;
        let end = self.add_empty()?;
        let mut prev_end = prefix.end;
        for _ in min..max {
            let union = self.add_union()?;
            self.patch(prev_end, union);
            let compiled = self.c(sub)?;
            self.patch_union(union, compiled.start, end, greedy);
            prev_end = compiled.end;
        }
        self.patch(prev_end, end);
        Ok(ThompsonRef { start: prefix.start, end })
    }

    fn add_empty(&mut self) -> Result<StateID, Error> {
        self.add(Inst::Goto { next: StateID::ZERO })
    }

    fn add_union(&mut self) -> Result<StateID, Error> {
        self.add(Inst::Union { alternates: vec![] })
    }

    fn add(&mut self, inst: Inst) -> Result<StateID, Error> {
        let id = StateID::new(self.insts.len()).map_err(|_| Error::too_big(self.size_limit))?;
        self.memory_usage += size_of::<Inst>();
        if self.memory_usage > self.size_limit {
            return Err(Error::too_big(self.size_limit));
        }
        self.insts.try_reserve(1)?;
        self.insts.push(inst);
        Ok(id)
    }

    /// Adds the loop body and the exit of a repetition to `union`, in
    /// priority order.
    fn patch_union(&mut self, union: StateID, body: StateID, exit: StateID, greedy: bool) {
        if greedy {
            self.patch(union, body);
            self.patch(union, exit);
        } else {
            self.patch(union, exit);
            self.patch(union, body);
        }
    }

    /// Points the unset transition of `from` at `to`. For a union this
    /// appends a new, lowest priority alternate.
    fn patch(&mut self, from: StateID, to: StateID) {
        match self.insts[from.as_usize()] {
            Inst::Match | Inst::Fail => {}
            Inst::Goto { ref mut next }
            | Inst::Unit { ref mut next, .. }
            | Inst::Ranges { ref mut next, .. }
            | Inst::Look { ref mut next, .. }
            | Inst::Save { ref mut next, .. } => *next = to,
            Inst::Union { ref mut alternates } => {
                self.memory_usage += size_of::<StateID>();
                alternates.push(to);
            }
        }
    }
}
