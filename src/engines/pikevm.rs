/*!
The byte-code interpreter.

This is a Pike VM: it simulates every thread of a [`Program`] in lock step,
one code unit at a time, so it runs in time proportional to the program size
times the haystack length. Thread priority follows insertion order, which gives
the leftmost-first semantics of a backtracking engine.

Two things make this interpreter interruptible and bounded:

* Every `poll_interval` positions it asks the interrupt handler whether an
interrupt is pending, and stops with [`ExecutionError::Interrupted`] if one is.
* The work stack used for epsilon closures is bounded by `stack_limit` frames.
Going over the bound stops the search with
[`ExecutionError::StackExhausted`].

Neither error leaves the [`Cache`] in a state that affects later searches.
*/

use regex_automata::util::primitives::{NonMaxUsize, StateID};

use crate::bytecode::{Inst, Program};
use crate::engines::RunContext;
use crate::error::ExecutionError;
use crate::input::CodeUnit;
use crate::util::sparse_set::SparseSet;

mod look;

/// The haystack and position of one search.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Search<'h, U> {
    pub(crate) haystack: &'h [U],
    pub(crate) start: usize,
    /// Only accept matches starting exactly at `start`.
    pub(crate) anchored: bool,
    /// Stop at the first match end seen instead of finishing the leftmost
    /// match. Used when nobody reads capture slots.
    pub(crate) earliest: bool,
}

/// Executes a leftmost-first search and writes the slots of the matching
/// thread into `slots`. Returns the end offset of the match, if any.
///
/// `slots` may be shorter than the program's slot count (or empty), in
/// which case only the leading slots are tracked.
pub(crate) fn search_slots<U: CodeUnit>(
    prog: &Program,
    cache: &mut Cache,
    search: &Search<'_, U>,
    slots: &mut [Option<NonMaxUsize>],
    ctx: &RunContext<'_>,
) -> Result<Option<usize>, ExecutionError> {
    debug_assert_eq!(prog.width(), U::WIDTH);
    debug_assert!(slots.len() <= prog.slot_len());
    cache.setup_search(slots.len());
    let haystack = search.haystack;
    if search.start > haystack.len() {
        return Ok(None);
    }
    let poll_interval = ctx.poll_interval.max(1);
    let Cache { ref mut stack, ref mut curr, ref mut next } = *cache;
    let mut hm = None;
    let mut at = search.start;
    while at <= haystack.len() {
        if (at - search.start) % poll_interval == 0 && ctx.interrupt.is_pending() {
            return Err(ExecutionError::Interrupted);
        }
        if curr.set.is_empty() {
            // A match has been found and no higher priority thread is alive.
            if hm.is_some() {
                break;
            }
            if search.anchored && at > search.start {
                break;
            }
        }
        // Simulates an unanchored '(?s:.)*?' prefix by seeding a fresh thread
        // at every position until some thread matched. Seeded threads sit
        // outside every capture group, so they start with all slots absent.
        if hm.is_none() && (!search.anchored || at == search.start) {
            let slots = next.slot_table.all_absent();
            epsilon_closure(prog, stack, slots, curr, haystack, at, prog.start(), ctx)?;
        }
        if nexts(prog, stack, curr, next, haystack, at, slots, ctx)? {
            hm = Some(at);
            if search.earliest {
                break;
            }
        }
        core::mem::swap(curr, next);
        next.set.clear();
        at += 1;
    }
    Ok(hm)
}

/// Steps every thread in `curr` over the code unit at `at`, building `next`.
///
/// Threads are visited in priority order. Once a thread matches, lower
/// priority threads are dropped and its slots are copied to `slots`.
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "perf-inline", inline(always))]
fn nexts<U: CodeUnit>(
    prog: &Program,
    stack: &mut Vec<FollowEpsilon>,
    curr: &mut ActiveStates,
    next_: &mut ActiveStates,
    haystack: &[U],
    at: usize,
    slots: &mut [Option<NonMaxUsize>],
    ctx: &RunContext<'_>,
) -> Result<bool, ExecutionError> {
    let ActiveStates { ref set, ref mut slot_table } = *curr;
    for sid in set.iter() {
        if step(prog, stack, slot_table, next_, haystack, at, sid, ctx)? {
            slots.copy_from_slice(slot_table.for_state(sid));
            return Ok(true);
        }
    }
    Ok(false)
}

/// Follows the consuming transition of `sid`, if the unit at `at` allows it,
/// and adds the epsilon closure of its target to `next`. Returns true when
/// `sid` is a match instruction.
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "perf-inline", inline(always))]
fn step<U: CodeUnit>(
    prog: &Program,
    stack: &mut Vec<FollowEpsilon>,
    curr_slot_table: &mut SlotTable,
    next: &mut ActiveStates,
    haystack: &[U],
    at: usize,
    sid: StateID,
    ctx: &RunContext<'_>,
) -> Result<bool, ExecutionError> {
    let inst = prog.inst(sid);
    match *inst {
        Inst::Match => Ok(true),
        Inst::Unit { next: to, .. } | Inst::Ranges { next: to, .. } => {
            let consumes = haystack.get(at).map_or(false, |unit| inst.matches_unit(unit.as_u32()));
            if consumes {
                let slots = curr_slot_table.for_state(sid);
                epsilon_closure(prog, stack, slots, next, haystack, at + 1, to, ctx)?;
            }
            Ok(false)
        }
        Inst::Fail
        | Inst::Goto { .. }
        | Inst::Look { .. }
        | Inst::Save { .. }
        | Inst::Union { .. } => Ok(false),
    }
}

/// Computes the epsilon closure of `sid` at position `at`, writing it into
/// `next` while copying slot values from `curr_slots`.
///
/// While this routine writes to `curr_slots`, the original values are
/// restored once it returns successfully.
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "perf-inline", inline(always))]
fn epsilon_closure<U: CodeUnit>(
    prog: &Program,
    stack: &mut Vec<FollowEpsilon>,
    curr_slots: &mut [Option<NonMaxUsize>],
    next: &mut ActiveStates,
    haystack: &[U],
    at: usize,
    sid: StateID,
    ctx: &RunContext<'_>,
) -> Result<(), ExecutionError> {
    stack.push(FollowEpsilon::Explore(sid));
    while let Some(frame) = stack.pop() {
        match frame {
            FollowEpsilon::RestoreCapture { slot, offset } => {
                curr_slots[slot] = offset;
            }
            FollowEpsilon::Explore(sid) => {
                epsilon_closure_explore(prog, stack, curr_slots, next, haystack, at, sid);
                if stack.len() > ctx.stack_limit {
                    return Err(ExecutionError::StackExhausted);
                }
            }
        }
    }
    Ok(())
}

/// Explores the epsilon transitions out of `sid`, pushing further work on
/// `stack`. The first alternate of a union is followed directly instead of
/// being pushed and popped again.
#[cfg_attr(feature = "perf-inline", inline(always))]
fn epsilon_closure_explore<U: CodeUnit>(
    prog: &Program,
    stack: &mut Vec<FollowEpsilon>,
    curr_slots: &mut [Option<NonMaxUsize>],
    next: &mut ActiveStates,
    haystack: &[U],
    at: usize,
    mut sid: StateID,
) {
    loop {
        if !next.set.insert(sid) {
            return;
        }
        match *prog.inst(sid) {
            Inst::Match | Inst::Fail | Inst::Unit { .. } | Inst::Ranges { .. } => {
                next.slot_table.for_state(sid).copy_from_slice(curr_slots);
                return;
            }
            Inst::Goto { next: to } => sid = to,
            Inst::Look { look, next: to } => {
                if !look::matches(look, haystack, at) {
                    return;
                }
                sid = to;
            }
            Inst::Union { ref alternates } => {
                sid = match alternates.first() {
                    None => return,
                    Some(&sid) => sid,
                };
                stack.extend(alternates[1..].iter().copied().rev().map(FollowEpsilon::Explore));
            }
            Inst::Save { slot, next: to } => {
                // Slots the caller did not ask for are never tracked.
                if slot < curr_slots.len() {
                    stack.push(FollowEpsilon::RestoreCapture { slot, offset: curr_slots[slot] });
                    curr_slots[slot] = NonMaxUsize::new(at);
                }
                sid = to;
            }
        }
    }
}

/// Mutable scratch space for searching one [`Program`].
///
/// A cache is created per program and handed out by the program's pool, so
/// each execution owns one for its whole duration and returns it on every
/// exit path.
#[derive(Clone, Debug)]
pub(crate) struct Cache {
    /// Work stack for epsilon closures.
    stack: Vec<FollowEpsilon>,
    /// Threads alive at the current position.
    curr: ActiveStates,
    /// Threads being built for the next position.
    next: ActiveStates,
}

impl Cache {
    pub(crate) fn new(prog: &Program) -> Cache {
        Cache { stack: vec![], curr: ActiveStates::new(prog), next: ActiveStates::new(prog) }
    }

    /// Clears this cache for a new search tracking `slot_len` slots. An
    /// earlier search that stopped with an error may have left slot values
    /// and stack frames behind; none of them survive this call.
    fn setup_search(&mut self, slot_len: usize) {
        self.stack.clear();
        self.curr.setup_search(slot_len);
        self.next.setup_search(slot_len);
    }
}

/// A frame of the epsilon closure work stack.
#[derive(Clone, Debug)]
enum FollowEpsilon {
    /// Explore the epsilon transitions from an instruction.
    Explore(StateID),
    /// Reset `slot` to `offset` once everything explored after the save that
    /// pushed this frame is done.
    RestoreCapture { slot: usize, offset: Option<NonMaxUsize> },
}

/// A set of threads and their capture slots.
#[derive(Clone, Debug)]
struct ActiveStates {
    set: SparseSet,
    slot_table: SlotTable,
}

impl ActiveStates {
    fn new(prog: &Program) -> ActiveStates {
        ActiveStates { set: SparseSet::new(prog.len()), slot_table: SlotTable::new(prog) }
    }

    fn setup_search(&mut self, slot_len: usize) {
        self.set.clear();
        self.slot_table.setup_search(slot_len);
    }
}

/// One row of slots per instruction, in a single allocation, followed by one
/// scratch row that is always absent.
#[derive(Clone, Debug)]
struct SlotTable {
    table: Vec<Option<NonMaxUsize>>,
    /// The row stride.
    slots_per_state: usize,
    /// The number of slots tracked in the current search.
    slots_for_captures: usize,
}

impl SlotTable {
    fn new(prog: &Program) -> SlotTable {
        let slots_per_state = prog.slot_len();
        let len = (prog.len() + 1) * slots_per_state;
        SlotTable { table: vec![None; len], slots_per_state, slots_for_captures: slots_per_state }
    }

    fn setup_search(&mut self, slot_len: usize) {
        self.slots_for_captures = slot_len;
        self.all_absent().iter_mut().for_each(|slot| *slot = None);
    }

    fn for_state(&mut self, sid: StateID) -> &mut [Option<NonMaxUsize>] {
        let i = sid.as_usize() * self.slots_per_state;
        &mut self.table[i..i + self.slots_for_captures]
    }

    fn all_absent(&mut self) -> &mut [Option<NonMaxUsize>] {
        let i = self.table.len() - self.slots_per_state;
        &mut self.table[i..i + self.slots_for_captures]
    }
}
