/*!
The execution engine.

An [`Executor`] runs patterns handed out by a
[`PatternCache`](crate::PatternCache). It compiles on first use, takes the
string-match fast path where it applies, emulates sticky matching by slicing
the input and undoing the displacement afterwards, and cooperates with an
[`InterruptHandler`] so that long running executions can be interrupted and
resumed.
*/

use log::{debug, trace};
use regex_automata::util::primitives::NonMaxUsize;

use crate::backend::{CodeGenerator, DefaultCodeGenerator};
use crate::cache::PatternGuard;
use crate::engines::RunContext;
use crate::error::{Error, ExecutionError};
use crate::input::CharBuffer;
use crate::match_buffer::MatchBuffer;
use crate::pattern::{CompileMode, Compiled};

#[cfg(test)]
mod tests;

/// What an interrupt handler wants the engine to do next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resume {
    /// Run the interrupted execution again from scratch.
    Continue,
    /// Give up and report [`ExecutionError::Aborted`].
    Abort,
}

/// The interrupt delivery collaborator.
///
/// The byte-code interpreter polls [`is_pending`](Self::is_pending) while it
/// runs. When an execution stops with an error and an interrupt is pending,
/// the engine calls [`handle`](Self::handle) exactly once for that stop.
/// `handle` is expected to consume the pending interrupt; an execution retried
/// while the interrupt is still pending stops again immediately.
pub trait InterruptHandler: Send + Sync {
    fn is_pending(&self) -> bool;

    fn handle(&self) -> Resume;
}

/// A handler for hosts that never interrupt.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInterrupts;

impl InterruptHandler for NoInterrupts {
    fn is_pending(&self) -> bool {
        false
    }

    fn handle(&self) -> Resume {
        Resume::Continue
    }
}

/// The outcome of a successful execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunStatus {
    Success,
    NotFound,
}

/// Options for compiling and executing patterns.
#[derive(Clone, Debug, Default)]
pub struct Config {
    native: Option<bool>,
    native_size_limit: Option<Option<usize>>,
    size_limit: Option<usize>,
    nest_limit: Option<u32>,
    stack_limit: Option<usize>,
    interrupt_poll_interval: Option<usize>,
}

impl Config {
    /// Return a new default configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Whether natively compiled bodies may be built. Enabled by default.
    ///
    /// When disabled, or when the native backend declines a pattern, every
    /// body is byte-code.
    pub fn native(self, yes: bool) -> Config {
        Config { native: Some(yes), ..self }
    }

    /// The heap limit for natively compiled bodies. A pattern over the limit
    /// silently falls back to byte-code.
    pub fn native_size_limit(self, limit: Option<usize>) -> Config {
        Config { native_size_limit: Some(limit), ..self }
    }

    /// The heap limit for byte-code programs. A pattern over the limit fails
    /// to compile with an out-of-memory error.
    pub fn size_limit(self, bytes: usize) -> Config {
        Config { size_limit: Some(bytes), ..self }
    }

    /// How deeply the parser lets groups and repetitions nest.
    pub fn nest_limit(self, limit: u32) -> Config {
        Config { nest_limit: Some(limit), ..self }
    }

    /// The number of frames the interpreter's work stack may hold.
    pub fn stack_limit(self, frames: usize) -> Config {
        Config { stack_limit: Some(frames), ..self }
    }

    /// How many input positions the interpreter advances between interrupt
    /// polls. Zero is treated as one.
    pub fn interrupt_poll_interval(self, positions: usize) -> Config {
        Config { interrupt_poll_interval: Some(positions), ..self }
    }

    pub fn get_native(&self) -> bool {
        self.native.unwrap_or(true)
    }

    pub fn get_native_size_limit(&self) -> Option<usize> {
        self.native_size_limit.unwrap_or(Some(10 * (1 << 20)))
    }

    pub fn get_size_limit(&self) -> usize {
        self.size_limit.unwrap_or(10 * (1 << 20))
    }

    pub fn get_nest_limit(&self) -> u32 {
        self.nest_limit.unwrap_or(250)
    }

    pub fn get_stack_limit(&self) -> usize {
        self.stack_limit.unwrap_or(1 << 20)
    }

    pub fn get_interrupt_poll_interval(&self) -> usize {
        self.interrupt_poll_interval.unwrap_or(1024)
    }
}

/// Compiles and runs patterns.
///
/// # Example
///
/// ```
/// use regex_shared::{CharBuffer, Executor, FlagSet, PatternCache};
///
/// let cache = PatternCache::new();
/// let exec = Executor::default();
/// let re = cache.get("a(b+)c", FlagSet::empty()).unwrap();
/// let m = exec.find(&re, CharBuffer::latin1(b"xxabbcx"), 0).unwrap().unwrap();
/// assert_eq!(2..6, m.get(0).unwrap().range());
/// assert_eq!(3..5, m.get(1).unwrap().range());
/// ```
pub struct Executor {
    config: Config,
    generator: Box<dyn CodeGenerator>,
    interrupt: Box<dyn InterruptHandler>,
}

impl core::fmt::Debug for Executor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

impl Default for Executor {
    fn default() -> Executor {
        Executor::new(Config::new())
    }
}

impl Executor {
    pub fn new(config: Config) -> Executor {
        Executor {
            config,
            generator: Box::new(DefaultCodeGenerator),
            interrupt: Box::new(NoInterrupts),
        }
    }

    pub fn with_code_generator(self, generator: impl CodeGenerator + 'static) -> Executor {
        Executor { generator: Box::new(generator), ..self }
    }

    pub fn with_interrupt_handler(self, handler: impl InterruptHandler + 'static) -> Executor {
        Executor { interrupt: Box::new(handler), ..self }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Executes `pattern` against `input`, looking for a match at or after
    /// `start` (exactly at `start` for sticky patterns).
    ///
    /// When `matches` is given, its pairs are replaced by the capture
    /// boundaries of the match. Otherwise only existence is checked, which
    /// uses the cheaper match-only body. `matches` is left untouched unless
    /// the status is [`RunStatus::Success`].
    pub fn execute(
        &self,
        pattern: &PatternGuard,
        input: CharBuffer<'_>,
        start: usize,
        matches: Option<&mut MatchBuffer>,
    ) -> Result<RunStatus, Error> {
        let mode = if matches.is_some() { CompileMode::Normal } else { CompileMode::MatchOnly };
        let (body, pair_count) =
            match pattern.compile(mode, input.width(), &*self.generator, &self.config)? {
                Compiled::StringMatch(needle) => {
                    let Some((s, e)) = needle.find(input, start) else {
                        return Ok(RunStatus::NotFound);
                    };
                    if let Some(matches) = matches {
                        matches.alloc_or_expand(1)?;
                        let slots = matches.slots_mut();
                        slots[0] = NonMaxUsize::new(s);
                        slots[1] = NonMaxUsize::new(e);
                    }
                    return Ok(RunStatus::Success);
                }
                Compiled::Body { body, pair_count } => (body, pair_count),
            };
        if start > input.len() {
            return Ok(RunStatus::NotFound);
        }

        let sticky = pattern.flags().sticky();
        let (haystack, displacement) = if sticky {
            trace!("sticky execution of {} displaced by {}", pattern.key(), start);
            (input.slice_from(start), start)
        } else {
            (input, 0)
        };
        let run_start = start - displacement;

        let mut pairs = match mode {
            CompileMode::Normal => {
                let mut pairs = MatchBuffer::new();
                pairs.alloc_or_expand(pair_count)?;
                Some(pairs)
            }
            CompileMode::MatchOnly => None,
        };
        let ctx = RunContext {
            stack_limit: self.config.get_stack_limit(),
            poll_interval: self.config.get_interrupt_poll_interval(),
            interrupt: &*self.interrupt,
        };
        let matched = loop {
            let slots: &mut [Option<NonMaxUsize>] = match pairs {
                Some(ref mut pairs) => {
                    pairs.reset();
                    pairs.slots_mut()
                }
                None => &mut [],
            };
            match body.run(haystack, run_start, sticky, slots, &ctx) {
                Ok(matched) => break matched,
                Err(_) if self.interrupt.is_pending() => match self.interrupt.handle() {
                    Resume::Continue => {
                        trace!("retrying {} after interrupt", pattern.key());
                    }
                    Resume::Abort => {
                        debug!("execution of {} aborted", pattern.key());
                        return Err(Error::execution(ExecutionError::Aborted));
                    }
                },
                Err(err) => {
                    debug!("execution of {} failed: {}", pattern.key(), err);
                    return Err(Error::execution(err));
                }
            }
        };
        if !matched {
            return Ok(RunStatus::NotFound);
        }
        if let (Some(mut pairs), Some(matches)) = (pairs, matches) {
            pairs.displace(displacement);
            debug_assert!(pairs.check_against(input.len()));
            *matches = pairs;
        }
        Ok(RunStatus::Success)
    }

    /// Executes `pattern` and returns the capture pairs of the match, if any.
    pub fn find(
        &self,
        pattern: &PatternGuard,
        input: CharBuffer<'_>,
        start: usize,
    ) -> Result<Option<MatchBuffer>, Error> {
        let mut matches = MatchBuffer::new();
        match self.execute(pattern, input, start, Some(&mut matches))? {
            RunStatus::Success => Ok(Some(matches)),
            RunStatus::NotFound => Ok(None),
        }
    }

    /// Returns true when `pattern` matches `input` at or after `start`.
    pub fn is_match(
        &self,
        pattern: &PatternGuard,
        input: CharBuffer<'_>,
        start: usize,
    ) -> Result<bool, Error> {
        Ok(self.execute(pattern, input, start, None)? == RunStatus::Success)
    }
}
