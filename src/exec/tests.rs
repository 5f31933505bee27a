use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::BytecodeGenerator;
use crate::cache::PatternCache;
use crate::error::ExecutionError;
use crate::flags::FlagSet;
use crate::input::{CharBuffer, CharWidth};
use crate::match_buffer::MatchBuffer;
use crate::pattern::CompileMode;

use super::{Config, Executor, InterruptHandler, Resume, RunStatus};

/// Reports `pending` interrupts, then none. Every handled interrupt answers
/// with `resume`.
#[derive(Clone)]
struct CountingHandler {
    pending: Arc<AtomicUsize>,
    handled: Arc<AtomicUsize>,
    resume: Resume,
}

impl CountingHandler {
    fn new(pending: usize, resume: Resume) -> CountingHandler {
        CountingHandler {
            pending: Arc::new(AtomicUsize::new(pending)),
            handled: Arc::new(AtomicUsize::new(0)),
            resume,
        }
    }
}

impl InterruptHandler for CountingHandler {
    fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    fn handle(&self) -> Resume {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.handled.fetch_add(1, Ordering::SeqCst);
        self.resume
    }
}

fn bytecode_executor(config: Config) -> Executor {
    Executor::new(config).with_code_generator(BytecodeGenerator)
}

#[test]
fn config_defaults() {
    let config = Config::new();
    assert!(config.get_native());
    assert_eq!(config.get_native_size_limit(), Some(10 * (1 << 20)));
    assert_eq!(config.get_size_limit(), 10 * (1 << 20));
    assert_eq!(config.get_nest_limit(), 250);
    assert_eq!(config.get_stack_limit(), 1 << 20);
    assert_eq!(config.get_interrupt_poll_interval(), 1024);
    let config = config.native(false).stack_limit(7).interrupt_poll_interval(3);
    assert!(!config.get_native());
    assert_eq!(config.get_stack_limit(), 7);
    assert_eq!(config.get_interrupt_poll_interval(), 3);
}

#[test]
fn compiles_only_the_needed_body() {
    let cache = PatternCache::new();
    let re = cache.get("a(b)", FlagSet::empty()).unwrap();
    let exec = Executor::default();
    assert!(exec.is_match(&re, CharBuffer::latin1(b"ab"), 0).unwrap());
    assert!(re.is_compiled(CompileMode::MatchOnly, CharWidth::Narrow));
    assert!(!re.is_compiled(CompileMode::Normal, CharWidth::Narrow));
    assert!(!re.is_compiled(CompileMode::MatchOnly, CharWidth::Wide));
}

#[test]
fn interrupt_is_retried() {
    let cache = PatternCache::new();
    let re = cache.get("b+", FlagSet::empty()).unwrap();
    let handler = CountingHandler::new(1, Resume::Continue);
    let exec = bytecode_executor(Config::new()).with_interrupt_handler(handler.clone());
    let m = exec.find(&re, CharBuffer::latin1(b"aabbb"), 0).unwrap().unwrap();
    assert_eq!(m.whole_match().map(|s| s.range()), Some(2..5));
    assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
}

#[test]
fn interrupt_abort() {
    let cache = PatternCache::new();
    let re = cache.get("b+", FlagSet::empty()).unwrap();
    let handler = CountingHandler::new(1, Resume::Abort);
    let exec = bytecode_executor(Config::new()).with_interrupt_handler(handler.clone());
    let mut m = MatchBuffer::new();
    let err = exec.execute(&re, CharBuffer::latin1(b"aabbb"), 0, Some(&mut m)).unwrap_err();
    assert_eq!(err.execution_error(), Some(ExecutionError::Aborted));
    assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
    assert_eq!(m, MatchBuffer::new());
    // the pattern stays usable
    assert_eq!(exec.find(&re, CharBuffer::latin1(b"aabbb"), 0).unwrap().unwrap().pair_count(), 1);
}

#[test]
fn stack_exhaustion_is_not_retried() {
    let cache = PatternCache::new();
    let re = cache.get("ab|cd|ef|gh", FlagSet::empty()).unwrap();
    let handler = CountingHandler::new(0, Resume::Continue);
    let exec =
        bytecode_executor(Config::new().stack_limit(2)).with_interrupt_handler(handler.clone());
    let err = exec.find(&re, CharBuffer::latin1(b"gh"), 0).unwrap_err();
    assert_eq!(err.execution_error(), Some(ExecutionError::StackExhausted));
    assert_eq!(handler.handled.load(Ordering::SeqCst), 0);
}

#[test]
fn match_buffer_untouched_on_not_found() {
    let cache = PatternCache::new();
    let exec = Executor::default();
    let earlier = cache.get("(a)", FlagSet::empty()).unwrap();
    let mut m = exec.find(&earlier, CharBuffer::latin1(b"a"), 0).unwrap().unwrap();
    let before = m.clone();
    let re = cache.get("(x)", FlagSet::empty()).unwrap();
    let status = exec.execute(&re, CharBuffer::latin1(b"abc"), 0, Some(&mut m)).unwrap();
    assert_eq!(status, RunStatus::NotFound);
    assert_eq!(m, before);
}

#[test]
fn start_past_end() {
    let cache = PatternCache::new();
    let exec = Executor::default();
    let empty = cache.get("a*", FlagSet::empty()).unwrap();
    let literal = cache.get("abc", FlagSet::empty()).unwrap();
    let m = exec.find(&empty, CharBuffer::latin1(b"abc"), 3).unwrap().unwrap();
    assert_eq!(m.whole_match().map(|s| s.range()), Some(3..3));
    assert!(exec.find(&literal, CharBuffer::latin1(b"abc"), 3).unwrap().is_none());
    assert!(exec.find(&empty, CharBuffer::latin1(b"abc"), 4).unwrap().is_none());
    assert!(exec.find(&literal, CharBuffer::latin1(b"abc"), 4).unwrap().is_none());
}

#[test]
fn sticky_multiline_only_matches_at_start() {
    for exec in [Executor::default(), bytecode_executor(Config::new())] {
        let cache = PatternCache::new();
        let re = cache.get("b", FlagSet::parse("my").unwrap()).unwrap();
        assert!(exec.find(&re, CharBuffer::latin1(b"a\nb"), 0).unwrap().is_none());
        assert!(exec.find(&re, CharBuffer::latin1(b"a\nb"), 1).unwrap().is_none());
        let m = exec.find(&re, CharBuffer::latin1(b"a\nb"), 2).unwrap().unwrap();
        assert_eq!(m.whole_match().map(|s| s.range()), Some(2..3));
    }
}
