/*!
A shared regular expression compilation cache and execution engine.

Patterns are identified by their source text and [`FlagSet`]. A
[`PatternCache`] hands out one [`CompiledPattern`] per key, which is compiled
lazily, one body per execution mode and character width, by an [`Executor`].
Bodies are either byte-code run by an interruptible Pike VM, or natively
compiled automata from `regex-automata`.

```
use regex_shared::{CharBuffer, Executor, FlagSet, PatternCache};

let cache = PatternCache::new();
let exec = Executor::default();

let re = cache.get("b+", FlagSet::parse("y").unwrap()).unwrap();
let m = exec.find(&re, CharBuffer::latin1(b"aabbb"), 2).unwrap().unwrap();
assert_eq!(2..5, m.whole_match().unwrap().range());
assert!(exec.find(&re, CharBuffer::latin1(b"aabbb"), 0).unwrap().is_none());
```
*/

pub use backend::{BytecodeGenerator, CodeGenerator, CompiledBody, DefaultCodeGenerator};
pub use cache::{MatchResultTemplate, PatternCache, PatternGuard};
pub use error::{Error, ErrorKind, ExecutionError};
pub use exec::{Config, Executor, InterruptHandler, NoInterrupts, Resume, RunStatus};
pub use flags::FlagSet;
pub use input::{CharBuffer, CharWidth, CodeUnit};
pub use match_buffer::MatchBuffer;
pub use pattern::{CompileMode, CompiledPattern, PatternKey};
pub use regex_automata::Span;
pub use regex_syntax;

mod backend;
mod bytecode;
mod cache;
mod engines;
mod error;
mod exec;
mod flags;
mod input;
mod literal;
mod match_buffer;
mod pattern;
mod syntax;
mod util;
