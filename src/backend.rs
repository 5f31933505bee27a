/*!
Code generation backends.

A [`CompiledBody`] is the executable form of one pattern for one execution
mode and one character width. It is either a byte-code program run by the
interpreter or a natively compiled unit, never both. Which one gets built is
decided by a [`CodeGenerator`]; the crate ships [`DefaultCodeGenerator`],
which prefers native code where it is available, and [`BytecodeGenerator`],
which never builds native code.
*/

use std::fmt;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::sync::Arc;

use log::debug;
use regex_automata::util::pool::Pool;
use regex_automata::util::primitives::NonMaxUsize;
use regex_syntax::hir::Hir;

use crate::bytecode::{self, Program};
use crate::engines::native::NativeCode;
use crate::engines::pikevm::{self, Search};
use crate::engines::RunContext;
use crate::error::{Error, ExecutionError};
use crate::exec::Config;
use crate::input::{CharBuffer, CharWidth};
use crate::pattern::CompileMode;

/// Turns a parsed pattern into a [`CompiledBody`].
///
/// Implementations may decline native compilation for any reason and fall
/// back to byte-code. Only a failure to produce any body at all is an error.
pub trait CodeGenerator: Send + Sync + fmt::Debug {
    fn generate(
        &self,
        hir: &Hir,
        mode: CompileMode,
        width: CharWidth,
        config: &Config,
    ) -> Result<CompiledBody, Error>;
}

/// Builds native code for narrow inputs when [`Config::native`] allows it,
/// and byte-code otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCodeGenerator;

impl CodeGenerator for DefaultCodeGenerator {
    fn generate(
        &self,
        hir: &Hir,
        mode: CompileMode,
        width: CharWidth,
        config: &Config,
    ) -> Result<CompiledBody, Error> {
        if !config.get_native() {
            debug!("native code disabled");
        } else if width != CharWidth::Narrow {
            debug!("native code skipped for {:?} input", width);
        } else if !hir.properties().is_utf8() {
            debug!("native code skipped for pattern matching raw units");
        } else if let Some(body) = CompiledBody::native(hir, mode, width, config) {
            return Ok(body);
        }
        CompiledBody::bytecode(hir, mode, width, config)
    }
}

/// Always builds byte-code.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytecodeGenerator;

impl CodeGenerator for BytecodeGenerator {
    fn generate(
        &self,
        hir: &Hir,
        mode: CompileMode,
        width: CharWidth,
        config: &Config,
    ) -> Result<CompiledBody, Error> {
        CompiledBody::bytecode(hir, mode, width, config)
    }
}

/// An opaque executable unit.
#[derive(Debug)]
pub struct CompiledBody(Body);

#[derive(Debug)]
enum Body {
    ByteCode(ByteCode),
    Native(NativeCode),
}

impl CompiledBody {
    /// Compiles `hir` to byte-code specialized for `mode` and `width`.
    pub fn bytecode(
        hir: &Hir,
        mode: CompileMode,
        width: CharWidth,
        config: &Config,
    ) -> Result<CompiledBody, Error> {
        let program = bytecode::compile(hir, mode, width, config.get_size_limit())?;
        debug!("byte-code body built ({} instructions)", program.len());
        Ok(CompiledBody(Body::ByteCode(ByteCode::new(program))))
    }

    /// Compiles `hir` to native code.
    ///
    /// Returns `None` when native compilation declined the pattern, which is
    /// not an error. Native code only runs over narrow inputs, so a `Wide`
    /// width is always declined.
    pub fn native(
        hir: &Hir,
        mode: CompileMode,
        width: CharWidth,
        config: &Config,
    ) -> Option<CompiledBody> {
        if width != CharWidth::Narrow {
            return None;
        }
        NativeCode::new(hir, mode, config.get_native_size_limit())
            .map(|code| CompiledBody(Body::Native(code)))
    }

    pub fn is_native(&self) -> bool {
        matches!(self.0, Body::Native(_))
    }

    /// Returns true when this body can run over `width` input.
    pub fn accepts(&self, width: CharWidth) -> bool {
        match self.0 {
            Body::ByteCode(ref code) => code.program.width() == width,
            Body::Native(_) => width == CharWidth::Narrow,
        }
    }

    /// Returns the heap memory used by this body, in bytes.
    pub fn memory_usage(&self) -> usize {
        match self.0 {
            Body::ByteCode(ref code) => code.program.memory_usage(),
            Body::Native(ref code) => code.memory_usage(),
        }
    }

    /// Runs one search. `slots` is empty for match-only executions.
    pub(crate) fn run(
        &self,
        haystack: CharBuffer<'_>,
        start: usize,
        anchored: bool,
        slots: &mut [Option<NonMaxUsize>],
        ctx: &RunContext<'_>,
    ) -> Result<bool, ExecutionError> {
        match (&self.0, haystack) {
            (Body::ByteCode(code), CharBuffer::Latin1(haystack)) => {
                code.search(haystack, start, anchored, slots, ctx)
            }
            (Body::ByteCode(code), CharBuffer::TwoByte(haystack)) => {
                code.search(haystack, start, anchored, slots, ctx)
            }
            (Body::Native(code), CharBuffer::Latin1(haystack)) => {
                Ok(code.search(haystack, start, anchored, slots))
            }
            (Body::Native(_), CharBuffer::TwoByte(_)) => {
                unreachable!("native bodies are never stored for wide inputs")
            }
        }
    }
}

type CachePoolFn =
    Box<dyn Fn() -> pikevm::Cache + Send + Sync + UnwindSafe + RefUnwindSafe + 'static>;

/// A byte-code program and a pool of interpreter caches for it, so that
/// concurrent executions of the same body never share scratch space.
struct ByteCode {
    program: Arc<Program>,
    pool: Pool<pikevm::Cache, CachePoolFn>,
}

impl ByteCode {
    fn new(program: Program) -> ByteCode {
        let program = Arc::new(program);
        let for_pool = Arc::clone(&program);
        let create: CachePoolFn = Box::new(move || pikevm::Cache::new(&for_pool));
        ByteCode { program, pool: Pool::new(create) }
    }

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn search<U: crate::input::CodeUnit>(
        &self,
        haystack: &[U],
        start: usize,
        anchored: bool,
        slots: &mut [Option<NonMaxUsize>],
        ctx: &RunContext<'_>,
    ) -> Result<bool, ExecutionError> {
        let search = Search { haystack, start, anchored, earliest: slots.is_empty() };
        let mut cache = self.pool.get();
        let matched = pikevm::search_slots(&self.program, &mut cache, &search, slots, ctx)?;
        Ok(matched.is_some())
    }
}

impl fmt::Debug for ByteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteCode").field("program", &self.program).finish()
    }
}
