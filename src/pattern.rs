/*!
Compiled patterns and their cache keys.

A [`CompiledPattern`] starts out empty and fills in lazily. The first successful
compile fixes the group count. Each later compile for a new (mode, width)
combination only adds that one body. Failed compiles leave no trace, so a
parse failure caused by a resource limit can be retried under a larger limit.
*/

use std::fmt;
use std::sync::OnceLock;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::backend::{CodeGenerator, CompiledBody};
use crate::error::Error;
use crate::exec::Config;
use crate::flags::FlagSet;
use crate::input::CharWidth;
use crate::literal::{has_meta_chars, Needle};
use crate::syntax;


/// What an execution needs to know about its result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CompileMode {
    /// Capture boundaries are reported.
    Normal,
    /// Only the existence of a match is reported.
    MatchOnly,
}

impl CompileMode {
    fn index(self) -> usize {
        match self {
            CompileMode::Normal => 0,
            CompileMode::MatchOnly => 1,
        }
    }
}

/// The identity of a compiled pattern: its source text and flags.
///
/// Serializes as `{ "source": ..., "flags": <bit word> }`.
///
/// # Example
///
/// ```
/// use regex_shared::{FlagSet, PatternKey};
///
/// let key = PatternKey::new("a+b", FlagSet::GLOBAL | FlagSet::STICKY);
/// assert_eq!("/a+b/gy", key.to_string());
/// assert_eq!("/(?:)/", PatternKey::new("", FlagSet::empty()).to_string());
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PatternKey {
    source: Box<str>,
    flags: FlagSet,
}

impl PatternKey {
    pub fn new(source: impl Into<Box<str>>, flags: FlagSet) -> PatternKey {
        PatternKey { source: source.into(), flags }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> FlagSet {
        self.flags
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = if self.source.is_empty() { "(?:)" } else { &self.source };
        write!(f, "/{}/{}", source, self.flags)
    }
}

/// The result of [`CompiledPattern::compile`].
#[derive(Debug)]
pub(crate) enum Compiled<'a> {
    /// Executions are a plain substring search for this needle.
    StringMatch(&'a Needle),
    Body { body: &'a CompiledBody, pair_count: usize },
}

/// Facts fixed by the first successful compile.
#[derive(Clone, Copy, Debug)]
struct PatternInfo {
    group_count: usize,
}

/// The shared compiled representation of one [`PatternKey`].
#[derive(Debug)]
pub struct CompiledPattern {
    key: PatternKey,
    /// Present when the pattern is a case-sensitive literal.
    string_match: Option<Needle>,
    info: OnceLock<PatternInfo>,
    bodies: [OnceLock<CompiledBody>; 4],
}

impl CompiledPattern {
    pub(crate) fn new(key: PatternKey) -> CompiledPattern {
        // The sticky rewrite adds metacharacters, so sticky patterns never
        // take the string-match path.
        let string_match = if key.flags.ignore_case()
            || key.flags.sticky()
            || has_meta_chars(&key.source)
        {
            None
        } else {
            Some(Needle::new(&key.source))
        };
        CompiledPattern {
            key,
            string_match,
            info: OnceLock::new(),
            bodies: [OnceLock::new(), OnceLock::new(), OnceLock::new(), OnceLock::new()],
        }
    }

    pub fn key(&self) -> &PatternKey {
        &self.key
    }

    /// The original source text, without the sticky rewrite.
    pub fn source(&self) -> &str {
        self.key.source()
    }

    pub fn flags(&self) -> FlagSet {
        self.key.flags()
    }

    /// Returns true when executions of this pattern are substring searches.
    pub fn can_string_match(&self) -> bool {
        self.string_match.is_some()
    }

    /// The number of capturing groups, once the pattern has been compiled.
    pub fn group_count(&self) -> Option<usize> {
        self.info.get().map(|info| info.group_count)
    }

    /// The number of capture pairs a match reports, including the whole
    /// match, once the pattern has been compiled.
    pub fn pair_count(&self) -> Option<usize> {
        self.group_count().map(|n| n + 1)
    }

    /// Returns true when an execution in `mode` over `width` input needs no
    /// further compilation.
    pub fn is_compiled(&self, mode: CompileMode, width: CharWidth) -> bool {
        if self.string_match.is_some() {
            return self.info.get().is_some();
        }
        self.body(mode, width).is_some()
    }

    /// Returns the heap memory used by this pattern, in bytes.
    pub fn memory_usage(&self) -> usize {
        let bodies: usize =
            self.bodies.iter().filter_map(OnceLock::get).map(CompiledBody::memory_usage).sum();
        self.key.source.len() + self.string_match.as_ref().map_or(0, Needle::memory_usage) + bodies
    }

    fn body(&self, mode: CompileMode, width: CharWidth) -> Option<&CompiledBody> {
        self.bodies[mode.index() * 2 + width.index()].get()
    }

    /// Makes sure this pattern can be executed in `mode` over `width` input.
    ///
    /// Compiling a combination that is already compiled does nothing.
    pub(crate) fn compile(
        &self,
        mode: CompileMode,
        width: CharWidth,
        generator: &dyn CodeGenerator,
        config: &Config,
    ) -> Result<Compiled<'_>, Error> {
        if let Some(ref needle) = self.string_match {
            if self.info.get().is_none() {
                debug!("{} compiled as a string match", self.key);
            }
            self.info.get_or_init(|| PatternInfo { group_count: 0 });
            return Ok(Compiled::StringMatch(needle));
        }
        if let (Some(body), Some(info)) = (self.body(mode, width), self.info.get()) {
            return Ok(Compiled::Body { body, pair_count: info.group_count + 1 });
        }
        let source = syntax::effective_source(&self.key.source, self.key.flags);
        let hir = syntax::parse(&source, self.key.flags, config.get_nest_limit())?;
        let mut body = generator.generate(&hir, mode, width, config)?;
        if !body.accepts(width) {
            debug!("{} generator built a body for the wrong width, using byte-code", self.key);
            body = CompiledBody::bytecode(&hir, mode, width, config)?;
        }
        let group_count = hir.properties().explicit_captures_len();
        let info = self.info.get_or_init(|| PatternInfo { group_count });
        debug_assert_eq!(info.group_count, group_count);
        debug!(
            "{} compiled for {:?}/{:?} (native={}, {} bytes)",
            self.key,
            mode,
            width,
            body.is_native(),
            body.memory_usage()
        );
        // A concurrent compile may have won the race; its body is kept.
        let body = self.bodies[mode.index() * 2 + width.index()].get_or_init(|| body);
        Ok(Compiled::Body { body, pair_count: info.group_count + 1 })
    }
}
