/*!
The parser collaborator.

Pattern text is turned into a `regex_syntax::hir::Hir`, which is the parsed
form every backend consumes. This module also owns the sticky rewrite: a
sticky pattern is parsed and compiled as `^(?:<source>)`, while the original
source is kept for display.
*/

use std::borrow::Cow;

use log::debug;
use regex_syntax::hir::Hir;
use regex_syntax::ParserBuilder;

use crate::error::Error;
use crate::flags::FlagSet;

const STICKY_PREFIX: &str = "^(?:";
const STICKY_SUFFIX: &str = ")";

/// Returns the source text that is actually parsed for `source` under
/// `flags`.
pub(crate) fn effective_source(source: &str, flags: FlagSet) -> Cow<'_, str> {
    if !flags.sticky() {
        return Cow::Borrowed(source);
    }
    let mut wrapped =
        String::with_capacity(STICKY_PREFIX.len() + source.len() + STICKY_SUFFIX.len());
    wrapped.push_str(STICKY_PREFIX);
    wrapped.push_str(source);
    wrapped.push_str(STICKY_SUFFIX);
    Cow::Owned(wrapped)
}

/// Parses already rewritten pattern text.
///
/// `IgnoreCase` and `Multiline` map onto the parser's case-insensitive and
/// multi-line modes. CRLF mode is always on so that `.` does not match `\r`
/// and line anchors treat `\r\n` as one terminator.
pub(crate) fn parse(pattern: &str, flags: FlagSet, nest_limit: u32) -> Result<Hir, Error> {
    let hir = ParserBuilder::new()
        .case_insensitive(flags.ignore_case())
        .multi_line(flags.multiline())
        .crlf(true)
        .nest_limit(nest_limit)
        .build()
        .parse(pattern)
        .map_err(Error::syntax)?;
    debug!(
        "parsed {:?} (explicit captures={})",
        pattern,
        hir.properties().explicit_captures_len()
    );
    Ok(hir)
}
