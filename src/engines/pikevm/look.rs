use regex_syntax::hir::Look;

use crate::input::CodeUnit;
use crate::util::{is_word_unit, is_word_unit_unicode};

const LF: u32 = b'\n' as u32;
const CR: u32 = b'\r' as u32;

/// Returns true when the position `at` in `haystack` satisfies the given
/// look-around assertion.
///
/// Nothing exists before offset `0`. A sticky execution slices its haystack,
/// so the characters before the displaced start are invisible here.
///
/// This may panic when `at > haystack.len()`. Note that `at ==
/// haystack.len()` is legal and guaranteed not to panic.
#[cfg_attr(feature = "perf-inline", inline(always))]
pub(crate) fn matches<U: CodeUnit>(look: Look, haystack: &[U], at: usize) -> bool {
    let prev = at.checked_sub(1).map(|i| haystack[i].as_u32());
    let next = haystack.get(at).map(|u| u.as_u32());
    let word_ascii = |unit: Option<u32>| unit.map_or(false, is_word_unit);
    let word_unicode = |unit: Option<u32>| unit.map_or(false, is_word_unit_unicode);
    match look {
        Look::Start => at == 0,
        Look::End => at == haystack.len(),
        Look::StartLF => prev.map_or(true, |u| u == LF),
        Look::EndLF => next.map_or(true, |u| u == LF),
        Look::StartCRLF => match prev {
            None => true,
            Some(LF) => true,
            // Between `\r` and `\n` is not a line start.
            Some(CR) => next != Some(LF),
            Some(_) => false,
        },
        Look::EndCRLF => match next {
            None => true,
            Some(CR) => true,
            Some(LF) => prev != Some(CR),
            Some(_) => false,
        },
        Look::WordAscii => word_ascii(prev) != word_ascii(next),
        Look::WordAsciiNegate => word_ascii(prev) == word_ascii(next),
        Look::WordUnicode => word_unicode(prev) != word_unicode(next),
        Look::WordUnicodeNegate => word_unicode(prev) == word_unicode(next),
        Look::WordStartAscii => !word_ascii(prev) && word_ascii(next),
        Look::WordEndAscii => word_ascii(prev) && !word_ascii(next),
        Look::WordStartUnicode => !word_unicode(prev) && word_unicode(next),
        Look::WordEndUnicode => word_unicode(prev) && !word_unicode(next),
        Look::WordStartHalfAscii => !word_ascii(prev),
        Look::WordEndHalfAscii => !word_ascii(next),
        Look::WordStartHalfUnicode => !word_unicode(prev),
        Look::WordEndHalfUnicode => !word_unicode(next),
    }
}
