/*!
Types describing the haystack handed to an execution.

A host string is either *narrow* (one byte per character, Latin-1) or *wide*
(UTF-16 code units). The engines never decode surrogate pairs: every code unit
is one matchable character and every offset reported by this crate is a code
unit offset.
*/

use std::fmt;

/// The character width of a haystack.
///
/// Compiled bodies are specialized per width, so a pattern executed against
/// both narrow and wide strings ends up with two bodies per mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CharWidth {
    /// Latin-1, one `u8` per character.
    Narrow,
    /// UTF-16, one `u16` per character.
    Wide,
}

impl CharWidth {
    /// The largest code unit value representable in this width.
    #[cfg_attr(feature = "perf-inline", inline(always))]
    pub fn max_unit(self) -> u32 {
        match self {
            CharWidth::Narrow => 0xFF,
            CharWidth::Wide => 0xFFFF,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            CharWidth::Narrow => 0,
            CharWidth::Wide => 1,
        }
    }
}

/// A single code unit of a haystack.
pub trait CodeUnit: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const WIDTH: CharWidth;

    fn as_u32(self) -> u32;
}

impl CodeUnit for u8 {
    const WIDTH: CharWidth = CharWidth::Narrow;

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn as_u32(self) -> u32 {
        u32::from(self)
    }
}

impl CodeUnit for u16 {
    const WIDTH: CharWidth = CharWidth::Wide;

    #[cfg_attr(feature = "perf-inline", inline(always))]
    fn as_u32(self) -> u32 {
        u32::from(self)
    }
}

/// A borrowed, linear view of a host string.
///
/// # Example
///
/// ```
/// use regex_shared::{CharBuffer, CharWidth};
///
/// let narrow = CharBuffer::latin1(b"foobar");
/// assert_eq!(6, narrow.len());
/// assert_eq!(CharWidth::Narrow, narrow.width());
///
/// let units: Vec<u16> = "fooβar".encode_utf16().collect();
/// let wide = CharBuffer::two_byte(&units);
/// assert_eq!(CharWidth::Wide, wide.width());
/// ```
#[derive(Clone, Copy)]
pub enum CharBuffer<'h> {
    Latin1(&'h [u8]),
    TwoByte(&'h [u16]),
}

impl<'h> CharBuffer<'h> {
    pub fn latin1(chars: &'h [u8]) -> CharBuffer<'h> {
        CharBuffer::Latin1(chars)
    }

    pub fn two_byte(chars: &'h [u16]) -> CharBuffer<'h> {
        CharBuffer::TwoByte(chars)
    }

    /// Returns the length of this buffer in code units.
    #[inline]
    pub fn len(&self) -> usize {
        match *self {
            CharBuffer::Latin1(chars) => chars.len(),
            CharBuffer::TwoByte(chars) => chars.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn width(&self) -> CharWidth {
        match *self {
            CharBuffer::Latin1(_) => CharWidth::Narrow,
            CharBuffer::TwoByte(_) => CharWidth::Wide,
        }
    }

    /// Returns the code unit at `at`, widened to `u32`.
    pub fn unit(&self, at: usize) -> Option<u32> {
        match *self {
            CharBuffer::Latin1(chars) => chars.get(at).map(|&u| u.as_u32()),
            CharBuffer::TwoByte(chars) => chars.get(at).map(|&u| u.as_u32()),
        }
    }

    /// Returns the suffix of this buffer starting at `start`. Offsets in the
    /// returned buffer are relative to `start`.
    ///
    /// # Panics
    ///
    /// When `start > self.len()`.
    pub fn slice_from(&self, start: usize) -> CharBuffer<'h> {
        match *self {
            CharBuffer::Latin1(chars) => CharBuffer::Latin1(&chars[start..]),
            CharBuffer::TwoByte(chars) => CharBuffer::TwoByte(&chars[start..]),
        }
    }
}

impl<'h> From<&'h [u8]> for CharBuffer<'h> {
    fn from(chars: &'h [u8]) -> CharBuffer<'h> {
        CharBuffer::Latin1(chars)
    }
}

impl<'h> From<&'h [u16]> for CharBuffer<'h> {
    fn from(chars: &'h [u16]) -> CharBuffer<'h> {
        CharBuffer::TwoByte(chars)
    }
}

impl fmt::Debug for CharBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CharBuffer::Latin1(chars) => {
                let text: String = chars.iter().map(|&b| char::from(b)).collect();
                f.debug_tuple("Latin1").field(&text).finish()
            }
            CharBuffer::TwoByte(chars) => {
                f.debug_tuple("TwoByte").field(&String::from_utf16_lossy(chars)).finish()
            }
        }
    }
}
