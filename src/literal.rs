/*!
The string-match fast path.

A case-sensitive pattern without metacharacters matches exactly its own text,
so executing it is a plain substring search. Narrow haystacks use `memchr`'s
`memmem`; wide haystacks compare code units directly.
*/

use memchr::memmem;

use crate::input::CharBuffer;

#[cfg(test)]
mod tests;

/// Characters that give a pattern any meaning beyond its literal text.
const META_CHARS: &[char] =
    &['^', '$', '\\', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|'];

/// Returns true when `pattern` contains at least one metacharacter.
pub(crate) fn has_meta_chars(pattern: &str) -> bool {
    pattern.contains(META_CHARS)
}

/// A literal needle, encoded for both character widths.
#[derive(Clone, Debug)]
pub(crate) struct Needle {
    /// `None` when some character of the pattern does not fit in Latin-1, in
    /// which case no narrow haystack can contain it.
    latin1: Option<Box<[u8]>>,
    utf16: Box<[u16]>,
}

impl Needle {
    pub(crate) fn new(pattern: &str) -> Needle {
        let latin1 = pattern.chars().map(|ch| u8::try_from(u32::from(ch)).ok()).collect();
        let utf16 = pattern.encode_utf16().collect();
        Needle { latin1, utf16 }
    }

    /// Length of the needle in code units of the given haystack's width.
    fn len_for(&self, haystack: &CharBuffer<'_>) -> Option<usize> {
        match *haystack {
            CharBuffer::Latin1(_) => self.latin1.as_ref().map(|n| n.len()),
            CharBuffer::TwoByte(_) => Some(self.utf16.len()),
        }
    }

    /// Finds the first occurrence of this needle at or after `start`. Returns
    /// the code unit offsets of the occurrence.
    pub(crate) fn find(&self, haystack: CharBuffer<'_>, start: usize) -> Option<(usize, usize)> {
        if start > haystack.len() {
            return None;
        }
        let len = self.len_for(&haystack)?;
        let pos = match haystack {
            CharBuffer::Latin1(chars) => memmem::find(&chars[start..], self.latin1.as_deref()?)?,
            CharBuffer::TwoByte(chars) => find_units(&chars[start..], &self.utf16)?,
        };
        Some((start + pos, start + pos + len))
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.latin1.as_ref().map_or(0, |n| n.len()) + self.utf16.len() * 2
    }
}

fn find_units(haystack: &[u16], needle: &[u16]) -> Option<usize> {
    let Some((&first, rest)) = needle.split_first() else {
        return Some(0);
    };
    if haystack.len() < needle.len() {
        return None;
    }
    let last_start = haystack.len() - needle.len();
    (0..=last_start).find(|&i| haystack[i] == first && &haystack[i + 1..i + needle.len()] == rest)
}
