use proptest::{prop_assert_eq, proptest};

use crate::input::CharBuffer;

use super::{has_meta_chars, Needle};

#[test]
fn meta_chars() {
    assert!(!has_meta_chars("abc"));
    assert!(!has_meta_chars(""));
    assert!(!has_meta_chars("a-b/c d"));
    for pattern in ["a.c", "^a", "a$", "a*", "a+", "a?", "(a)", "[a]", "a{2}", "a|b", "\\d"] {
        assert!(has_meta_chars(pattern), "{pattern}");
    }
}

#[test]
fn narrow() {
    let needle = Needle::new("bb");
    let hay = CharBuffer::latin1(b"abbabb");
    assert_eq!(needle.find(hay, 0), Some((1, 3)));
    assert_eq!(needle.find(hay, 2), Some((4, 6)));
    assert_eq!(needle.find(hay, 5), None);
    assert_eq!(needle.find(hay, 7), None);
}

#[test]
fn empty_needle_matches_at_start() {
    let needle = Needle::new("");
    assert_eq!(needle.find(CharBuffer::latin1(b"abc"), 2), Some((2, 2)));
    assert_eq!(needle.find(CharBuffer::latin1(b"abc"), 3), Some((3, 3)));
    let wide: Vec<u16> = "abc".encode_utf16().collect();
    assert_eq!(needle.find(CharBuffer::two_byte(&wide), 1), Some((1, 1)));
}

#[test]
fn latin1_needle() {
    let needle = Needle::new("é");
    assert_eq!(needle.find(CharBuffer::latin1(b"caf\xE9"), 0), Some((3, 4)));
}

#[test]
fn wide_only_needle() {
    let needle = Needle::new("β");
    assert_eq!(needle.find(CharBuffer::latin1(b"abc"), 0), None);
    let wide: Vec<u16> = "αβγ".encode_utf16().collect();
    assert_eq!(needle.find(CharBuffer::two_byte(&wide), 0), Some((1, 2)));
}

#[test]
fn astral_needle_counts_units() {
    let needle = Needle::new("😀");
    let wide: Vec<u16> = "a😀".encode_utf16().collect();
    assert_eq!(needle.find(CharBuffer::two_byte(&wide), 0), Some((1, 3)));
}

proptest! {
    #[test]
    fn wide_agrees_with_narrow(haystack in "[ab]{0,16}", needle in "[ab]{0,3}", start in 0usize..17) {
        let start = start.min(haystack.len());
        let n = Needle::new(&needle);
        let wide: Vec<u16> = haystack.encode_utf16().collect();
        prop_assert_eq!(
            n.find(CharBuffer::latin1(haystack.as_bytes()), start),
            n.find(CharBuffer::two_byte(&wide), start)
        );
    }
}
