use regex_automata::util::primitives::NonMaxUsize;

use crate::flags::FlagSet;
use crate::pattern::CompileMode;
use crate::syntax::parse;

use super::{NativeCode, Transcoded};

fn native(pattern: &str, mode: CompileMode) -> NativeCode {
    let hir = parse(pattern, FlagSet::empty(), 250).unwrap();
    NativeCode::new(&hir, mode, Some(10 * (1 << 20))).unwrap()
}

fn spans(slots: &[Option<NonMaxUsize>]) -> Vec<Option<(usize, usize)>> {
    slots
        .chunks(2)
        .map(|pair| Some((pair[0]?.get(), pair[1]?.get())))
        .collect()
}

#[test]
fn ascii_haystack_is_borrowed() {
    let text = Transcoded::new(b"abc", 0);
    assert!(text.offsets.is_none());
    assert_eq!(text.to_byte(2), 2);
    assert_eq!(text.to_unit(3), 3);
}

#[test]
fn latin1_offsets() {
    let text = Transcoded::new(b"a\xE9b\xFF", 0);
    assert_eq!(&*text.bytes, "aébÿ".as_bytes());
    assert_eq!(text.to_byte(2), 3);
    assert_eq!(text.to_byte(4), 6);
    assert_eq!(text.to_unit(3), 2);
    assert_eq!(text.to_unit(6), 4);
}

#[test]
fn only_the_tail_is_transcoded() {
    let text = Transcoded::new(b"\xE9\xE9ab\xE9", 3);
    assert_eq!(&*text.bytes, "abé".as_bytes());
    assert_eq!(text.to_byte(3), 1);
    assert_eq!(text.to_byte(5), 4);
    assert_eq!(text.to_unit(2), 4);
    assert_eq!(text.to_unit(4), 5);

    let text = Transcoded::new(b"\xE9\xE9ab", 3);
    assert!(text.offsets.is_none());
    assert_eq!(&*text.bytes, b"ab");
    assert_eq!(text.to_byte(3), 1);
    assert_eq!(text.to_unit(2), 4);
}

#[test]
fn look_behind_sees_the_unit_before_start() {
    let code = native(r"\Bb", CompileMode::Normal);
    let mut slots = vec![None; 2];
    assert!(code.search(b"\xE9\xE9ab", 3, false, &mut slots));
    assert_eq!(spans(&slots), vec![Some((3, 4))]);

    let hir = parse("^b", FlagSet::MULTILINE, 250).unwrap();
    let code = NativeCode::new(&hir, CompileMode::Normal, None).unwrap();
    assert!(!code.search(b"\xE9ab", 2, true, &mut slots));
    assert!(code.search(b"\xE9\nb", 2, true, &mut slots));
    assert_eq!(spans(&slots), vec![Some((2, 3))]);
    assert!(!code.search(b"\xE9b", 1, true, &mut slots));
}

#[test]
fn captures_map_back_to_units() {
    let code = native(r"(é+)(b)?", CompileMode::Normal);
    let mut slots = vec![None; 6];
    assert!(code.search(b"x\xE9\xE9y", 0, false, &mut slots));
    assert_eq!(spans(&slots), vec![Some((1, 3)), Some((1, 3)), None]);
}

#[test]
fn start_and_anchoring() {
    let code = native(r"b+", CompileMode::Normal);
    let mut slots = vec![None; 2];
    assert!(code.search(b"\xE9abb", 2, true, &mut slots));
    assert_eq!(spans(&slots), vec![Some((2, 4))]);
    assert!(!code.search(b"\xE9abb", 1, true, &mut slots));
    assert!(code.search(b"\xE9abb", 1, false, &mut slots));
    assert_eq!(spans(&slots), vec![Some((2, 4))]);
}

#[test]
fn match_only() {
    let code = native(r"a\d+", CompileMode::MatchOnly);
    assert!(code.search(b"xxa12", 0, false, &mut []));
    assert!(!code.search(b"xxa12", 3, false, &mut []));
}

#[test]
fn size_limit_declines() {
    let hir = parse(r"\w{100}", FlagSet::empty(), 250).unwrap();
    assert!(NativeCode::new(&hir, CompileMode::Normal, Some(16)).is_none());
}
