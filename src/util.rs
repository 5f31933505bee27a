pub(crate) mod sparse_set;

/// Returns true if and only if the given code unit is an ASCII word
/// character, i.e. `[0-9A-Za-z_]`.
#[cfg_attr(feature = "perf-inline", inline(always))]
pub(crate) fn is_word_unit(unit: u32) -> bool {
    const fn mkwordset() -> [bool; 128] {
        let mut set = [false; 128];
        set[b'_' as usize] = true;

        let mut byte = b'0';
        while byte <= b'9' {
            set[byte as usize] = true;
            byte += 1;
        }
        byte = b'A';
        while byte <= b'Z' {
            set[byte as usize] = true;
            byte += 1;
        }
        byte = b'a';
        while byte <= b'z' {
            set[byte as usize] = true;
            byte += 1;
        }
        set
    }
    const WORD: [bool; 128] = mkwordset();
    unit < 128 && WORD[unit as usize]
}

/// Returns true if the code unit, read as a scalar value, is a Unicode word
/// character. Lone surrogates are never word characters.
#[cfg_attr(feature = "perf-inline", inline(always))]
pub(crate) fn is_word_unit_unicode(unit: u32) -> bool {
    if unit < 128 {
        return is_word_unit(unit);
    }
    char::from_u32(unit).map_or(false, regex_syntax::is_word_character)
}
