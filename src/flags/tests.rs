use super::FlagSet;

#[test]
fn parse_combined() {
    let flags = FlagSet::parse("gim").unwrap();
    assert!(flags.global());
    assert!(flags.ignore_case());
    assert!(flags.multiline());
    assert!(!flags.sticky());
}

#[test]
fn parse_empty() {
    assert_eq!(FlagSet::parse("").unwrap(), FlagSet::empty());
}

#[test]
fn order_is_irrelevant() {
    assert_eq!(FlagSet::parse("ymig").unwrap(), FlagSet::parse("gimy").unwrap());
    assert_eq!(FlagSet::parse("ymig").unwrap(), FlagSet::all());
}

#[test]
fn duplicate_reports_letter() {
    let err = FlagSet::parse("gg").unwrap_err();
    assert_eq!(err.bad_flag(), Some('g'));
    let err = FlagSet::parse("imi").unwrap_err();
    assert_eq!(err.bad_flag(), Some('i'));
}

#[test]
fn unknown_reports_letter() {
    assert_eq!(FlagSet::parse("x").unwrap_err().bad_flag(), Some('x'));
    // parsing stops at the first bad letter
    assert_eq!(FlagSet::parse("gxq").unwrap_err().bad_flag(), Some('x'));
    assert_eq!(FlagSet::parse("gé").unwrap_err().bad_flag(), Some('é'));
}

#[test]
fn display_is_canonical() {
    assert_eq!(FlagSet::parse("ymig").unwrap().to_string(), "gimy");
    assert_eq!(FlagSet::parse("mi").unwrap().to_string(), "im");
    assert_eq!(FlagSet::empty().to_string(), "");
}

#[test]
fn bits_match_flag_word() {
    assert_eq!(FlagSet::IGNORE_CASE.bits(), 0x01);
    assert_eq!(FlagSet::GLOBAL.bits(), 0x02);
    assert_eq!(FlagSet::MULTILINE.bits(), 0x04);
    assert_eq!(FlagSet::STICKY.bits(), 0x08);
}

#[test]
fn serde_rejects_unknown_bits() {
    let flags: FlagSet = serde_json::from_str("5").unwrap();
    assert_eq!(flags, FlagSet::IGNORE_CASE | FlagSet::MULTILINE);
    assert!(serde_json::from_str::<FlagSet>("16").is_err());
}
