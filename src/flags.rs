/*!
Regular expression flags.

The flag set is closed: the four letters `g`, `i`, `m` and `y` are the only
ones understood, and the bit values below are the ones stored when a pattern
key is serialized.
*/

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};

use crate::error::Error;

#[cfg(test)]
mod tests;

bitflags::bitflags! {
    /// The set of flags a pattern was created with.
    ///
    /// Two patterns with the same source text but different flags are
    /// different cache entries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FlagSet: u8 {
        /// `i`: case-insensitive matching.
        const IGNORE_CASE = 0x01;
        /// `g`: global matching. The engine itself ignores it; it only
        /// distinguishes cache entries and is rendered back by `Display`.
        const GLOBAL = 0x02;
        /// `m`: `^` and `$` match at line boundaries.
        const MULTILINE = 0x04;
        /// `y`: a match must begin exactly at the start offset.
        const STICKY = 0x08;
    }
}

/// Letters in the order they are rendered.
const CANONICAL: [(char, FlagSet); 4] = [
    ('g', FlagSet::GLOBAL),
    ('i', FlagSet::IGNORE_CASE),
    ('m', FlagSet::MULTILINE),
    ('y', FlagSet::STICKY),
];

impl FlagSet {
    /// Parses a textual flag string such as `"gim"`.
    ///
    /// Letters may appear in any order. Parsing stops at the first letter
    /// that is unknown or already present, and that letter is reported by
    /// [`Error::bad_flag`].
    ///
    /// # Example
    ///
    /// ```
    /// use regex_shared::FlagSet;
    ///
    /// let flags = FlagSet::parse("mg").unwrap();
    /// assert_eq!(flags, FlagSet::MULTILINE | FlagSet::GLOBAL);
    /// assert_eq!(Some('g'), FlagSet::parse("gg").unwrap_err().bad_flag());
    /// ```
    pub fn parse(text: &str) -> Result<FlagSet, Error> {
        let mut flags = FlagSet::empty();
        for ch in text.chars() {
            let flag = match ch {
                'i' => FlagSet::IGNORE_CASE,
                'g' => FlagSet::GLOBAL,
                'm' => FlagSet::MULTILINE,
                'y' => FlagSet::STICKY,
                _ => return Err(Error::bad_flag_char(ch)),
            };
            if flags.contains(flag) {
                return Err(Error::bad_flag_char(ch));
            }
            flags |= flag;
        }
        Ok(flags)
    }

    pub fn ignore_case(self) -> bool {
        self.contains(FlagSet::IGNORE_CASE)
    }

    pub fn global(self) -> bool {
        self.contains(FlagSet::GLOBAL)
    }

    pub fn multiline(self) -> bool {
        self.contains(FlagSet::MULTILINE)
    }

    pub fn sticky(self) -> bool {
        self.contains(FlagSet::STICKY)
    }
}

impl FromStr for FlagSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<FlagSet, Error> {
        FlagSet::parse(s)
    }
}

/// Renders the flag letters in the order `g`, `i`, `m`, `y`.
impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, flag) in CANONICAL {
            if self.contains(flag) {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for FlagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<FlagSet, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        FlagSet::from_bits(bits)
            .ok_or_else(|| de::Error::custom(format_args!("unknown flag bits {:#04x}", bits)))
    }
}
