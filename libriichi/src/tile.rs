use crate::{matches_tu8, t, tu8};
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use ahash::AHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const TILE_STRINGS_LEN: usize = 3 * 9 + 4 + 3 + 3 + 1;
const TILE_STRINGS: [&str; TILE_STRINGS_LEN] = [
    "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", // m
    "1p", "2p", "3p", "4p", "5p", "6p", "7p", "8p", "9p", // p
    "1s", "2s", "3s", "4s", "5s", "6s", "7s", "8s", "9s", // s
    "1z", "2z", "3z", "4z", "5z", "6z", "7z", // z
    "0m", "0p", "0s", // aka
    "?",  // unknown
];

static TILE_STRINGS_MAP: LazyLock<AHashMap<&'static str, Tile>> = LazyLock::new(|| {
    TILE_STRINGS
        .iter()
        .enumerate()
        .map(|(id, &s)| (s, Tile(id as u8)))
        .collect()
});

/// One of the 38 tile values a snapshot may contain, red fives and the
/// unknown (face-down) tile included.
///
/// Equality is exact: `0p` and `5p` are different tiles. Use
/// [`Tile::deaka`] when the red flag should not matter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile(u8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidTile {
    Number(usize),
    String(String),
}

impl Tile {
    /// The id is not checked. Out-of-range ids panic once displayed.
    #[inline]
    #[must_use]
    pub const fn new_unchecked(id: u8) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn deaka(self) -> Self {
        match self.0 {
            tu8!(0m) => t!(5m),
            tu8!(0p) => t!(5p),
            tu8!(0s) => t!(5s),
            _ => self,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_aka(self) -> bool {
        matches_tu8!(self.0, 0m | 0p | 0s)
    }

    #[inline]
    #[must_use]
    pub const fn is_jihai(self) -> bool {
        matches_tu8!(self.0, 1z | 2z | 3z | 4z | 5z | 6z | 7z)
    }

    #[inline]
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        self.0 >= tu8!(?)
    }

    /// 0 = man, 1 = pin, 2 = sou, 3 = honors. `None` for the unknown tile.
    #[inline]
    #[must_use]
    pub const fn suit(self) -> Option<u8> {
        if self.is_unknown() {
            None
        } else {
            Some(self.deaka().0 / 9)
        }
    }

    /// 1-based rank within the suit; a red five ranks 5.
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.deaka().0 % 9 + 1
    }

    /// E, S, W, N as 0..=3.
    #[inline]
    #[must_use]
    pub const fn as_wind(self) -> Option<u8> {
        if matches_tu8!(self.0, 1z | 2z | 3z | 4z) {
            Some(self.0 - tu8!(1z))
        } else {
            None
        }
    }

    /// The tile designated as dora when `self` is the indicator.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        if self.is_unknown() {
            return self;
        }
        let tile = self.deaka();
        let kind = tile.0 / 9;
        let num = tile.0 % 9;

        if kind < 3 {
            Self(kind * 9 + (num + 1) % 9)
        } else if num < 4 {
            Self(3 * 9 + (num + 1) % 4)
        } else {
            Self(3 * 9 + 4 + (num - 4 + 1) % 3)
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        t!(?)
    }
}

impl TryFrom<u8> for Tile {
    type Error = InvalidTile;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::try_from(v as usize)
    }
}

impl TryFrom<usize> for Tile {
    type Error = InvalidTile;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        if v >= TILE_STRINGS_LEN {
            Err(InvalidTile::Number(v))
        } else {
            Ok(Self(v as u8))
        }
    }
}

impl FromStr for Tile {
    type Err = InvalidTile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TILE_STRINGS_MAP
            .get(s)
            .copied()
            .ok_or_else(|| InvalidTile::String(s.to_owned()))
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(TILE_STRINGS[self.0 as usize])
    }
}

impl<'de> Deserialize<'de> for Tile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tile = String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)?;
        Ok(tile)
    }
}

impl Serialize for Tile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl fmt::Display for InvalidTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not a valid tile: ")?;
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl Error for InvalidTile {}
