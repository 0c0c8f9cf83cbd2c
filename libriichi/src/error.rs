use crate::meld::Group;
use crate::tile::{InvalidTile, Tile};
use std::error::Error;
use std::fmt;

/// Recoverable problems found while turning a snapshot into events.
///
/// None of these stop the stream: the offending seat or snapshot is skipped
/// and the error is handed back in [`Report::diagnostics`] so callers can
/// tell "nothing happened" apart from "something looked wrong".
///
/// [`Report::diagnostics`]: crate::state::Report::diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    InvalidTileFormat(InvalidTile),
    /// Structurally broken input: bad JSON, oversized groups and the like.
    InvalidSnapshot(String),
    /// More copies of one tile than the set contains.
    TileOverflow { tile: Tile, count: u8 },
    /// A new meld group appeared but fits no call type.
    AmbiguousMeld { seat: u8, tiles: Group },
    /// A discard pile changed on a seat that is not at turn.
    TurnViolation { seat: u8, at_turn: u8 },
    MissingWindData,
    /// Detection failed for this tick; its partial results were dropped.
    Internal(String),
}

impl From<InvalidTile> for DetectError {
    fn from(v: InvalidTile) -> Self {
        Self::InvalidTileFormat(v)
    }
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileFormat(e) => fmt::Display::fmt(e, f),
            Self::InvalidSnapshot(msg) => write!(f, "invalid snapshot: {msg}"),
            Self::TileOverflow { tile, count } => {
                write!(f, "{tile} seen {count} times on the board")
            }
            Self::AmbiguousMeld { seat, tiles } => {
                write!(f, "cannot classify new meld {tiles:?} of seat {seat}")
            }
            Self::TurnViolation { seat, at_turn } => write!(
                f,
                "discard pile of seat {seat} changed while seat {at_turn} is at turn"
            ),
            Self::MissingWindData => f.write_str("missing or malformed wind data"),
            Self::Internal(msg) => write!(f, "detection failed: {msg}"),
        }
    }
}

impl Error for DetectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTileFormat(e) => Some(e),
            _ => None,
        }
    }
}
