use crate::error::DetectError;
use crate::tile::Tile;

use anyhow::{Result, ensure};

/// Maps relative seats (0 = self, 1 = next, 2 = across, 3 = previous) to
/// turn slots, slot 0 being East, who acts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatOrder {
    slots: [u8; 4],
}

impl Default for SeatOrder {
    fn default() -> Self {
        Self {
            slots: [0, 1, 2, 3],
        }
    }
}

impl SeatOrder {
    /// Relative seats follow turn order, so our own seat wind fixes the
    /// whole permutation.
    pub fn from_seat_wind(seat_wind: Option<Tile>) -> Result<Self, DetectError> {
        let wind = seat_wind
            .and_then(Tile::as_wind)
            .ok_or(DetectError::MissingWindData)?;
        let mut slots = [0; 4];
        for (seat, slot) in (0..4).zip(slots.iter_mut()) {
            *slot = (wind + seat) % 4;
        }
        Ok(Self { slots })
    }

    #[inline]
    #[must_use]
    pub const fn slot(&self, seat: u8) -> u8 {
        self.slots[(seat % 4) as usize]
    }

    /// The relative seat sitting East.
    #[must_use]
    pub fn dealer(&self) -> u8 {
        (0..4).find(|&seat| self.slot(seat) == 0).unwrap_or(0)
    }

    #[must_use]
    pub fn is_permutation(&self) -> bool {
        let mut seen = [false; 4];
        for &slot in &self.slots {
            match seen.get_mut(slot as usize) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        true
    }
}

/// Whose turn it is. A meld hands the turn to its owner until they
/// discard; the discard then passes it on to the following seat.
#[derive(Debug, Clone, Default)]
pub struct TurnTracker {
    order: SeatOrder,
    at_turn: u8,
    turn_override: Option<u8>,
}

impl TurnTracker {
    #[must_use]
    pub fn new(order: SeatOrder) -> Self {
        Self {
            order,
            at_turn: order.dealer(),
            turn_override: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn order(&self) -> SeatOrder {
        self.order
    }

    #[inline]
    #[must_use]
    pub fn seat_at_turn(&self) -> u8 {
        self.turn_override.unwrap_or(self.at_turn)
    }

    pub const fn on_discard(&mut self, seat: u8) {
        self.at_turn = (seat + 1) % 4;
        self.turn_override = None;
    }

    pub const fn on_meld(&mut self, seat: u8) {
        self.turn_override = Some(seat);
    }

    pub(super) fn check(&self) -> Result<()> {
        ensure!(self.at_turn < 4, "turn pointer {} out of range", self.at_turn);
        ensure!(
            self.turn_override.is_none_or(|s| s < 4),
            "turn override {:?} out of range",
            self.turn_override,
        );
        ensure!(
            self.order.is_permutation(),
            "seat order {:?} is not a permutation",
            self.order,
        );
        Ok(())
    }
}
