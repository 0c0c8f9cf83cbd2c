use super::{Detector, Phase, SeatOrder};
use crate::config::DetectorConfig;
use crate::meld::{Group, LastDiscard};
use crate::snapshot::Snapshot;

impl Detector {
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }
    #[inline]
    #[must_use]
    pub const fn in_game(&self) -> bool {
        matches!(self.phase, Phase::InGame)
    }

    /// The seat expected to act next, taking a pending caller into account.
    #[inline]
    #[must_use]
    pub fn seat_at_turn(&self) -> u8 {
        self.tracking.turn.seat_at_turn()
    }
    #[inline]
    #[must_use]
    pub const fn seat_order(&self) -> SeatOrder {
        self.tracking.turn.order()
    }

    /// Physical seat id of a relative seat, looked up in the seat list of
    /// the current game.
    #[inline]
    #[must_use]
    pub fn physical_seat(&self, seat: u8) -> Option<u64> {
        let slot = self.seat_order().slot(seat);
        self.tracking.seat_list.get(slot as usize).copied()
    }

    #[inline]
    #[must_use]
    pub const fn last_discard(&self) -> Option<LastDiscard> {
        self.tracking.last_discard
    }

    #[inline]
    #[must_use]
    pub fn melds(&self, seat: u8) -> &[Group] {
        &self.tracking.melds[(seat % 4) as usize]
    }

    /// Number of actions remembered for duplicate suppression.
    #[inline]
    #[must_use]
    pub fn ledger_len(&self) -> usize {
        self.tracking.ledger.len()
    }

    /// The last snapshot accepted as baseline.
    #[inline]
    #[must_use]
    pub const fn previous(&self) -> Option<&Snapshot> {
        self.prev.as_ref()
    }
}
