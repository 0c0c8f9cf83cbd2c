use crate::meld::{Group, MeldKind};
use crate::tile::Tile;
use std::collections::VecDeque;

use ahash::AHashSet;
use derivative::Derivative;

/// Identity of an emitted action within one game.
///
/// `nth` is how many copies of the tile (or group) the zone holds once the
/// action happened, so a second discard of the same tile is a new key while
/// re-reading the same board is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    Discard {
        seat: u8,
        pai: Tile,
        nth: usize,
    },
    Meld {
        seat: u8,
        kind: MeldKind,
        tiles: Group,
        nth: usize,
    },
}

/// Bounded memory of emitted actions. Oldest keys are forgotten first.
#[derive(Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Ledger {
    order: VecDeque<LedgerKey>,
    seen: AHashSet<LedgerKey>,
    #[derivative(Default(value = "256"))]
    capacity: usize,
}

impl Ledger {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ..Default::default()
        }
    }

    /// Returns `false` if the key was already recorded.
    pub fn record(&mut self, key: LedgerKey) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key.clone());
        self.order.push_back(key);
        true
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &LedgerKey) -> bool {
        self.seen.contains(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}
