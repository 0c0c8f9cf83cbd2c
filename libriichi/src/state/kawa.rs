use crate::multiset;
use crate::tile::Tile;

use ahash::AHashMap;

/// Per-seat discard pile baselines plus our own hand, used to turn pile
/// growth into discards.
///
/// A baseline is the pile a seat is expected to show: it grows when a
/// discard is taken at the seat's turn and only shrinks when a call claims
/// a tile and that tile leaves the pile. A pile that shrinks for no reason
/// is a bad reading, so its tiles coming back are not new discards.
#[derive(Debug, Clone, Default)]
pub struct KawaTracker {
    piles: [Vec<Tile>; 4],
    /// Tiles claimed by calls that are still shown in the pile.
    claimed: [Vec<Tile>; 4],
    /// Discards taken so far, per seat and tile.
    taken: [AHashMap<Tile, usize>; 4],
    hand: Vec<Tile>,
}

impl KawaTracker {
    #[must_use]
    pub fn new(piles: &[Vec<Tile>; 4], hand: &[Tile]) -> Self {
        Self {
            piles: piles.clone(),
            hand: hand.to_vec(),
            ..Default::default()
        }
    }

    /// Takes the tile newly discarded by `seat`, if any, and returns it with
    /// how many times the seat has discarded that tile, this one included.
    pub fn take_discard(&mut self, seat: u8, pile: &[Tile]) -> Option<(Tile, usize)> {
        let baseline = &mut self.piles[seat as usize];
        let added = multiset::difference(pile, baseline);
        let &pai = added.first()?;
        if added.len() > 1 {
            log::warn!(
                "seat {seat}: {} tiles appeared in the discard pile at once, taking {pai}",
                added.len(),
            );
        }
        baseline.extend(added);

        let taken = self.taken[seat as usize].entry(pai).or_default();
        *taken += 1;
        Some((pai, *taken))
    }

    /// A call took `pai` off the pile of `seat`.
    pub fn claim(&mut self, seat: u8, pai: Tile) {
        self.claimed[seat as usize].push(pai);
    }

    /// Drops claimed tiles from the baselines once the piles stop showing
    /// them.
    pub fn settle(&mut self, piles: &[Vec<Tile>; 4]) {
        for ((baseline, claimed), pile) in self.piles.iter_mut().zip(&mut self.claimed).zip(piles) {
            claimed.retain(|pai| {
                if multiset::count(pile, pai) >= multiset::count(baseline, pai) {
                    return true;
                }
                if let Some(idx) = baseline.iter().position(|t| t == pai) {
                    baseline.remove(idx);
                }
                false
            });
        }
    }

    /// Seats other than `at_turn` whose pile shows tiles the baseline lacks.
    pub fn stale_seats<'a>(
        &'a self,
        piles: &'a [Vec<Tile>; 4],
        at_turn: u8,
    ) -> impl Iterator<Item = u8> + 'a {
        (0..4).filter(move |&seat| {
            seat != at_turn
                && !multiset::difference(&piles[seat as usize], &self.piles[seat as usize])
                    .is_empty()
        })
    }

    /// The tile we drew before discarding `pai`: the first tile in `hand`
    /// that the hand baseline lacks, or `pai` itself when the drawn tile was
    /// discarded straight away. Rebases the hand.
    pub fn take_tsumo(&mut self, hand: &[Tile], pai: Tile) -> Tile {
        let drawn = multiset::difference(hand, &self.hand);
        self.hand = hand.to_vec();
        drawn.first().copied().unwrap_or(pai)
    }

    /// After a call of ours the hand shrinks without a draw.
    pub fn rebase_hand(&mut self, hand: &[Tile]) {
        self.hand = hand.to_vec();
    }
}
