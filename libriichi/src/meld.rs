//! Meld classification: given one seat's exposed groups before and after a
//! snapshot, work out which call produced the new group.
//!
//! The call types are tried as a ranked rule list, see [`RULES`]. The first
//! rule that produces a meld for any of the new groups wins, so an added quad
//! is never mistaken for a triplet plus a fresh quad.

use crate::multiset;
use crate::tile::Tile;
use std::fmt;

use serde::{Deserialize, Serialize};
use tinyvec::ArrayVec;

/// An exposed tile group as read off the board, sorted by tile id.
pub type Group = ArrayVec<[Tile; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeldKind {
    /// Sequence called off a discard.
    Chi,
    /// Triplet called off a discard.
    Pon,
    /// Concealed quad.
    Ankan,
    /// Open quad called off a discard.
    Daiminkan,
    /// Triplet upgraded in place to a quad.
    Kakan,
}

impl MeldKind {
    /// Operation code used in the serialized action log.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Chi => 2,
            Self::Pon => 3,
            Self::Ankan => 4,
            Self::Daiminkan => 5,
            Self::Kakan => 6,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(self, Self::Chi | Self::Pon | Self::Daiminkan)
    }
}

impl fmt::Display for MeldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Chi => "chi",
            Self::Pon => "pon",
            Self::Ankan => "ankan",
            Self::Daiminkan => "daiminkan",
            Self::Kakan => "kakan",
        };
        f.write_str(s)
    }
}

/// Which seats may complete a sequence off a discard.
///
/// Seats are relative to self: 0 = self, 1 = next, 2 = across,
/// 3 = previous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceCallRule {
    /// Self or the next seat, whoever discarded.
    #[default]
    FixedSeats,
    /// Only the seat right after the discarder in turn order.
    AfterDiscarder,
    Unrestricted,
}

impl SequenceCallRule {
    #[must_use]
    pub const fn allows(self, caller: u8, discarder: u8) -> bool {
        match self {
            Self::FixedSeats => caller <= 1,
            Self::AfterDiscarder => caller == (discarder + 1) % 4,
            Self::Unrestricted => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastDiscard {
    pub seat: u8,
    pub pai: Tile,
}

/// A classified meld, owned by the seat it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meld {
    pub kind: MeldKind,
    /// The called tile, the added tile of a kakan, or the quad tile of an
    /// ankan.
    pub pai: Tile,
    pub tiles: Group,
    /// Seat the called tile came from.
    pub target: Option<u8>,
    /// Slot of `tiles` holding the called tile.
    pub called: Option<usize>,
}

impl Meld {
    /// One entry per slot of `tiles`; the called slot holds the discarder's
    /// seat.
    #[must_use]
    pub fn form(&self) -> ArrayVec<[Option<u8>; 4]> {
        (0..self.tiles.len())
            .map(|i| {
                if self.called == Some(i) {
                    self.target
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Everything a rule may look at besides the group diff.
#[derive(Debug, Clone, Copy)]
pub struct MeldContext {
    pub seat: u8,
    pub last_discard: Option<LastDiscard>,
    pub sequence_rule: SequenceCallRule,
}

impl MeldContext {
    /// The last discard, unless `seat` made it itself.
    fn callable_discard(&self) -> Option<LastDiscard> {
        self.last_discard.filter(|d| d.seat != self.seat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Unchanged,
    Meld(Meld),
    /// New groups exist but no rule matched. Carries the first of them.
    Ambiguous(Group),
}

struct GroupDiff {
    added: Vec<Group>,
    removed: Vec<Group>,
}

type Rule = fn(&GroupDiff, &MeldContext) -> Option<Meld>;

/// Evaluated in order; earlier rules take priority.
const RULES: [(&str, Rule); 3] = [
    ("kakan", added_quad),
    ("ankan", concealed_quad),
    ("call", called_off_discard),
];

pub fn classify(prev: &[Group], curr: &[Group], ctx: &MeldContext) -> Classification {
    let diff = GroupDiff {
        added: multiset::difference(curr, prev),
        removed: multiset::difference(prev, curr),
    };
    let Some(first) = diff.added.first() else {
        return Classification::Unchanged;
    };

    for (name, rule) in RULES {
        if let Some(meld) = rule(&diff, ctx) {
            log::debug!("seat {}: {name} rule matched {:?}", ctx.seat, meld.tiles);
            return Classification::Meld(meld);
        }
    }
    Classification::Ambiguous(*first)
}

/// Sorts the tiles of a raw group.
#[must_use]
pub fn normalize(tiles: &[Tile]) -> Group {
    let mut group: Group = tiles.iter().copied().collect();
    group.sort_unstable();
    group
}

fn known(group: &Group) -> ArrayVec<[Tile; 4]> {
    group.iter().copied().filter(|t| !t.is_unknown()).collect()
}

fn all_same_kind(tiles: &[Tile]) -> bool {
    match tiles.first() {
        Some(first) if !first.is_unknown() => {
            let kind = first.deaka();
            tiles.iter().all(|t| t.deaka() == kind)
        }
        _ => false,
    }
}

fn is_sequence(tiles: &[Tile]) -> bool {
    if tiles.len() != 3 {
        return false;
    }
    let Some(suit) = tiles[0].suit() else {
        return false;
    };
    if tiles[0].is_jihai() || tiles.iter().any(|t| t.suit() != Some(suit)) {
        return false;
    }
    let mut ranks: ArrayVec<[u8; 3]> = tiles.iter().map(|t| t.rank()).collect();
    ranks.sort_unstable();
    ranks[1] == ranks[0] + 1 && ranks[2] == ranks[1] + 1
}

/// A known triplet of the seat grew by one identical tile.
fn added_quad(diff: &GroupDiff, ctx: &MeldContext) -> Option<Meld> {
    diff.added.iter().find_map(|quad| {
        if quad.len() != 4 || !all_same_kind(quad) {
            return None;
        }
        let triplet = diff.removed.iter().find(|old| {
            old.len() == 3 && all_same_kind(old) && multiset::is_subset(old, quad)
        })?;
        let added = multiset::difference(quad, triplet);
        let &pai = added.first()?;
        log::trace!("seat {}: {triplet:?} -> {quad:?}", ctx.seat);
        Some(Meld {
            kind: MeldKind::Kakan,
            pai,
            tiles: *quad,
            target: None,
            called: None,
        })
    })
}

/// Two identical tiles (the other two face down), or four identical tiles
/// that the last discard cannot account for.
fn concealed_quad(diff: &GroupDiff, ctx: &MeldContext) -> Option<Meld> {
    let discard = ctx.callable_discard();
    diff.added.iter().find_map(|group| {
        let visible = known(group);
        let pai = *visible.first()?;
        let from_discard = discard.is_some_and(|d| visible.contains(&d.pai));

        let is_quad = match (group.len(), visible.len()) {
            (2, 2) | (4, 2) => all_same_kind(&visible) && !from_discard,
            (4, 4) => all_same_kind(&visible) && !from_discard,
            _ => false,
        };
        if !is_quad {
            return None;
        }

        let tiles = if visible.len() == 4 {
            *group
        } else {
            normalize(&[pai; 4])
        };
        Some(Meld {
            kind: MeldKind::Ankan,
            pai,
            tiles,
            target: None,
            called: None,
        })
    })
}

/// A new 3 or 4 tile group containing the last discard of another seat.
fn called_off_discard(diff: &GroupDiff, ctx: &MeldContext) -> Option<Meld> {
    let discard = ctx.callable_discard()?;
    diff.added.iter().find_map(|group| {
        if group.iter().any(|t| t.is_unknown()) {
            return None;
        }
        let called = group.iter().position(|&t| t == discard.pai)?;

        let kind = match group.len() {
            3 if all_same_kind(group) => MeldKind::Pon,
            4 if all_same_kind(group) => MeldKind::Daiminkan,
            3 if is_sequence(group) => {
                if !ctx.sequence_rule.allows(ctx.seat, discard.seat) {
                    log::debug!(
                        "seat {}: sequence {group:?} off seat {} not allowed by {:?}",
                        ctx.seat,
                        discard.seat,
                        ctx.sequence_rule,
                    );
                    return None;
                }
                MeldKind::Chi
            }
            _ => return None,
        };
        Some(Meld {
            kind,
            pai: discard.pai,
            tiles: *group,
            target: Some(discard.seat),
            called: Some(called),
        })
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::t;

    fn g(tiles: &[Tile]) -> Group {
        normalize(tiles)
    }

    fn ctx(seat: u8, last_discard: Option<(u8, Tile)>) -> MeldContext {
        MeldContext {
            seat,
            last_discard: last_discard.map(|(seat, pai)| LastDiscard { seat, pai }),
            sequence_rule: SequenceCallRule::default(),
        }
    }

    fn meld(c: Classification) -> Meld {
        match c {
            Classification::Meld(m) => m,
            other => panic!("expected a meld, got {other:?}"),
        }
    }

    #[test]
    fn unchanged() {
        let prev = [g(&t![1m, 1m, 1m])];
        assert_eq!(
            classify(&prev, &prev, &ctx(0, None)),
            Classification::Unchanged
        );
        // groups vanishing is not a new meld
        assert_eq!(classify(&prev, &[], &ctx(0, None)), Classification::Unchanged);
        // order inside a group does not matter
        let shuffled = [g(&t![2p, 4p, 3p])];
        let sorted = [g(&t![2p, 3p, 4p])];
        assert_eq!(
            classify(&sorted, &shuffled, &ctx(1, None)),
            Classification::Unchanged
        );
    }

    #[test]
    fn pon_off_discard() {
        let m = meld(classify(&[], &[g(&t![3s, 3s, 3s])], &ctx(3, Some((1, t!(3s))))));
        assert_eq!(m.kind, MeldKind::Pon);
        assert_eq!(m.pai, t!(3s));
        assert_eq!(m.target, Some(1));
        assert_eq!(m.form().as_slice(), &[Some(1), None, None]);
    }

    #[test]
    fn pon_with_red_five() {
        let m = meld(classify(&[], &[g(&t![5p, 0p, 5p])], &ctx(2, Some((1, t!(0p))))));
        assert_eq!(m.kind, MeldKind::Pon);
        assert_eq!(m.tiles.as_slice(), &t![5p, 5p, 0p]);
        assert_eq!(m.called, Some(2));
    }

    #[test]
    fn daiminkan() {
        let m = meld(classify(
            &[],
            &[g(&t![7z, 7z, 7z, 7z])],
            &ctx(2, Some((0, t!(7z)))),
        ));
        assert_eq!(m.kind, MeldKind::Daiminkan);
        assert_eq!(m.target, Some(0));
        assert_eq!(m.form().as_slice(), &[Some(0), None, None, None]);
    }

    #[test]
    fn chi_rules() {
        let curr = [g(&t![4m, 0m, 6m])];

        // next seat off self: allowed by every rule
        let m = meld(classify(&[], &curr, &ctx(1, Some((0, t!(6m))))));
        assert_eq!(m.kind, MeldKind::Chi);
        assert_eq!(m.called, Some(1));

        // across seat never completes a sequence with the fixed-seat rule
        assert_eq!(
            classify(&[], &curr, &ctx(2, Some((1, t!(6m))))),
            Classification::Ambiguous(curr[0])
        );

        let after = MeldContext {
            sequence_rule: SequenceCallRule::AfterDiscarder,
            ..ctx(2, Some((1, t!(6m))))
        };
        assert_eq!(meld(classify(&[], &curr, &after)).kind, MeldKind::Chi);

        let after_wrong = MeldContext {
            sequence_rule: SequenceCallRule::AfterDiscarder,
            ..ctx(1, Some((3, t!(6m))))
        };
        assert!(matches!(
            classify(&[], &curr, &after_wrong),
            Classification::Ambiguous(_)
        ));
    }

    #[test]
    fn honors_never_form_sequences() {
        let curr = [g(&t![1z, 2z, 3z])];
        assert!(matches!(
            classify(&[], &curr, &ctx(1, Some((0, t!(2z))))),
            Classification::Ambiguous(_)
        ));
        let wrap = [g(&t![8m, 9m, 1m])];
        assert!(matches!(
            classify(&[], &wrap, &ctx(1, Some((0, t!(9m))))),
            Classification::Ambiguous(_)
        ));
    }

    #[test]
    fn call_needs_discard_of_another_seat() {
        let curr = [g(&t![3s, 3s, 3s])];
        assert!(matches!(
            classify(&[], &curr, &ctx(1, None)),
            Classification::Ambiguous(_)
        ));
        assert!(matches!(
            classify(&[], &curr, &ctx(1, Some((1, t!(3s))))),
            Classification::Ambiguous(_)
        ));
        assert!(matches!(
            classify(&[], &curr, &ctx(1, Some((0, t!(4s))))),
            Classification::Ambiguous(_)
        ));
    }

    #[test]
    fn kakan_beats_triplet_reading() {
        let prev = [g(&t![7m, 7m, 7m])];
        let curr = [g(&t![7m, 7m, 7m, 7m])];
        // even with a 7m on the table, growing a triplet is a kakan
        let m = meld(classify(&prev, &curr, &ctx(0, Some((2, t!(7m))))));
        assert_eq!(m.kind, MeldKind::Kakan);
        assert_eq!(m.pai, t!(7m));
        assert_eq!(m.target, None);

        let prev = [g(&t![5s, 5s, 5s]), g(&t![1p, 2p, 3p])];
        let curr = [g(&t![1p, 2p, 3p]), g(&t![5s, 0s, 5s, 5s])];
        let m = meld(classify(&prev, &curr, &ctx(3, None)));
        assert_eq!(m.kind, MeldKind::Kakan);
        assert_eq!(m.pai, t!(0s));
    }

    #[test]
    fn ankan_shapes() {
        // two face-up tiles only
        let m = meld(classify(&[], &[g(&t![9p, 9p])], &ctx(2, Some((1, t!(1m))))));
        assert_eq!(m.kind, MeldKind::Ankan);
        assert_eq!(m.tiles.as_slice(), &t![9p, 9p, 9p, 9p]);

        // two face-down tiles read as unknown
        let m = meld(classify(&[], &[g(&t![?, 2z, 2z, ?])], &ctx(0, None)));
        assert_eq!(m.kind, MeldKind::Ankan);
        assert_eq!(m.pai, t!(2z));

        // four identical tiles nobody discarded
        let m = meld(classify(&[], &[g(&t![1s, 1s, 1s, 1s])], &ctx(1, None)));
        assert_eq!(m.kind, MeldKind::Ankan);

        // a pair of the last discard is a half-written call, not a quad
        assert!(matches!(
            classify(&[], &[g(&t![9p, 9p])], &ctx(2, Some((1, t!(9p))))),
            Classification::Ambiguous(_)
        ));
    }

    #[test]
    fn earliest_rule_wins_across_groups() {
        let prev = [g(&t![6z, 6z, 6z])];
        let curr = [
            g(&t![2m, 3m, 4m]),
            g(&t![6z, 6z, 6z, 6z]),
        ];
        let m = meld(classify(&prev, &curr, &ctx(1, Some((0, t!(3m))))));
        assert_eq!(m.kind, MeldKind::Kakan);
    }
}
