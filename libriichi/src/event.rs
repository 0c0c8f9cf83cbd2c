use crate::meld::{Group, Meld};
use crate::tile::Tile;

use serde::Serialize;
use tinyvec::ArrayVec;

pub type Doras = ArrayVec<[Tile; 5]>;

/// One action reconstructed from the board. Seats are relative to self:
/// 0 = self, 1 = next, 2 = across, 3 = previous.
///
/// Serializes to the flat record of the action log, see [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "EventRecord")]
pub enum Event {
    GameStart {
        seat_list: Vec<u64>,
        round_wind: u8,
        tehai: Vec<Tile>,
        doras: Doras,
    },
    GameEnd,

    /// A discard by another seat.
    Discard {
        actor: u8,
        pai: Tile,
        doras: Doras,
    },
    /// Our own discard. `tsumo` equals `pai` when no distinct draw was seen.
    SelfAction {
        pai: Tile,
        tsumo: Tile,
        doras: Doras,
    },

    MeldCall {
        actor: u8,
        meld: Meld,
        doras: Doras,
    },
}

impl Event {
    #[inline]
    #[must_use]
    pub const fn actor(&self) -> Option<u8> {
        match self {
            Self::Discard { actor, .. } | Self::MeldCall { actor, .. } => Some(*actor),
            Self::SelfAction { .. } => Some(0),
            _ => None,
        }
    }

    /// The discarded or called tile.
    #[inline]
    #[must_use]
    pub const fn pai(&self) -> Option<Tile> {
        match self {
            Self::Discard { pai, .. } | Self::SelfAction { pai, .. } => Some(*pai),
            Self::MeldCall { meld, .. } => Some(meld.pai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination: Option<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<ArrayVec<[Option<u8>; 4]>>,
}

/// The wire shape of an [`Event`]: one flat JSON object tagged by `state`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventRecord {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<u8>,
    #[serde(rename = "seatList", skip_serializing_if = "Option::is_none")]
    pub seat_list: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chang: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<Tile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<Tile>,
    #[serde(rename = "getTile", skip_serializing_if = "Option::is_none")]
    pub get_tile: Option<Tile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doras: Option<Doras>,
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        match event {
            Event::GameStart {
                seat_list,
                round_wind,
                tehai,
                doras,
            } => Self {
                state: "GameStart",
                seat_list: Some(seat_list),
                chang: Some(round_wind),
                tiles: Some(tehai),
                doras: Some(doras),
                ..Default::default()
            },
            Event::GameEnd => Self {
                state: "GameEnd",
                ..Default::default()
            },
            Event::Discard { actor, pai, doras } => Self {
                state: "Discard",
                seat: Some(actor),
                tile: Some(pai),
                operation: Some(OperationRecord {
                    kind: 1,
                    combination: None,
                    form: None,
                }),
                doras: Some(doras),
                ..Default::default()
            },
            Event::SelfAction { pai, tsumo, doras } => Self {
                state: "MyAction",
                tile: Some(pai),
                get_tile: Some(tsumo),
                doras: Some(doras),
                ..Default::default()
            },
            Event::MeldCall { actor, meld, doras } => Self {
                state: if actor == 0 {
                    "MyAction_Chipongang"
                } else {
                    "Other_Chipongang"
                },
                seat: Some(actor),
                tile: Some(meld.pai),
                operation: Some(OperationRecord {
                    kind: meld.kind.code(),
                    combination: Some(meld.tiles),
                    form: Some(meld.form()),
                }),
                doras: Some(doras),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::meld::{MeldKind, normalize};
    use crate::t;

    use serde_json::json;

    #[test]
    fn discard_record() {
        let event = Event::Discard {
            actor: 2,
            pai: t!(0m),
            doras: [t!(3z)].into_iter().collect(),
        };
        assert_eq!(event.actor(), Some(2));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "state": "Discard",
                "seat": 2,
                "tile": "0m",
                "operation": {"type": 1},
                "doras": ["3z"],
            }),
        );
    }

    #[test]
    fn self_action_record() {
        let event = Event::SelfAction {
            pai: t!(9s),
            tsumo: t!(1p),
            doras: Doras::new(),
        };
        assert_eq!(event.actor(), Some(0));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"state": "MyAction", "tile": "9s", "getTile": "1p", "doras": []}),
        );
    }

    #[test]
    fn meld_records_differ_for_self() {
        let meld = Meld {
            kind: MeldKind::Chi,
            pai: t!(3p),
            tiles: normalize(&t![4p, 3p, 2p]),
            target: Some(3),
            called: Some(1),
        };
        let mine = Event::MeldCall {
            actor: 0,
            meld: meld.clone(),
            doras: Doras::new(),
        };
        assert_eq!(
            serde_json::to_value(&mine).unwrap(),
            json!({
                "state": "MyAction_Chipongang",
                "seat": 0,
                "tile": "3p",
                "operation": {
                    "type": 2,
                    "combination": ["2p", "3p", "4p"],
                    "form": [null, 3, null],
                },
                "doras": [],
            }),
        );

        let theirs = Event::MeldCall {
            actor: 1,
            meld,
            doras: Doras::new(),
        };
        let value = serde_json::to_value(&theirs).unwrap();
        assert_eq!(value["state"], "Other_Chipongang");
        assert_eq!(value["seat"], 1);
    }

    #[test]
    fn lifecycle_records() {
        assert_eq!(
            serde_json::to_value(Event::GameEnd).unwrap(),
            json!({"state": "GameEnd"}),
        );
        let start = Event::GameStart {
            seat_list: vec![1, 2, 3, 4],
            round_wind: 1,
            tehai: t![1m, 9m].to_vec(),
            doras: Doras::new(),
        };
        assert_eq!(start.actor(), None);
        assert_eq!(
            serde_json::to_value(&start).unwrap(),
            json!({
                "state": "GameStart",
                "seatList": [1, 2, 3, 4],
                "chang": 1,
                "tiles": ["1m", "9m"],
                "doras": [],
            }),
        );
    }
}
