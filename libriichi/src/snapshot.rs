use crate::error::DetectError;
use crate::meld::{self, Group};
use crate::multiset;
use crate::tile::{TILE_STRINGS_LEN, Tile};

use serde::Deserialize;
use tinyvec::ArrayVec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    GameStart,
    #[default]
    GameRunning,
    GameEnd,
}

impl Lifecycle {
    /// Producers emit other screen states too; all of them count as running.
    fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("GameStart") => Self::GameStart,
            Some("GameEnd") => Self::GameEnd,
            _ => Self::GameRunning,
        }
    }
}

/// The nine tile zones of one observation. Seat arrays are indexed by
/// relative seat: 0 = self, 1 = next, 2 = across, 3 = previous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zones {
    pub hand: Vec<Tile>,
    /// Each group is sorted.
    pub melds: [Vec<Group>; 4],
    pub discards: [Vec<Tile>; 4],
}

impl Zones {
    /// Zone-by-zone multiset equality.
    #[must_use]
    pub fn same_board(&self, other: &Self) -> bool {
        multiset::same(&self.hand, &other.hand)
            && (0..4).all(|i| {
                multiset::same(&self.melds[i], &other.melds[i])
                    && multiset::same(&self.discards[i], &other.discards[i])
            })
    }

    fn all_tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.hand
            .iter()
            .chain(self.melds.iter().flatten().flatten())
            .chain(self.discards.iter().flatten())
            .copied()
    }
}

/// One validated board observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub lifecycle: Lifecycle,
    pub round_wind: Option<Tile>,
    pub seat_wind: Option<Tile>,
    /// Physical seat ids ordered East, South, West, North.
    pub seat_list: Vec<u64>,
    pub zones: Zones,
    pub dora_indicators: ArrayVec<[Tile; 5]>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawTiles {
    #[serde(rename = "Hand_Tiles")]
    hand: Option<Vec<String>>,
    #[serde(rename = "Self_Mingpai")]
    self_melds: Option<Vec<Vec<String>>>,
    #[serde(rename = "Second_Mingpai")]
    next_melds: Option<Vec<Vec<String>>>,
    #[serde(rename = "Third_Mingpai")]
    across_melds: Option<Vec<Vec<String>>>,
    #[serde(rename = "Fourth_Mingpai")]
    prev_melds: Option<Vec<Vec<String>>>,
    #[serde(rename = "Self_Discard")]
    self_discards: Option<Vec<String>>,
    #[serde(rename = "Second_Discard")]
    next_discards: Option<Vec<String>>,
    #[serde(rename = "Third_Discard")]
    across_discards: Option<Vec<String>>,
    #[serde(rename = "Fourth_Discard")]
    prev_discards: Option<Vec<String>>,
}

/// The producer's JSON layout, before any tile is parsed.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSnapshot {
    state: Option<String>,
    #[serde(rename = "FieldWind")]
    field_wind: Option<String>,
    #[serde(rename = "SelfWind")]
    self_wind: Option<String>,
    #[serde(rename = "seatList")]
    seat_list: Option<Vec<u64>>,
    tiles: Option<RawTiles>,
    doras: Option<Vec<String>>,
}

fn parse_tiles(raw: Option<Vec<String>>) -> Result<Vec<Tile>, DetectError> {
    raw.unwrap_or_default()
        .iter()
        .map(|s| s.parse().map_err(DetectError::from))
        .collect()
}

fn parse_groups(raw: Option<Vec<Vec<String>>>) -> Result<Vec<Group>, DetectError> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|group| {
            if group.is_empty() || group.len() > 4 {
                return Err(DetectError::InvalidSnapshot(format!(
                    "meld group of {} tiles",
                    group.len()
                )));
            }
            let tiles = parse_tiles(Some(group))?;
            Ok(meld::normalize(&tiles))
        })
        .collect()
}

/// Winds are checked later by the seat order, which falls back softly, so a
/// bad wind string is kept as "absent" here instead of rejecting the board.
fn parse_wind(raw: Option<String>) -> Option<Tile> {
    let raw = raw?;
    match raw.parse() {
        Ok(tile) => Some(tile),
        Err(e) => {
            log::warn!("ignoring wind value: {e}");
            None
        }
    }
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = DetectError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let tiles = raw.tiles.unwrap_or_default();
        let zones = Zones {
            hand: parse_tiles(tiles.hand)?,
            melds: [
                parse_groups(tiles.self_melds)?,
                parse_groups(tiles.next_melds)?,
                parse_groups(tiles.across_melds)?,
                parse_groups(tiles.prev_melds)?,
            ],
            discards: [
                parse_tiles(tiles.self_discards)?,
                parse_tiles(tiles.next_discards)?,
                parse_tiles(tiles.across_discards)?,
                parse_tiles(tiles.prev_discards)?,
            ],
        };

        let doras = parse_tiles(raw.doras)?;
        if doras.len() > 5 {
            return Err(DetectError::InvalidSnapshot(format!(
                "{} dora indicators",
                doras.len()
            )));
        }

        let snapshot = Self {
            lifecycle: Lifecycle::from_label(raw.state.as_deref()),
            round_wind: parse_wind(raw.field_wind),
            seat_wind: parse_wind(raw.self_wind),
            seat_list: raw.seat_list.unwrap_or_default(),
            zones,
            dora_indicators: doras.into_iter().collect(),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

impl Snapshot {
    /// Parses and validates one producer record.
    pub fn from_json(json: &str) -> Result<Self, DetectError> {
        let raw: RawSnapshot = serde_json::from_str(json)
            .map_err(|e| DetectError::InvalidSnapshot(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Checks the physical limits of the tile set across the nine zones:
    /// at most 4 of a kind and a single copy of each red five. Unknown tiles
    /// are not counted.
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.seat_list.len() > 4 {
            return Err(DetectError::InvalidSnapshot(format!(
                "{} seats listed",
                self.seat_list.len()
            )));
        }
        if self.zones.melds.iter().flatten().any(|g| g.is_empty()) {
            return Err(DetectError::InvalidSnapshot("empty meld group".to_owned()));
        }

        let mut kinds = [0_u8; TILE_STRINGS_LEN];
        let mut exact = [0_u8; TILE_STRINGS_LEN];
        for tile in self.zones.all_tiles().filter(|t| !t.is_unknown()) {
            let kind = &mut kinds[tile.deaka().as_usize()];
            *kind = kind.saturating_add(1);
            let same = &mut exact[tile.as_usize()];
            *same = same.saturating_add(1);
        }

        for (id, &count) in kinds.iter().enumerate() {
            if count > 4 {
                let tile = Tile::try_from(id)?;
                return Err(DetectError::TileOverflow { tile, count });
            }
        }
        for (id, &count) in exact.iter().enumerate() {
            if count > 1 {
                let tile = Tile::try_from(id)?;
                if tile.is_aka() {
                    return Err(DetectError::TileOverflow { tile, count });
                }
            }
        }
        Ok(())
    }

    /// 1 for an East round, 2 for South and so on. Defaults to 1.
    #[must_use]
    pub fn round_wind_number(&self) -> u8 {
        self.round_wind
            .and_then(Tile::as_wind)
            .map_or(1, |w| w + 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::t;

    #[test]
    fn parse_full_record() {
        let snapshot = Snapshot::from_json(
            r#"{
                "state": "GameStart",
                "FieldWind": "2z",
                "SelfWind": "3z",
                "seatList": [1, 2, 3, 17457800],
                "tiles": {
                    "Hand_Tiles": ["1m", "2m", "0p"],
                    "Second_Mingpai": [["4s", "2s", "3s"]],
                    "Fourth_Discard": ["1z"]
                },
                "doras": ["5z"]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.lifecycle, Lifecycle::GameStart);
        assert_eq!(snapshot.round_wind, Some(t!(2z)));
        assert_eq!(snapshot.round_wind_number(), 2);
        assert_eq!(snapshot.seat_wind, Some(t!(3z)));
        assert_eq!(snapshot.seat_list, [1, 2, 3, 17457800]);
        assert_eq!(snapshot.zones.hand, t![1m, 2m, 0p]);
        assert_eq!(snapshot.zones.melds[1][0].as_slice(), &t![2s, 3s, 4s]);
        assert!(snapshot.zones.melds[0].is_empty());
        assert_eq!(snapshot.zones.discards[3], [t!(1z)]);
        assert_eq!(snapshot.dora_indicators.as_slice(), &[t!(5z)]);
    }

    #[test]
    fn absent_and_null_fields_default() {
        let snapshot = Snapshot::from_json(r#"{"tiles": {"Hand_Tiles": null}, "doras": null}"#)
            .unwrap();
        assert_eq!(snapshot.lifecycle, Lifecycle::GameRunning);
        assert!(snapshot.zones.hand.is_empty());
        assert_eq!(snapshot.round_wind_number(), 1);

        let snapshot = Snapshot::from_json(r#"{"state": "in_game"}"#).unwrap();
        assert_eq!(snapshot.lifecycle, Lifecycle::GameRunning);
        assert_eq!(Snapshot::from_json("{}").unwrap(), Snapshot::default());
    }

    #[test]
    fn rejects_bad_tiles() {
        let err = Snapshot::from_json(r#"{"tiles": {"Hand_Tiles": ["1m", "back"]}}"#)
            .unwrap_err();
        assert!(matches!(err, DetectError::InvalidTileFormat(_)));

        let err = Snapshot::from_json(r#"{"tiles": {"Self_Mingpai": [["1m", "1m", "1m", "1m", "1m"]]}}"#)
            .unwrap_err();
        assert!(matches!(err, DetectError::InvalidSnapshot(_)));

        let err = Snapshot::from_json(r#"{"doras": ["1m", "2m", "3m", "4m", "5m", "6m"]}"#)
            .unwrap_err();
        assert!(matches!(err, DetectError::InvalidSnapshot(_)));

        let err = Snapshot::from_json("{not json").unwrap_err();
        assert!(matches!(err, DetectError::InvalidSnapshot(_)));
    }

    #[test]
    fn bad_wind_is_dropped() {
        let snapshot = Snapshot::from_json(r#"{"FieldWind": "east", "SelfWind": "1z"}"#).unwrap();
        assert_eq!(snapshot.round_wind, None);
        assert_eq!(snapshot.seat_wind, Some(t!(1z)));
    }

    #[test]
    fn tile_limits_across_zones() {
        // four 5p across hand, melds and discards, one of them red
        let ok = Snapshot::from_json(
            r#"{"tiles": {
                "Hand_Tiles": ["5p"],
                "Third_Mingpai": [["5p", "0p", "5p"]]
            }}"#,
        );
        assert!(ok.is_ok());

        let err = Snapshot::from_json(
            r#"{"tiles": {
                "Hand_Tiles": ["5p", "5p"],
                "Third_Mingpai": [["5p", "0p", "5p"]]
            }}"#,
        )
        .unwrap_err();
        assert_eq!(err, DetectError::TileOverflow { tile: t!(5p), count: 5 });

        let err = Snapshot::from_json(
            r#"{"tiles": {"Hand_Tiles": ["0s"], "Self_Discard": ["0s"]}}"#,
        )
        .unwrap_err();
        assert_eq!(err, DetectError::TileOverflow { tile: t!(0s), count: 2 });

        // face-down tiles are not counted
        let ok = Snapshot::from_json(
            r#"{"tiles": {"Hand_Tiles": ["?", "?", "?", "?", "?", "?"]}}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn same_board_ignores_order() {
        let a = Snapshot::from_json(
            r#"{"tiles": {"Hand_Tiles": ["1m", "2m"], "Self_Discard": ["3p", "4p"]}}"#,
        )
        .unwrap();
        let b = Snapshot::from_json(
            r#"{"state": "GameRunning", "tiles": {"Hand_Tiles": ["2m", "1m"], "Self_Discard": ["4p", "3p"]}}"#,
        )
        .unwrap();
        let c = Snapshot::from_json(
            r#"{"tiles": {"Hand_Tiles": ["2m", "1m"], "Second_Discard": ["4p", "3p"]}}"#,
        )
        .unwrap();
        assert!(a.zones.same_board(&b.zones));
        assert!(!a.zones.same_board(&c.zones));
    }
}
