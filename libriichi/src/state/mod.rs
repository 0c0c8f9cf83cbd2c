//! Turns a stream of board snapshots into action events.
//!
//! Every snapshot is compared with what the detector has tracked so far:
//! new meld groups are classified against the last discard, and the discard
//! pile of the seat at turn is checked for a new tile. One snapshot may hold
//! several actions (a discard followed by a call off it, or a call followed
//! by the caller's own discard), so discards and calls are chained until the
//! board is caught up.

mod getter;
mod kawa;
mod ledger;
mod turn;


pub use ledger::{Ledger, LedgerKey};
pub use turn::{SeatOrder, TurnTracker};

use crate::config::DetectorConfig;
use crate::error::DetectError;
use crate::event::{Doras, Event};
use crate::meld::{self, Classification, Group, LastDiscard, Meld, MeldContext};
use crate::multiset;
use crate::snapshot::{Lifecycle, Snapshot, Zones};
use crate::tile::Tile;
use kawa::KawaTracker;

use anyhow::{Result, ensure};

/// What one snapshot produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// In the order the actions happened.
    pub events: Vec<Event>,
    pub diagnostics: Vec<DetectError>,
}

impl Report {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NoGame,
    InGame,
}

/// Everything detection may change during one snapshot. Detection works on
/// a copy which is only kept if it finishes.
#[derive(Debug, Clone, Default)]
struct Tracking {
    turn: TurnTracker,
    last_discard: Option<LastDiscard>,
    ledger: Ledger,
    melds: [Vec<Group>; 4],
    kawa: KawaTracker,
    seat_list: Vec<u64>,
    /// Ticks each seat's unexplained meld group has been held back.
    pending_ticks: [u8; 4],
}

#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
    phase: Phase,
    prev: Option<Snapshot>,
    tracking: Tracking,
}

impl Detector {
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        let tracking = Tracking {
            ledger: Ledger::with_capacity(config.ledger_capacity),
            ..Default::default()
        };
        Self {
            config,
            tracking,
            ..Default::default()
        }
    }

    /// Feeds one snapshot.
    ///
    /// Recoverable problems end up in [`Report::diagnostics`]. An `Err` means
    /// the tracked state itself is corrupt, after which the detector must be
    /// [`reset`](Self::reset) before further use.
    pub fn process(&mut self, snapshot: Snapshot) -> Result<Report> {
        self.check()?;

        let mut report = Report::default();
        if let Err(err) = snapshot.validate() {
            log::warn!("rejected snapshot: {err}");
            report.diagnostics.push(err);
            return Ok(report);
        }

        match (self.phase, snapshot.lifecycle) {
            (Phase::NoGame, Lifecycle::GameStart) => self.start_game(&snapshot, &mut report),
            (Phase::InGame, Lifecycle::GameEnd) => {
                log::info!("game end");
                self.reset();
                report.events.push(Event::GameEnd);
            }
            (Phase::NoGame, _) => {}
            (Phase::InGame, _) => {
                let identical = self.config.skip_identical
                    && self
                        .prev
                        .as_ref()
                        .is_some_and(|prev| prev.zones.same_board(&snapshot.zones));
                if !identical {
                    self.advance(&snapshot, &mut report);
                }
            }
        }

        self.prev = Some(snapshot);
        self.check()?;
        Ok(report)
    }

    /// Parses one producer record and feeds it. A record that fails to parse
    /// is reported as a diagnostic, like any other rejected snapshot.
    pub fn process_json(&mut self, json: &str) -> Result<Report> {
        match Snapshot::from_json(json) {
            Ok(snapshot) => self.process(snapshot),
            Err(err) => {
                log::warn!("rejected snapshot: {err}");
                Ok(Report {
                    events: vec![],
                    diagnostics: vec![err],
                })
            }
        }
    }

    /// Forgets the current game. The config is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    fn start_game(&mut self, snapshot: &Snapshot, report: &mut Report) {
        let order = match SeatOrder::from_seat_wind(snapshot.seat_wind) {
            Ok(order) => order,
            Err(err) => {
                log::warn!("{err}, keeping seat order {:?}", self.tracking.turn.order());
                report.diagnostics.push(err);
                self.tracking.turn.order()
            }
        };

        let zones = &snapshot.zones;
        self.tracking = Tracking {
            turn: TurnTracker::new(order),
            last_discard: None,
            ledger: Ledger::with_capacity(self.config.ledger_capacity),
            melds: zones.melds.clone(),
            kawa: KawaTracker::new(&zones.discards, &zones.hand),
            seat_list: snapshot.seat_list.clone(),
            pending_ticks: [0; 4],
        };
        self.phase = Phase::InGame;

        let round_wind = snapshot.round_wind_number();
        log::info!(
            "game start: round wind {round_wind}, seat at turn {}, seats {:?}",
            self.tracking.turn.seat_at_turn(),
            snapshot.seat_list,
        );
        report.events.push(Event::GameStart {
            seat_list: snapshot.seat_list.clone(),
            round_wind,
            tehai: zones.hand.clone(),
            doras: self.doras(snapshot),
        });
    }

    fn advance(&mut self, snapshot: &Snapshot, report: &mut Report) {
        let doras = self.doras(snapshot);
        let mut next = self.tracking.clone();
        match next.detect(&snapshot.zones, &self.config, doras, &mut report.diagnostics) {
            Ok(events) => {
                log::debug!(
                    "{} events, {} diagnostics, seat {} at turn",
                    events.len(),
                    report.diagnostics.len(),
                    next.turn.seat_at_turn(),
                );
                self.tracking = next;
                report.events = events;
            }
            Err(err) => {
                log::warn!("dropping snapshot: {err:#}");
                report.diagnostics.push(DetectError::Internal(format!("{err:#}")));
            }
        }
    }

    fn doras(&self, snapshot: &Snapshot) -> Doras {
        if self.config.resolve_dora_indicators {
            snapshot.dora_indicators.iter().map(|t| t.next()).collect()
        } else {
            snapshot.dora_indicators
        }
    }

    fn check(&self) -> Result<()> {
        self.tracking.turn.check()?;
        ensure!(
            self.tracking.last_discard.is_none_or(|d| d.seat < 4),
            "last discard {:?} has no valid seat",
            self.tracking.last_discard,
        );
        ensure!(
            self.phase == Phase::InGame || self.tracking.ledger.is_empty(),
            "ledger holds {} actions outside of a game",
            self.tracking.ledger.len(),
        );
        Ok(())
    }
}

impl Tracking {
    fn detect(
        &mut self,
        zones: &Zones,
        config: &DetectorConfig,
        doras: Doras,
        diagnostics: &mut Vec<DetectError>,
    ) -> Result<Vec<Event>> {
        let mut events = vec![];
        // seats with a new group no rule could explain yet
        let mut pending: [Option<Group>; 4] = Default::default();

        for seat in 0..4 {
            match self.classify(seat, zones, config) {
                Classification::Unchanged => {}
                Classification::Meld(meld) => self.emit_meld(seat, meld, zones, doras, &mut events),
                Classification::Ambiguous(group) => pending[seat as usize] = Some(group),
            }
        }

        // A discard can complete a pending call, and a call hands the turn
        // to a caller who may already have discarded as well.
        for _ in 0..4 {
            self.kawa.settle(&zones.discards);
            let seat = self.turn.seat_at_turn();
            ensure!(seat < 4, "seat at turn {seat} out of range");
            let Some((pai, nth)) = self.kawa.take_discard(seat, &zones.discards[seat as usize])
            else {
                break;
            };
            if !self.emit_discard(seat, pai, nth, zones, doras, &mut events) {
                break;
            }

            for caller in 0..4 {
                if pending[caller as usize].is_none() {
                    continue;
                }
                if let Classification::Meld(meld) = self.classify(caller, zones, config) {
                    pending[caller as usize] = None;
                    self.emit_meld(caller, meld, zones, doras, &mut events);
                }
            }
        }

        // An unexplained group stays out of the cached melds for a few
        // ticks, since its discard may only show up in a later snapshot.
        for (seat, group) in (0..4).zip(pending) {
            let idx = seat as usize;
            if let Some(tiles) = group {
                diagnostics.push(DetectError::AmbiguousMeld { seat, tiles });
                self.pending_ticks[idx] = self.pending_ticks[idx].saturating_add(1);
                if self.pending_ticks[idx] < config.pending_meld_ticks {
                    log::debug!("seat {seat}: holding back new meld {tiles:?}");
                    continue;
                }
                log::warn!("seat {seat}: cannot classify new meld {tiles:?}, accepting it");
            }
            self.pending_ticks[idx] = 0;
            self.melds[idx] = zones.melds[idx].clone();
        }

        self.kawa.settle(&zones.discards);
        let at_turn = self.turn.seat_at_turn();
        for seat in self.kawa.stale_seats(&zones.discards, at_turn) {
            log::warn!("seat {seat}: discard pile changed while seat {at_turn} is at turn");
            diagnostics.push(DetectError::TurnViolation { seat, at_turn });
        }

        Ok(events)
    }

    fn classify(&self, seat: u8, zones: &Zones, config: &DetectorConfig) -> Classification {
        let ctx = MeldContext {
            seat,
            last_discard: self.last_discard,
            sequence_rule: config.sequence_call_rule,
        };
        meld::classify(&self.melds[seat as usize], &zones.melds[seat as usize], &ctx)
    }

    /// `nth` counts the discards of `pai` taken from `seat` so far. Returns
    /// `false` if the discard was already emitted this game.
    fn emit_discard(
        &mut self,
        seat: u8,
        pai: Tile,
        nth: usize,
        zones: &Zones,
        doras: Doras,
        events: &mut Vec<Event>,
    ) -> bool {
        if !self.ledger.record(LedgerKey::Discard { seat, pai, nth }) {
            log::debug!("seat {seat}: discard {pai} already emitted");
            return false;
        }

        let event = if seat == 0 {
            let tsumo = self.kawa.take_tsumo(&zones.hand, pai);
            Event::SelfAction { pai, tsumo, doras }
        } else {
            Event::Discard {
                actor: seat,
                pai,
                doras,
            }
        };
        self.turn.on_discard(seat);
        self.last_discard = Some(LastDiscard { seat, pai });
        events.push(event);
        true
    }

    fn emit_meld(
        &mut self,
        seat: u8,
        meld: Meld,
        zones: &Zones,
        doras: Doras,
        events: &mut Vec<Event>,
    ) {
        let nth = multiset::count(&zones.melds[seat as usize], &meld.tiles);
        let key = LedgerKey::Meld {
            seat,
            kind: meld.kind,
            tiles: meld.tiles,
            nth,
        };
        if !self.ledger.record(key) {
            log::debug!("seat {seat}: {} {:?} already emitted", meld.kind, meld.tiles);
            return;
        }

        self.turn.on_meld(seat);
        if meld.kind.is_call() {
            // a discard is claimed at most once
            self.last_discard = None;
            if let Some(target) = meld.target {
                self.kawa.claim(target, meld.pai);
            }
        }
        if seat == 0 {
            self.kawa.rebase_hand(&zones.hand);
        }
        events.push(Event::MeldCall {
            actor: seat,
            meld,
            doras,
        });
    }
}
