//! Reconstructs player actions of a four-player riichi game from a stream of
//! board snapshots.
//!
//! Each snapshot lists the visible tiles of the table: our hand, the exposed
//! melds and the discard pile of every seat. [`Detector`] compares it with
//! the previous one and reports what happened in between as [`Event`]s.
//!
//! ```
//! use riichi::{Detector, Event};
//!
//! let mut detector = Detector::default();
//! let report = detector
//!     .process_json(r#"{"state": "GameStart", "SelfWind": "1z", "tiles": {"Hand_Tiles": ["1m"]}}"#)
//!     .unwrap();
//! assert!(matches!(report.events.as_slice(), [Event::GameStart { .. }]));
//! ```

mod macros;

pub mod config;
pub mod error;
pub mod event;
pub mod meld;
mod multiset;
pub mod snapshot;
pub mod state;
pub mod tile;

pub use config::DetectorConfig;
pub use error::DetectError;
pub use event::Event;
pub use snapshot::Snapshot;
pub use state::{Detector, Report};
