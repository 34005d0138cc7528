//! bdstream-nav: the Blu-ray navigation and playback state machine.
//!
//! Sits between a disc navigation engine and a media player:
//!
//! - [`BdBuffer`] owns the engine on the reader thread and serves the
//!   multiplexed stream through blocking `read`/`seek` calls, draining
//!   engine events before and during every read.
//! - [`BdHandle`] is the cloneable UI-thread view: position accessors,
//!   overlay snapshots for rendering, and the skip/close signals.
//! - [`OverlayBuffer`] keeps the menu and subtitle planes.
//! - [`StateSnapshot`] tokens capture and restore a navigation position.
//! - [`scripted`] provides a deterministic engine for tests and tooling.

pub mod actions;
pub mod buffer;
mod dispatcher;
pub mod engine;
pub mod handle;
pub mod overlay;
pub mod scripted;
pub mod session;
pub mod snapshot;
pub mod wait;

pub use actions::MenuKind;
pub use buffer::BdBuffer;
pub use engine::{
    DiscInfo, EngineProvider, NavKey, NavigationEngine, OpenFailure, PendingEvent, PlayerSetting,
    StillDuration, TitleInfo, BD_BLOCK_SIZE,
};
pub use handle::BdHandle;
pub use overlay::{OverlayBuffer, OverlayPlaneId, OverlaySnapshot};
pub use session::{ProcessState, StreamSelection, WaitReason};
pub use snapshot::{StateSnapshot, SNAPSHOT_VERSION};
