pub mod accumulator;
pub mod bridge;
pub mod driver;
pub mod session;

pub use accumulator::{FlushRecord, TaskClock, TimeKind};
pub use bridge::{Bridge, BridgeStats, SqliteStore, TimeStore, UpsertOutcome};
pub use driver::{Command, Reply, Tracker};
pub use session::{is_minute_boundary, ActiveTask, Session, SessionAction};
