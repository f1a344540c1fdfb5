//! Review workflow actions built on [`wikidoc`]: page moves, talk-page notifications,
//! speedy deletion logging and participant checks.

pub mod moves;
pub mod notify;
pub mod participants;
pub mod speedy_log;
pub mod telemetry;
pub mod timestamp;

pub use moves::{MoveOutcome, MoveRequest, MovedPage, move_page, move_query};
pub use notify::{Notification, notify_user};
pub use participants::{DEFAULT_PARTICIPANT_LIST, is_participant};
pub use speedy_log::{DEFAULT_LOG_PAGE, SpeedyLogEntry, log_speedy_deletion};
pub use telemetry::{DEFAULT_DIRECTIVES, init_tracing};
pub use timestamp::{
    parse_mw_timestamp, parse_signature_timestamp, relative_time_since, to_mw_timestamp,
};
