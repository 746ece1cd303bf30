//! Helpers shared between the unit tests of different modules.
mod common;
mod event_log;
mod manual_dispatch;

pub use common::*;
pub use event_log::*;
pub use manual_dispatch::*;
