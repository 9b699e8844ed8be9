//! Frame timing.
//!
//! The host supplies a monotonically increasing timestamp (seconds) once per
//! tick; `FrameClock` turns it into a `FrameTime` snapshot with the delta
//! since the previous tick.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
