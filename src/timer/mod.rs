// Timer Module - polled countdowns for timed recipe steps
//
// Nothing here runs in the background. Every reading is computed from the
// injected clock at the moment the caller asks for it.

pub mod clock;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{
    format_duration, Timer, TimerError, TimerId, TimerManager, TimerReading, TimerStatus, MAX_TIMER_SECS,
};
