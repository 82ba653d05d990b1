//! Session scheduling for a handheld register-machine runtime
//!
//! Two asynchronous producers feed one event channel: the host's input
//! service (key presses and releases) and a 60 Hz tick thread.  A
//! single-threaded scheduler owns the machine, the CPU evaluator, and the
//! device bus outright, so every evaluation runs to completion in arrival
//! order and the renderer can never observe a half-updated frame.  No lock
//! is involved; exclusivity falls out of ownership.
#![warn(missing_docs)]

mod event;
mod host;
mod render;
mod session;
mod timer;

pub use event::{Event, InputKind};
pub use host::{DisplaySurface, Host};
pub use render::draw_frame;
pub use session::{run_session, Outcome, Session, EXIT_KEY};
pub use timer::{Timer, FRAME_RATE_HZ};

pub use machine::Key;
