//! SN76489 register model, latch state tracking and clock tuning helpers.
//!
//! - `register` decodes single command bytes into latch/data writes.
//! - `state` tracks the latched channel cursor and per-channel registers.
//! - `tuning` converts tone dividers between master clocks.
pub mod register;
pub mod state;
pub mod tuning;

pub use register::{Channel, ChannelMask, RegisterByte, RegisterKind};
pub use state::{ChannelLatch, LatchCursor, PsgLatchState};
pub use tuning::{ClockPair, TargetChip};
