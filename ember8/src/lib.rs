//! `no_std` CHIP-8 interpreter core.
//!
//! The interpreter is platform agnostic, everything it needs from the outside
//! world (display, sound, keypad, randomness) goes through the [`Context`] trait.
#![no_std]
pub mod builder;
pub mod context;
pub mod ember;
pub mod error;
pub mod frame;
pub mod memory;
pub mod opcode;
pub mod pacer;
pub mod timer;

pub use builder::Builder;
pub use context::Context;
pub use ember::Ember8;
pub use error::Error;
pub use frame::{Frame, FrameView};
pub use opcode::OpCode;

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;
