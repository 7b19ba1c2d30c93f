//! The platform boundary of the interpreter.
//!
//! Everything `Ember8` needs from the outside world (a screen, a beeper, a
//! keypad and a source of randomness) is requested through [`Context`]. The
//! interpreter owns its context and calls into it only from `Ember8::tick`
//! and the opcodes it executes.

use crate::frame::FrameView;

pub trait Context {
    /// Present the frame, once per tick after the instructions ran
    fn on_frame(&mut self, frame: FrameView<'_>);
    /// Sound timer went from zero to a nonzero value
    fn sound_on(&mut self);
    /// Sound timer ran out
    fn sound_off(&mut self);
    /// Keypad snapshot, sampled at the start of every tick
    ///
    /// Index `n` is hex key `n`.
    fn get_keys(&mut self) -> &[bool; 16];
    /// Random byte for CXNN
    fn gen_random(&mut self) -> u8;
}
