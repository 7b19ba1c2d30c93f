//! Headless host for the `ember8` interpreter.
pub mod args;
pub mod context;
pub mod error;
pub mod keymap;
pub mod render;

pub use args::Args;
pub use context::HeadlessContext;
pub use error::HostError;
