use std::path::PathBuf;

use ember8::pacer::DEFAULT_RATE;

use crate::error::HostError;
use crate::keymap::keys_from_str;

pub const USAGE: &str = "usage: ember <rom> [seconds] [rate] [held-keys]";

/// Seconds to run when not given
pub const DEFAULT_SECONDS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub rom: PathBuf,
    pub seconds: f64,
    pub rate: f64,
    pub keys: [bool; 16],
}

impl Args {
    /// Parse positional arguments, program name excluded
    pub fn parse<I>(args: I) -> Result<Self, HostError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let rom = args
            .next()
            .map(PathBuf::from)
            .ok_or_else(|| HostError::Usage(USAGE.to_owned()))?;
        let seconds = match args.next() {
            Some(arg) => positive(&arg, "seconds")?,
            None => DEFAULT_SECONDS,
        };
        let rate = match args.next() {
            Some(arg) => positive(&arg, "rate")?,
            None => DEFAULT_RATE,
        };
        let keys = match args.next() {
            Some(arg) => keys_from_str(&arg)
                .map_err(|c| HostError::Usage(format!("'{}' is not a keypad key", c)))?,
            None => [false; 16],
        };
        if let Some(extra) = args.next() {
            return Err(HostError::Usage(format!(
                "unexpected argument '{}'\n{}",
                extra, USAGE
            )));
        }
        Ok(Self {
            rom,
            seconds,
            rate,
            keys,
        })
    }
}

fn positive(arg: &str, name: &str) -> Result<f64, HostError> {
    match arg.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(HostError::Usage(format!(
            "{} must be a positive number, got '{}'",
            name, arg
        ))),
    }
}
