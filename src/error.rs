use std::{fmt, io};

#[derive(Debug)]
pub enum HostError {
    Usage(String),
    Io(io::Error),
    Emulator(ember8::Error),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Usage(msg) => write!(f, "{}", msg),
            HostError::Io(err) => write!(f, "Cannot read program: {}", err),
            HostError::Emulator(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HostError {
    fn from(err: io::Error) -> Self {
        HostError::Io(err)
    }
}

impl From<ember8::Error> for HostError {
    fn from(err: ember8::Error) -> Self {
        HostError::Emulator(err)
    }
}
