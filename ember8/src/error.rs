use core::fmt;

/// Faults raised while loading or running a program
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Memory access (fetch included) past the end of the address space
    OutOfBounds { address: usize },
    /// Subroutine call with every stack slot in use
    StackOverflow,
    /// Return executed outside of any subroutine
    StackUnderflow,
    /// Instruction that does not map to any known opcode
    UnknownInstruction(u16),
    /// Program does not fit in memory above the load address
    ProgramTooLarge { len: usize, capacity: usize },
    MissingContext,
    MissingProgram,
}

impl Error {
    /// Whether the interpreter can keep running after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::UnknownInstruction(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::OutOfBounds { address } => {
                write!(f, "Attempted to access memory out of address space at {:#05x}", address)
            }
            Error::StackOverflow => write!(f, "Cannot enter subroutine, stack is full"),
            Error::StackUnderflow => write!(f, "Can't return. Not in subroutine"),
            Error::UnknownInstruction(raw) => write!(f, "Unknown instruction {:#06x}", raw),
            Error::ProgramTooLarge { len, capacity } => write!(
                f,
                "Program of {} bytes does not fit in {} bytes of memory",
                len, capacity
            ),
            Error::MissingContext => write!(f, "Context not provided"),
            Error::MissingProgram => write!(f, "Program not provided"),
        }
    }
}
