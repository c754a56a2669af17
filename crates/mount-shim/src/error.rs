use derive_more::From;
use mount_shim_sys::Errno;
use std::{
    error,
    fmt::{self, Display, Formatter},
};

/// Why a legacy argument struct could not be turned into an option list. The first one of these
/// hit while building a list sticks to it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranslationError {
    /// Duplicating a name or value, or growing the list, ran out of memory.
    AllocationFailure,
    /// A formatted value didn't fit in the scratch buffer.
    FormatOverflow,
    /// A caller broke an internal contract, such as naming a flag without its "no" prefix. This
    /// is a bug, not a runtime condition.
    ContractViolation,
}

impl TranslationError {
    pub fn errno(self) -> Errno {
        match self {
            Self::AllocationFailure => Errno::NOMEM,
            Self::FormatOverflow => Errno::OVERFLOW,
            Self::ContractViolation => Errno::DOOFUS,
        }
    }
}

impl Display for TranslationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailure => write!(f, "out of memory building mount options"),
            Self::FormatOverflow => write!(f, "formatted mount option value too long"),
            Self::ContractViolation => write!(f, "internal inconsistency building mount options"),
        }
    }
}

impl error::Error for TranslationError {}

/// The outcome of a failed [`crate::dispatch`]. Callers that only care about the C convention can
/// use [`MountError::errno`].
#[derive(Clone, Copy, Debug, Eq, From, PartialEq)]
pub enum MountError {
    /// The legacy arguments couldn't be translated. No syscall was made.
    Translation(TranslationError),
    /// `mount(2)` or `nmount(2)` failed. The errno is exactly what the kernel returned.
    System(Errno),
}

impl MountError {
    pub fn errno(self) -> Errno {
        match self {
            Self::Translation(err) => err.errno(),
            Self::System(errno) => errno,
        }
    }
}

impl Display for MountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translation(inner) => Display::fmt(inner, f),
            Self::System(inner) => Display::fmt(inner, f),
        }
    }
}

impl error::Error for MountError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Translation(inner) => Some(inner),
            Self::System(inner) => Some(inner),
        }
    }
}
