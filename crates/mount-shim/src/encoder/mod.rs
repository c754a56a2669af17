//! Per-filesystem translation of legacy argument structs into options.
//!
//! Each encoder appends its options in a fixed order, so the same struct always produces the same
//! list. Boolean options are named the way the filesystem's `nmount(2)` option table names them.

mod cd9660;
mod msdosfs;
mod nandfs;
mod nfs;
mod smbfs;
mod ufs;

use crate::{LegacyArgs, OptionList, TranslationError};

/// A filesystem type whose legacy argument struct needs translating.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoder {
    Cd9660,
    Msdosfs,
    Nandfs,
    Nfs,
    Smbfs,
    Ufs,
}

impl Encoder {
    /// Append the options for `args` to `list`. Without arguments the filesystem gets no options
    /// beyond its type and path.
    pub fn encode(
        self,
        list: &mut OptionList,
        args: Option<LegacyArgs<'_>>,
    ) -> Result<(), TranslationError> {
        let Some(args) = args else {
            return Ok(());
        };
        match self {
            Self::Cd9660 => cd9660::encode(list, args),
            Self::Msdosfs => msdosfs::encode(list, args),
            Self::Nandfs => nandfs::encode(list, args),
            Self::Nfs => nfs::encode(list, args),
            Self::Smbfs => smbfs::encode(list, args),
            Self::Ufs => ufs::encode(list, args),
        }
    }
}

fn is_set<T>(flags: T, bit: T) -> bool
where
    T: Copy + std::ops::BitAnd<Output = T> + PartialEq + Default,
{
    flags & bit != T::default()
}
