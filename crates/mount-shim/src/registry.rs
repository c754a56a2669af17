//! The filesystem types the shim knows how to translate.

use crate::Encoder;
use std::ffi::CStr;

/// What to do with a recognized filesystem type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Translation {
    /// The filesystem takes no options beyond `fstype` and `fspath`.
    NoExtraOptions,
    /// The legacy argument struct is translated by the given encoder.
    Encode(Encoder),
}

#[derive(Clone, Copy, Debug)]
pub struct Binding {
    pub fstype: &'static str,
    pub translation: Translation,
}

const fn bind(fstype: &'static str, translation: Translation) -> Binding {
    Binding {
        fstype,
        translation,
    }
}

pub static REGISTRY: &[Binding] = &[
    bind("cd9660", Translation::Encode(Encoder::Cd9660)),
    bind("fdescfs", Translation::NoExtraOptions),
    bind("linprocfs", Translation::NoExtraOptions),
    bind("msdosfs", Translation::Encode(Encoder::Msdosfs)),
    bind("nandfs", Translation::Encode(Encoder::Nandfs)),
    bind("procfs", Translation::NoExtraOptions),
    bind("nfs", Translation::Encode(Encoder::Nfs)),
    bind("smbfs", Translation::Encode(Encoder::Smbfs)),
    bind("ufs", Translation::Encode(Encoder::Ufs)),
];

/// Find the translation for `fstype`. Matching is exact and case-sensitive. `None` means the call
/// should go to the legacy `mount(2)` untouched.
pub fn lookup(fstype: &CStr) -> Option<Translation> {
    REGISTRY
        .iter()
        .find(|binding| binding.fstype.as_bytes() == fstype.to_bytes())
        .map(|binding| binding.translation)
}
