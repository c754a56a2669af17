//! Upgrading `oexport_args` to `export_args`.
//!
//! `export_args` starts with exactly the fields of `oexport_args`, followed by the security
//! flavor fields the old layout lacks. The upgrade copies the old struct's bytes to the front of
//! a zero-filled `export_args` image.

use mount_shim_sys::abi::{bytes_of, export_args, oexport_args};
use std::mem;

pub const LEGACY_EXPORT_LEN: usize = mem::size_of::<oexport_args>();
pub const EXPORT_LEN: usize = mem::size_of::<export_args>();

/// The byte image of an `export_args`, as passed in the `export` option.
#[derive(Clone, Copy)]
pub struct ExportImage([u8; EXPORT_LEN]);

impl ExportImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// # Safety
///
/// Every byte of `*legacy` must be initialized, padding included. See [`bytes_of`].
pub unsafe fn upgrade_export(legacy: &oexport_args) -> ExportImage {
    let mut image = [0; EXPORT_LEN];
    image[..LEGACY_EXPORT_LEN].copy_from_slice(unsafe { bytes_of(legacy) });
    ExportImage(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mount_shim_sys::abi::LegacyLayout as _;
    use std::ptr;

    #[repr(C, align(16))]
    struct Aligned([u8; LEGACY_EXPORT_LEN]);

    #[test]
    fn image_is_the_size_of_export_args() {
        let image = unsafe { upgrade_export(&oexport_args::boxed_zeroed()) };
        assert_eq!(image.as_bytes().len(), EXPORT_LEN);
        assert!(EXPORT_LEN > LEGACY_EXPORT_LEN);
    }

    #[test]
    fn legacy_bytes_copied_and_rest_zeroed() {
        for pattern in [0x00, 0x5a, 0xa5, 0xff] {
            let raw = Aligned([pattern; LEGACY_EXPORT_LEN]);
            let legacy = unsafe { &*(raw.0.as_ptr() as *const oexport_args) };
            let image = unsafe { upgrade_export(legacy) };
            let bytes = image.as_bytes();
            assert_eq!(&bytes[..LEGACY_EXPORT_LEN], &raw.0[..]);
            assert!(bytes[LEGACY_EXPORT_LEN..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn varied_legacy_bytes_copied_verbatim() {
        let mut raw = Aligned([0; LEGACY_EXPORT_LEN]);
        for (i, b) in raw.0.iter_mut().enumerate() {
            *b = (i % 251) as u8 + 1;
        }
        let legacy = unsafe { &*(raw.0.as_ptr() as *const oexport_args) };
        let image = unsafe { upgrade_export(legacy) };
        assert_eq!(&image.as_bytes()[..LEGACY_EXPORT_LEN], &raw.0[..]);
        assert!(image.as_bytes()[LEGACY_EXPORT_LEN..]
            .iter()
            .all(|b| *b == 0));
    }

    #[test]
    fn fields_land_at_the_same_place() {
        let mut legacy = oexport_args::boxed_zeroed();
        legacy.ex_flags = 0x0400;
        legacy.ex_addrlen = 16;
        legacy.ex_indexfile = ptr::null_mut();
        let image = unsafe { upgrade_export(&legacy) };
        let upgraded = unsafe { ptr::read_unaligned(image.as_bytes().as_ptr() as *const export_args) };
        assert_eq!(upgraded.ex_flags, 0x0400);
        assert_eq!(upgraded.ex_addrlen, 16);
        assert_eq!(upgraded.ex_numsecflavors, 0);
        assert_eq!(upgraded.ex_secflavors, [0; 5]);
    }
}
