//! Kernel-defined argument layouts for the legacy `mount(2)` call.
//!
//! These mirror the FreeBSD 12 headers (`<sys/mount.h>`, `<sys/ucred.h>`,
//! `<isofs/cd9660/cd9660_mount.h>`, `<fs/msdosfs/msdosfsmount.h>`, `<fs/nandfs/nandfs_mount.h>`,
//! `<nfsclient/nfsargs.h>`, `<fs/smbfs/smbfs.h>` and `<ufs/ufs/ufsmount.h>`). Field names follow
//! the headers so they can be checked against them line by line.
#![allow(non_camel_case_types)]

use core::{
    ffi::{c_char, c_int, c_short, c_uint, c_void},
    mem, slice,
};

pub type uid_t = u32;
pub type gid_t = u32;
pub type mode_t = u16;
pub type u_char = u8;

pub const XU_NGROUPS: usize = 16;
pub const MAXSECFLAVORS: usize = 5;
pub const MAXPATHLEN: usize = 1024;
/// Not a header constant: `<fs/smbfs/smbfs.h>` spells the bound of `root_path` as `512+1`.
pub const SMB_MAXROOTPATHLEN: usize = 512;

/// Layouts that are plain old data: every bit pattern is a valid value.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` and contain only integers, raw pointers, and arrays or other
/// `LegacyLayout` structs made of them.
pub unsafe trait LegacyLayout: Sized + 'static {
    /// A value with every field zero. Padding bytes aren't guaranteed to survive a move, so use
    /// [`LegacyLayout::boxed_zeroed`] for a value whose bytes will be read with [`bytes_of`].
    fn zeroed() -> Self {
        unsafe { mem::zeroed() }
    }

    /// A heap value with every byte, padding included, set to zero. Assigning fields in place
    /// leaves the padding zero.
    fn boxed_zeroed() -> Box<Self> {
        unsafe { Box::<Self>::new_zeroed().assume_init() }
    }
}

/// The byte image of `value`, padding included.
///
/// # Safety
///
/// Every byte of `*value` must be initialized, padding included. That holds for memory filled in
/// by C, and for a [`LegacyLayout::boxed_zeroed`] value whose fields have been assigned in place.
/// It doesn't hold for a value built with a struct expression.
pub unsafe fn bytes_of<T: LegacyLayout>(value: &T) -> &[u8] {
    unsafe { slice::from_raw_parts(value as *const T as *const u8, mem::size_of::<T>()) }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct xucred {
    pub cr_version: c_uint,
    pub cr_uid: uid_t,
    pub cr_ngroups: c_short,
    pub cr_groups: [gid_t; XU_NGROUPS],
    /// `union { void *_cr_unused1; pid_t cr_pid; }`
    pub cr_pid: *mut c_void,
}

/// The export arguments embedded in pre-`nmount` filesystem argument structs.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct oexport_args {
    pub ex_flags: c_int,
    pub ex_root: uid_t,
    pub ex_anon: xucred,
    pub ex_addr: *mut c_void,
    pub ex_addrlen: u_char,
    pub ex_mask: *mut c_void,
    pub ex_masklen: u_char,
    pub ex_indexfile: *mut c_char,
}

/// The export arguments understood by `nmount(2)`'s `export` option. A superset of
/// [`oexport_args`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct export_args {
    pub ex_flags: c_int,
    pub ex_root: uid_t,
    pub ex_anon: xucred,
    pub ex_addr: *mut c_void,
    pub ex_addrlen: u_char,
    pub ex_mask: *mut c_void,
    pub ex_masklen: u_char,
    pub ex_indexfile: *mut c_char,
    pub ex_numsecflavors: c_int,
    pub ex_secflavors: [c_int; MAXSECFLAVORS],
}

// The prefix of export_args must be laid out exactly as oexport_args.
const _: () = {
    assert!(mem::size_of::<export_args>() > mem::size_of::<oexport_args>());
    assert!(mem::offset_of!(export_args, ex_anon) == mem::offset_of!(oexport_args, ex_anon));
    assert!(mem::offset_of!(export_args, ex_addr) == mem::offset_of!(oexport_args, ex_addr));
    assert!(mem::offset_of!(export_args, ex_mask) == mem::offset_of!(oexport_args, ex_mask));
    assert!(
        mem::offset_of!(export_args, ex_indexfile) == mem::offset_of!(oexport_args, ex_indexfile)
    );
    assert!(mem::offset_of!(export_args, ex_numsecflavors) >= mem::size_of::<oexport_args>());
};

pub const ISOFSMNT_NORRIP: c_int = 0x0000_0001;
pub const ISOFSMNT_GENS: c_int = 0x0000_0002;
pub const ISOFSMNT_EXTATT: c_int = 0x0000_0004;
pub const ISOFSMNT_NOJOLIET: c_int = 0x0000_0008;
pub const ISOFSMNT_BROKENJOLIET: c_int = 0x0000_0010;
pub const ISOFSMNT_KICONV: c_int = 0x0000_0020;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct iso_args {
    pub fspec: *mut c_char,
    pub export: oexport_args,
    pub flags: c_int,
    pub ssector: c_int,
    pub cs_disk: *mut c_char,
    pub cs_local: *mut c_char,
}

pub const MSDOSFSMNT_SHORTNAME: c_int = 0x1;
pub const MSDOSFSMNT_LONGNAME: c_int = 0x2;
pub const MSDOSFSMNT_NOWIN95: c_int = 0x4;
pub const MSDOSFSMNT_KICONV: c_int = 0x10;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct msdosfs_args {
    pub fspec: *mut c_char,
    pub export: oexport_args,
    pub uid: uid_t,
    pub gid: gid_t,
    pub mask: mode_t,
    pub flags: c_int,
    pub unused1: c_int,
    pub unused2: [u16; 128],
    pub cs_win: *mut c_char,
    pub cs_dos: *mut c_char,
    pub cs_local: *mut c_char,
    pub dirmask: mode_t,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct nandfs_args {
    pub fspec: *mut c_char,
    pub cpno: i64,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct nfs_args {
    pub version: c_int,
    pub addr: *mut c_void,
    pub addrlen: c_int,
    pub sotype: c_int,
    pub proto: c_int,
    pub fh: *mut u_char,
    pub fhsize: c_int,
    pub flags: c_int,
    pub wsize: c_int,
    pub rsize: c_int,
    pub readdirsize: c_int,
    pub timeo: c_int,
    pub retrans: c_int,
    pub maxgrouplist: c_int,
    pub readahead: c_int,
    pub wcommitsize: c_int,
    pub deadthresh: c_int,
    pub hostname: *mut c_char,
    pub acregmin: c_int,
    pub acregmax: c_int,
    pub acdirmin: c_int,
    pub acdirmax: c_int,
}

pub const SMBFS_MOUNT_SOFT: c_uint = 0x0001;
pub const SMBFS_MOUNT_INTR: c_uint = 0x0002;
pub const SMBFS_MOUNT_STRONG: c_uint = 0x0004;
pub const SMBFS_MOUNT_HAVE_NLS: c_uint = 0x0008;
pub const SMBFS_MOUNT_NO_LONG: c_uint = 0x0010;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct smbfs_args {
    pub version: c_int,
    pub dev: c_int,
    pub flags: c_uint,
    pub mount_point: [c_char; MAXPATHLEN],
    pub root_path: [u_char; SMB_MAXROOTPATHLEN + 1],
    pub uid: uid_t,
    pub gid: gid_t,
    pub file_mode: mode_t,
    pub dir_mode: mode_t,
    pub caseopt: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct ufs_args {
    pub fspec: *mut c_char,
    pub export: oexport_args,
}

// Sizes and offsets from the FreeBSD 12 amd64 headers.
#[cfg(target_pointer_width = "64")]
const _: () = {
    use mem::{offset_of, size_of};

    assert!(size_of::<xucred>() == 88);
    assert!(offset_of!(xucred, cr_groups) == 12);
    assert!(offset_of!(xucred, cr_pid) == 80);

    assert!(size_of::<oexport_args>() == 136);
    assert!(offset_of!(oexport_args, ex_anon) == 8);
    assert!(offset_of!(oexport_args, ex_addr) == 96);
    assert!(offset_of!(oexport_args, ex_mask) == 112);
    assert!(offset_of!(oexport_args, ex_indexfile) == 128);

    assert!(size_of::<export_args>() == 160);
    assert!(offset_of!(export_args, ex_numsecflavors) == 136);
    assert!(offset_of!(export_args, ex_secflavors) == 140);

    assert!(size_of::<iso_args>() == 168);
    assert!(offset_of!(iso_args, export) == 8);
    assert!(offset_of!(iso_args, flags) == 144);
    assert!(offset_of!(iso_args, ssector) == 148);
    assert!(offset_of!(iso_args, cs_disk) == 152);
    assert!(offset_of!(iso_args, cs_local) == 160);

    assert!(size_of::<msdosfs_args>() == 456);
    assert!(offset_of!(msdosfs_args, uid) == 144);
    assert!(offset_of!(msdosfs_args, mask) == 152);
    assert!(offset_of!(msdosfs_args, flags) == 156);
    assert!(offset_of!(msdosfs_args, unused2) == 164);
    assert!(offset_of!(msdosfs_args, cs_win) == 424);
    assert!(offset_of!(msdosfs_args, cs_dos) == 432);
    assert!(offset_of!(msdosfs_args, cs_local) == 440);
    assert!(offset_of!(msdosfs_args, dirmask) == 448);

    assert!(size_of::<nandfs_args>() == 16);
    assert!(offset_of!(nandfs_args, cpno) == 8);

    assert!(size_of::<nfs_args>() == 112);
    assert!(offset_of!(nfs_args, addr) == 8);
    assert!(offset_of!(nfs_args, fh) == 32);
    assert!(offset_of!(nfs_args, retrans) == 64);
    assert!(offset_of!(nfs_args, maxgrouplist) == 68);
    assert!(offset_of!(nfs_args, deadthresh) == 80);
    assert!(offset_of!(nfs_args, hostname) == 88);
    assert!(offset_of!(nfs_args, acdirmax) == 108);

    assert!(size_of::<smbfs_args>() == 1568);
    assert!(offset_of!(smbfs_args, mount_point) == 12);
    assert!(offset_of!(smbfs_args, root_path) == 1036);
    assert!(offset_of!(smbfs_args, uid) == 1552);
    assert!(offset_of!(smbfs_args, file_mode) == 1560);
    assert!(offset_of!(smbfs_args, caseopt) == 1564);

    assert!(size_of::<ufs_args>() == 144);
    assert!(offset_of!(ufs_args, export) == 8);
};

unsafe impl LegacyLayout for xucred {}
unsafe impl LegacyLayout for oexport_args {}
unsafe impl LegacyLayout for export_args {}
unsafe impl LegacyLayout for iso_args {}
unsafe impl LegacyLayout for msdosfs_args {}
unsafe impl LegacyLayout for nandfs_args {}
unsafe impl LegacyLayout for nfs_args {}
unsafe impl LegacyLayout for smbfs_args {}
unsafe impl LegacyLayout for ufs_args {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_zeroed_is_all_zero_bytes() {
        let args = msdosfs_args::boxed_zeroed();
        let bytes = unsafe { bytes_of(&*args) };
        assert!(bytes.iter().all(|b| *b == 0));
        assert_eq!(bytes.len(), mem::size_of::<msdosfs_args>());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn padding_stays_zero_after_field_assignment() {
        let mut args = nfs_args::boxed_zeroed();
        args.version = -1;
        args.proto = -1;
        args.deadthresh = -1;
        let bytes = unsafe { bytes_of(&*args) };
        assert_eq!(&bytes[..8], &[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
        assert_eq!(&bytes[24..32], &[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
        assert_eq!(&bytes[80..88], &[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn msdosfs_strings_follow_the_unused_table() {
        assert_eq!(mem::size_of_val(&msdosfs_args::zeroed().unused2), 256);
        assert_eq!(
            mem::offset_of!(msdosfs_args, cs_win),
            mem::offset_of!(msdosfs_args, unused2) + 256 + 4
        );
    }

    #[test]
    fn nfs_hostname_follows_deadthresh() {
        assert!(mem::offset_of!(nfs_args, hostname) > mem::offset_of!(nfs_args, deadthresh));
        assert!(mem::offset_of!(nfs_args, readahead) > mem::offset_of!(nfs_args, maxgrouplist));
    }

    #[test]
    fn export_is_first_field_after_fspec() {
        assert_eq!(
            mem::offset_of!(ufs_args, export),
            mem::size_of::<*mut c_char>()
        );
    }
}
