//! Function wrappers for the FreeBSD `mount(2)` and `nmount(2)` syscalls.
//!
//! On every other target the wrappers compile, but fail with [`Errno::NOSYS`]. This lets the
//! translation code above this crate be built and tested anywhere.

pub mod abi;

use core::{
    ffi::{c_int, c_uint, c_void, CStr},
    fmt::{self, Display, Formatter},
    marker::PhantomData,
    ptr,
};
use derive_more::{BitOr, BitOrAssign, From, Into};
use std::{error, io};

#[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
pub struct Errno(c_int);

impl Errno {
    pub const NOENT: Self = Self(libc::ENOENT);
    pub const FAULT: Self = Self(libc::EFAULT);
    pub const NOMEM: Self = Self(libc::ENOMEM);
    pub const NOSYS: Self = Self(libc::ENOSYS);
    pub const OVERFLOW: Self = Self(libc::EOVERFLOW);
    pub const INVAL: Self = Self(libc::EINVAL);
    pub const IO: Self = Self(libc::EIO);

    /// "Programming error". Only FreeBSD has a dedicated code for it.
    #[cfg(target_os = "freebsd")]
    pub const DOOFUS: Self = Self(libc::EDOOFUS);
    #[cfg(not(target_os = "freebsd"))]
    pub const DOOFUS: Self = Self(libc::ENOTRECOVERABLE);

    pub fn from_c_int(errno: c_int) -> Self {
        Self(errno)
    }

    pub fn as_c_int(self) -> c_int {
        self.0
    }

    /// The calling thread's current `errno`.
    pub fn last() -> Self {
        Self(io::Error::last_os_error().raw_os_error().unwrap_or(0))
    }

    /// Store this value in the calling thread's `errno`.
    pub fn set_last(self) {
        #[cfg(any(target_os = "freebsd", target_os = "macos"))]
        unsafe {
            *libc::__error() = self.0
        };
        #[cfg(any(target_os = "linux", target_os = "android"))]
        unsafe {
            *libc::__errno_location() = self.0
        };
    }
}

impl Display for Errno {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&io::Error::from_raw_os_error(self.0), f)
    }
}

impl error::Error for Errno {}

/// The `MNT_*` flags accepted by both `mount(2)` and `nmount(2)`. The shim passes them through
/// untouched.
#[derive(BitOr, BitOrAssign, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MountFlags(c_int);

impl MountFlags {
    pub const RDONLY: Self = Self(0x0000_0001);
    pub const SYNCHRONOUS: Self = Self(0x0000_0002);
    pub const NOEXEC: Self = Self(0x0000_0004);
    pub const NOSUID: Self = Self(0x0000_0008);
    pub const NFS4ACLS: Self = Self(0x0000_0010);
    pub const UNION: Self = Self(0x0000_0020);
    pub const ASYNC: Self = Self(0x0000_0040);
    pub const UPDATE: Self = Self(0x0001_0000);
    pub const RELOAD: Self = Self(0x0004_0000);
    pub const FORCE: Self = Self(0x0008_0000);
    pub const SUIDDIR: Self = Self(0x0010_0000);
    pub const SOFTDEP: Self = Self(0x0020_0000);
    pub const NOSYMFOLLOW: Self = Self(0x0040_0000);
    pub const SNAPSHOT: Self = Self(0x0100_0000);
    pub const MULTILABEL: Self = Self(0x0400_0000);
    pub const ACLS: Self = Self(0x0800_0000);
    pub const NOATIME: Self = Self(0x1000_0000);

    pub fn from_bits(bits: c_int) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> c_int {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// One element of the `nmount(2)` argument vector. An absent buffer is encoded as a null base
/// with zero length.
#[repr(transparent)]
pub struct IoVec<'a>(libc::iovec, PhantomData<&'a [u8]>);

impl<'a> IoVec<'a> {
    pub fn new(buf: Option<&'a [u8]>) -> Self {
        let (base, len) = match buf {
            Some(buf) => (buf.as_ptr() as *mut c_void, buf.len()),
            None => (ptr::null_mut(), 0),
        };
        Self(
            libc::iovec {
                iov_base: base,
                iov_len: len,
            },
            PhantomData,
        )
    }

    pub fn len(&self) -> usize {
        self.0.iov_len
    }

    pub fn is_empty(&self) -> bool {
        self.0.iov_len == 0
    }
}

#[cfg(target_os = "freebsd")]
mod freebsd {
    use core::ffi::{c_int, c_uint};

    pub const SYS_MOUNT: c_int = 21;

    extern "C" {
        pub fn syscall(number: c_int, ...) -> c_int;
        pub fn nmount(iov: *mut libc::iovec, niov: c_uint, flags: c_int) -> c_int;
    }
}

#[cfg(target_os = "freebsd")]
fn check(ret: c_int) -> Result<(), Errno> {
    if ret == -1 {
        Err(Errno::last())
    } else {
        Ok(())
    }
}

/// The legacy `mount(2)` syscall. This goes straight to the kernel, so that a library interposing
/// on the libc `mount` symbol can call it without recursing into itself.
pub fn mount(
    fstype: &CStr,
    dir: &CStr,
    flags: MountFlags,
    data: *mut c_void,
) -> Result<(), Errno> {
    #[cfg(target_os = "freebsd")]
    {
        check(unsafe {
            freebsd::syscall(
                freebsd::SYS_MOUNT,
                fstype.as_ptr(),
                dir.as_ptr(),
                flags.0,
                data,
            )
        })
    }
    #[cfg(not(target_os = "freebsd"))]
    {
        let _ = (fstype, dir, flags, data);
        Err(Errno::NOSYS)
    }
}

/// The generic `nmount(2)` syscall. `iov` is interpreted by the kernel as alternating name/value
/// pairs.
pub fn nmount(iov: &mut [IoVec<'_>], flags: MountFlags) -> Result<(), Errno> {
    let niov = c_uint::try_from(iov.len()).map_err(|_| Errno::INVAL)?;
    #[cfg(target_os = "freebsd")]
    {
        let iov_ptr = iov.as_mut_ptr() as *mut libc::iovec;
        check(unsafe { freebsd::nmount(iov_ptr, niov, flags.0) })
    }
    #[cfg(not(target_os = "freebsd"))]
    {
        let _ = (niov, flags);
        Err(Errno::NOSYS)
    }
}
