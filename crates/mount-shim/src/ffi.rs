//! C entry point: a wrapper with the signature of the libc `mount` function.
//!
//! Callers link against `mount_shim_mount`. With the `interpose` feature the library also exports
//! the symbol `mount` itself, so it can be preloaded in front of libc.

use crate::{dispatch, LegacyArgs, SystemSyscalls};
use mount_shim_sys::{Errno, MountFlags};
use slog::{o, Discard, Logger};
use std::{
    ffi::{c_char, c_int, c_void, CStr},
    ptr::NonNull,
};

/// `int mount(const char *type, const char *dir, int flags, void *data)`
///
/// Returns 0 on success. On failure returns -1 and sets `errno`: to `EFAULT` if `fstype` or `dir`
/// is null, to the [`crate::TranslationError::errno`] of a translation failure, or to whatever the
/// kernel reported.
///
/// # Safety
///
/// `fstype` and `dir` must be NUL-terminated strings. `data` must be null or point to the
/// argument struct `mount(2)` expects for `fstype`.
#[no_mangle]
pub unsafe extern "C" fn mount_shim_mount(
    fstype: *const c_char,
    dir: *const c_char,
    flags: c_int,
    data: *mut c_void,
) -> c_int {
    if fstype.is_null() || dir.is_null() {
        Errno::FAULT.set_last();
        return -1;
    }
    let log = Logger::root(Discard, o!());
    let fstype = unsafe { CStr::from_ptr(fstype) };
    let dir = unsafe { CStr::from_ptr(dir) };
    let data = NonNull::new(data).map(|data| unsafe { LegacyArgs::from_raw(data) });
    match dispatch(
        &mut SystemSyscalls,
        &log,
        fstype,
        dir,
        MountFlags::from_bits(flags),
        data,
    ) {
        Ok(()) => 0,
        Err(err) => {
            err.errno().set_last();
            -1
        }
    }
}

/// Exports [`mount_shim_mount`] under the libc name.
///
/// # Safety
///
/// Same as [`mount_shim_mount`].
#[cfg(feature = "interpose")]
#[no_mangle]
pub unsafe extern "C" fn mount(
    fstype: *const c_char,
    dir: *const c_char,
    flags: c_int,
    data: *mut c_void,
) -> c_int {
    unsafe { mount_shim_mount(fstype, dir, flags, data) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn null_type_is_fault() {
        let result = unsafe { mount_shim_mount(ptr::null(), c"/mnt".as_ptr(), 0, ptr::null_mut()) };
        assert_eq!(result, -1);
        assert_eq!(Errno::last(), Errno::FAULT);
    }

    #[cfg(feature = "interpose")]
    #[test]
    fn libc_name_forwards() {
        let result = unsafe { mount(c"ufs".as_ptr(), ptr::null(), 0, ptr::null_mut()) };
        assert_eq!(result, -1);
        assert_eq!(Errno::last(), Errno::FAULT);
    }

    #[cfg(not(target_os = "freebsd"))]
    #[test]
    fn errno_is_set_on_failure() {
        let result = unsafe {
            mount_shim_mount(c"fdescfs".as_ptr(), c"/dev/fd".as_ptr(), 0, ptr::null_mut())
        };
        assert_eq!(result, -1);
        assert_eq!(Errno::last(), Errno::NOSYS);
    }
}
