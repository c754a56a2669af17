//! The mount entry point.

use crate::{
    registry::{self, Translation},
    LegacyArgs, MountError, OptionList, Options, TranslationError, Value,
};
use mount_shim_sys::{self as sys, Errno, IoVec, MountFlags};
use slog::{debug, warn, Logger};
use std::{ffi::CStr, ptr};

/// The two system calls the shim sits between. [`SystemSyscalls`] makes the real calls. Tests
/// substitute fakes.
pub trait MountSyscalls {
    /// The legacy `mount(2)`, called for filesystem types the shim doesn't recognize.
    fn mount(
        &mut self,
        fstype: &CStr,
        dir: &CStr,
        flags: MountFlags,
        data: Option<LegacyArgs<'_>>,
    ) -> Result<(), Errno>;

    /// The generic `nmount(2)`, called with a finished option list.
    fn nmount(&mut self, options: Options<'_>, flags: MountFlags) -> Result<(), Errno>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemSyscalls;

impl MountSyscalls for SystemSyscalls {
    fn mount(
        &mut self,
        fstype: &CStr,
        dir: &CStr,
        flags: MountFlags,
        data: Option<LegacyArgs<'_>>,
    ) -> Result<(), Errno> {
        let data = data.map_or(ptr::null_mut(), |data| data.as_ptr());
        sys::mount(fstype, dir, flags, data)
    }

    fn nmount(&mut self, options: Options<'_>, flags: MountFlags) -> Result<(), Errno> {
        let mut iov = Vec::new();
        iov.try_reserve_exact(options.len())
            .map_err(|_| Errno::NOMEM)?;
        iov.extend(options.segments().map(IoVec::new));
        sys::nmount(&mut iov, flags)
    }
}

fn translate<'list>(
    list: &'list mut OptionList,
    translation: Translation,
    fstype: &CStr,
    dir: &CStr,
    data: Option<LegacyArgs<'_>>,
) -> Result<Options<'list>, TranslationError> {
    list.append("fstype", Value::from(fstype))?;
    list.append("fspath", Value::from(dir))?;
    if let Translation::Encode(encoder) = translation {
        encoder.encode(list, data)?;
    }
    list.finalize()
}

/// Mount the filesystem of type `fstype` on `dir`, with the legacy argument struct `data`.
///
/// If `fstype` is one the shim knows, `data` is translated to an option list and `nmount(2)` is
/// called. Otherwise the arguments go to `mount(2)` unchanged. A translation failure is returned
/// without making any system call. A system call failure is returned exactly as the kernel
/// reported it.
pub fn dispatch(
    syscalls: &mut impl MountSyscalls,
    log: &Logger,
    fstype: &CStr,
    dir: &CStr,
    flags: MountFlags,
    data: Option<LegacyArgs<'_>>,
) -> Result<(), MountError> {
    let Some(translation) = registry::lookup(fstype) else {
        debug!(log, "passing mount through to legacy call";
            "fstype" => %fstype.to_string_lossy());
        return Ok(syscalls.mount(fstype, dir, flags, data)?);
    };
    debug!(log, "translating mount";
        "fstype" => %fstype.to_string_lossy(),
        "translation" => ?translation,
        "has_data" => data.is_some());

    let mut list = OptionList::new();
    let options = translate(&mut list, translation, fstype, dir, data).map_err(|err| {
        warn!(log, "failed to translate mount arguments";
            "fstype" => %fstype.to_string_lossy(),
            "error" => %err);
        err
    })?;
    syscalls.nmount(options, flags).map_err(|errno| {
        debug!(log, "nmount failed";
            "fstype" => %fstype.to_string_lossy(),
            "errno" => %errno);
        errno.into()
    })
}
