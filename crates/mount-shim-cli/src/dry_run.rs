//! Printing an option list instead of mounting it.

use mount_shim::{LegacyArgs, MountSyscalls, Options};
use mount_shim_sys::{Errno, MountFlags};
use std::{
    ffi::CStr,
    io::{self, Write},
};

fn errno(err: io::Error) -> Errno {
    err.raw_os_error().map_or(Errno::IO, Errno::from_c_int)
}

/// Writes each call it is asked to make to `out`, one option per line. Text values are written as
/// `name=value`, other values as `name=0x<hex>`, and options without a value as just `name`.
pub struct DryRun<W> {
    out: W,
}

impl<W: Write> DryRun<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_options(&mut self, options: Options<'_>, flags: MountFlags) -> io::Result<()> {
        writeln!(self.out, "# nmount flags={:#x}", flags.bits())?;
        for entry in options.entries() {
            let name = entry.name.to_string_lossy();
            match (entry.value, entry.text().and_then(|text| text.to_str().ok())) {
                (None, _) => writeln!(self.out, "{name}")?,
                (Some(_), Some(text)) if !text.contains(char::is_control) => {
                    writeln!(self.out, "{name}={text}")?
                }
                (Some(value), _) => writeln!(self.out, "{name}=0x{}", hex::encode(value))?,
            }
        }
        self.out.flush()
    }
}

impl<W: Write> MountSyscalls for DryRun<W> {
    fn mount(
        &mut self,
        fstype: &CStr,
        dir: &CStr,
        flags: MountFlags,
        _data: Option<LegacyArgs<'_>>,
    ) -> Result<(), Errno> {
        writeln!(
            self.out,
            "# {} is not translated: legacy mount on {} with flags={:#x}",
            fstype.to_string_lossy(),
            dir.to_string_lossy(),
            flags.bits(),
        )
        .map_err(errno)
    }

    fn nmount(&mut self, options: Options<'_>, flags: MountFlags) -> Result<(), Errno> {
        self.write_options(options, flags).map_err(errno)
    }
}
