use super::is_set;
use crate::{export::upgrade_export, LegacyArgs, OptionList, TranslationError, Value};
use mount_shim_sys::abi::{
    msdosfs_args, MSDOSFSMNT_KICONV, MSDOSFSMNT_LONGNAME, MSDOSFSMNT_NOWIN95, MSDOSFSMNT_SHORTNAME,
};
use std::ffi::c_int;

pub fn encode(list: &mut OptionList, args: LegacyArgs<'_>) -> Result<(), TranslationError> {
    let msdos: &msdosfs_args = args.cast()?;
    // Fully initialized: a `LegacyArgs` requirement.
    let export = unsafe { upgrade_export(&msdos.export) };

    list.append("from", args.text(msdos.fspec))?;
    list.append("export", Value::Binary(export.as_bytes()))?;
    list.append("cs_win", args.text(msdos.cs_win))?;
    list.append("cs_dos", args.text(msdos.cs_dos))?;
    list.append("cs_local", args.text(msdos.cs_local))?;

    // The kernel scans these with "%d".
    list.append_formatted("uid", format_args!("{}", msdos.uid as c_int))?;
    list.append_formatted("gid", format_args!("{}", msdos.gid as c_int))?;
    list.append_formatted("mask", format_args!("{}", msdos.mask))?;
    list.append_formatted("dirmask", format_args!("{}", msdos.dirmask))?;

    list.append_flag("noshortname", !is_set(msdos.flags, MSDOSFSMNT_SHORTNAME))?;
    list.append_flag("nolongname", !is_set(msdos.flags, MSDOSFSMNT_LONGNAME))?;
    list.append_flag("nowin95", is_set(msdos.flags, MSDOSFSMNT_NOWIN95))?;
    list.append_flag("nokiconv", !is_set(msdos.flags, MSDOSFSMNT_KICONV))
}
