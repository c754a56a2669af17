use super::is_set;
use crate::{legacy::bounded_text, LegacyArgs, OptionList, TranslationError, Value};
use mount_shim_sys::abi::{
    smbfs_args, SMBFS_MOUNT_HAVE_NLS, SMBFS_MOUNT_INTR, SMBFS_MOUNT_NO_LONG, SMBFS_MOUNT_SOFT,
    SMBFS_MOUNT_STRONG,
};
use std::ffi::c_int;

pub fn encode(list: &mut OptionList, args: LegacyArgs<'_>) -> Result<(), TranslationError> {
    let smb: &smbfs_args = args.cast()?;

    list.append("rootpath", Value::Text(bounded_text(&smb.root_path)))?;

    list.append_formatted("dev", format_args!("{}", smb.dev))?;
    list.append_formatted("uid", format_args!("{}", smb.uid as c_int))?;
    list.append_formatted("gid", format_args!("{}", smb.gid as c_int))?;
    list.append_formatted("file_mode", format_args!("{}", smb.file_mode))?;
    list.append_formatted("dir_mode", format_args!("{}", smb.dir_mode))?;
    list.append_formatted("caseopt", format_args!("{}", smb.caseopt))?;

    list.append_flag("nosoft", !is_set(smb.flags, SMBFS_MOUNT_SOFT))?;
    list.append_flag("nointr", !is_set(smb.flags, SMBFS_MOUNT_INTR))?;
    list.append_flag("nostrong", !is_set(smb.flags, SMBFS_MOUNT_STRONG))?;
    list.append_flag("nohave_nls", !is_set(smb.flags, SMBFS_MOUNT_HAVE_NLS))?;
    list.append_flag("nolong", is_set(smb.flags, SMBFS_MOUNT_NO_LONG))
}
