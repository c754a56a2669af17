use crate::{export::upgrade_export, LegacyArgs, OptionList, TranslationError, Value};
use mount_shim_sys::abi::ufs_args;

pub fn encode(list: &mut OptionList, args: LegacyArgs<'_>) -> Result<(), TranslationError> {
    let ufs: &ufs_args = args.cast()?;
    // Fully initialized: a `LegacyArgs` requirement.
    let export = unsafe { upgrade_export(&ufs.export) };

    list.append("from", args.text(ufs.fspec))?;
    list.append("export", Value::Binary(export.as_bytes()))
}
