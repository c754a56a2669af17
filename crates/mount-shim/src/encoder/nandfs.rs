use crate::{LegacyArgs, OptionList, TranslationError};
use mount_shim_sys::abi::nandfs_args;

pub fn encode(list: &mut OptionList, args: LegacyArgs<'_>) -> Result<(), TranslationError> {
    let nandfs: &nandfs_args = args.cast()?;

    list.append("from", args.text(nandfs.fspec))?;
    list.append_formatted("snap", format_args!("{}", nandfs.cpno))
}
