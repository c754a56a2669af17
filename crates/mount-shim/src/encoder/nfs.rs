use crate::{LegacyArgs, OptionList, TranslationError, Value};
use mount_shim_sys::abi::{bytes_of, nfs_args};

/// The NFS client still understands the old struct, passed whole as `nfs_args`.
pub fn encode(list: &mut OptionList, args: LegacyArgs<'_>) -> Result<(), TranslationError> {
    let nfs: &nfs_args = args.cast()?;

    // Fully initialized: a `LegacyArgs` requirement.
    list.append("nfs_args", Value::Binary(unsafe { bytes_of(nfs) }))
}
