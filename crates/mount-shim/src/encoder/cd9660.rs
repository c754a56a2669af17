use super::is_set;
use crate::{export::upgrade_export, LegacyArgs, OptionList, TranslationError, Value};
use mount_shim_sys::abi::{
    iso_args, ISOFSMNT_BROKENJOLIET, ISOFSMNT_EXTATT, ISOFSMNT_GENS, ISOFSMNT_KICONV,
    ISOFSMNT_NOJOLIET, ISOFSMNT_NORRIP,
};

pub fn encode(list: &mut OptionList, args: LegacyArgs<'_>) -> Result<(), TranslationError> {
    let iso: &iso_args = args.cast()?;
    // Fully initialized: a `LegacyArgs` requirement.
    let export = unsafe { upgrade_export(&iso.export) };

    list.append("from", args.text(iso.fspec))?;
    list.append("export", Value::Binary(export.as_bytes()))?;
    list.append("cs_disk", args.text(iso.cs_disk))?;
    list.append("cs_local", args.text(iso.cs_local))?;

    list.append_formatted("ssector", format_args!("{}", iso.ssector))?;

    list.append_flag("norrip", is_set(iso.flags, ISOFSMNT_NORRIP))?;
    list.append_flag("nogens", !is_set(iso.flags, ISOFSMNT_GENS))?;
    list.append_flag("noextatt", !is_set(iso.flags, ISOFSMNT_EXTATT))?;
    list.append_flag("nojoliet", is_set(iso.flags, ISOFSMNT_NOJOLIET))?;
    list.append_flag("nobrokenjoliet", !is_set(iso.flags, ISOFSMNT_BROKENJOLIET))?;
    list.append_flag("nokiconv", !is_set(iso.flags, ISOFSMNT_KICONV))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoder::test_util::{finalized, keys, text},
        export::EXPORT_LEN,
    };
    use mount_shim_sys::abi::LegacyLayout as _;

    fn encode_args(iso: &iso_args) -> OptionList {
        let mut list = OptionList::new();
        encode(&mut list, unsafe { LegacyArgs::new(iso) }).unwrap();
        list
    }

    #[test]
    fn default_flags() {
        let mut iso = iso_args::boxed_zeroed();
        iso.fspec = c"/dev/cd0".as_ptr().cast_mut();
        iso.ssector = 16;
        iso.cs_disk = c"ISO8859-1".as_ptr().cast_mut();
        iso.cs_local = c"UTF-8".as_ptr().cast_mut();
        let list = encode_args(&iso);
        let options = finalized(&list);
        assert_eq!(
            keys(options),
            vec![
                "from",
                "export",
                "cs_disk",
                "cs_local",
                "ssector",
                "rrip",
                "nogens",
                "noextatt",
                "joliet",
                "nobrokenjoliet",
                "nokiconv",
            ]
        );
        assert_eq!(text(options, "from").unwrap(), "/dev/cd0");
        assert_eq!(text(options, "cs_disk").unwrap(), "ISO8859-1");
        assert_eq!(text(options, "cs_local").unwrap(), "UTF-8");
        assert_eq!(text(options, "ssector").unwrap(), "16");
        assert_eq!(options.get("export").unwrap().value.unwrap().len(), EXPORT_LEN);
    }

    #[test]
    fn all_flags_set() {
        let mut iso = iso_args::boxed_zeroed();
        iso.flags = ISOFSMNT_NORRIP
            | ISOFSMNT_GENS
            | ISOFSMNT_EXTATT
            | ISOFSMNT_NOJOLIET
            | ISOFSMNT_BROKENJOLIET
            | ISOFSMNT_KICONV;
        let list = encode_args(&iso);
        assert_eq!(
            keys(finalized(&list))[5..],
            ["norrip", "gens", "extatt", "nojoliet", "brokenjoliet", "kiconv"]
        );
    }

    #[test]
    fn null_strings_are_absent_values() {
        let list = encode_args(&iso_args::boxed_zeroed());
        let options = finalized(&list);
        for key in ["from", "cs_disk", "cs_local"] {
            assert_eq!(options.get(key).unwrap().value, None);
        }
    }

    #[test]
    fn negative_sector() {
        let mut iso = iso_args::boxed_zeroed();
        iso.ssector = -1;
        let list = encode_args(&iso);
        assert_eq!(text(finalized(&list), "ssector").unwrap(), "-1");
    }
}
