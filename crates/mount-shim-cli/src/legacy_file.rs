//! Legacy argument structs described in TOML.
//!
//! The file holds the fields of the argument struct for one filesystem type, for example:
//!
//! ```toml
//! fspec = "/dev/da0s1"
//! uid = 1001
//! flags = ["longname", "kiconv"]
//! ```
//!
//! String fields are copied into owned C strings, and the struct is built pointing at them, so a
//! [`LegacyImage`] can be handed to the dispatcher like a caller's own struct.

use anyhow::{bail, Context as _, Result};
use mount_shim::{Encoder, LegacyArgs};
use mount_shim_sys::abi::{
    self, iso_args, msdosfs_args, nandfs_args, nfs_args, oexport_args, smbfs_args, ufs_args,
    LegacyLayout as _,
};
use serde::Deserialize;
use std::{
    ffi::{c_char, c_int, c_uint, CString},
    ptr,
};

#[derive(Default)]
struct Strings(Vec<CString>);

impl Strings {
    /// Keep a C copy of `value` alive for as long as the image. Returns a pointer to it, or null
    /// when there is no value.
    fn add(&mut self, field: &str, value: Option<String>) -> Result<*mut c_char> {
        let Some(value) = value else {
            return Ok(ptr::null_mut());
        };
        let value =
            CString::new(value).with_context(|| format!("field `{field}` contains a NUL byte"))?;
        let ptr = value.as_ptr().cast_mut();
        self.0.push(value);
        Ok(ptr)
    }
}

/// Copy `value` into `dest`, leaving at least one trailing NUL.
fn copy_bounded<T>(
    field: &str,
    value: &str,
    dest: &mut [T],
    convert: impl Fn(u8) -> T,
) -> Result<()> {
    if value.len() >= dest.len() {
        bail!("field `{field}` is longer than {} bytes", dest.len() - 1);
    }
    if value.bytes().any(|b| b == 0) {
        bail!("field `{field}` contains a NUL byte");
    }
    for (dest, byte) in dest.iter_mut().zip(value.bytes()) {
        *dest = convert(byte);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ExportFields {
    flags: c_int,
    root: u32,
}

impl ExportFields {
    fn fill(self, export: &mut oexport_args) {
        export.ex_flags = self.flags;
        export.ex_root = self.root;
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum IsoFlag {
    Norrip,
    Gens,
    Extatt,
    Nojoliet,
    Brokenjoliet,
    Kiconv,
}

impl IsoFlag {
    fn bit(self) -> c_int {
        match self {
            Self::Norrip => abi::ISOFSMNT_NORRIP,
            Self::Gens => abi::ISOFSMNT_GENS,
            Self::Extatt => abi::ISOFSMNT_EXTATT,
            Self::Nojoliet => abi::ISOFSMNT_NOJOLIET,
            Self::Brokenjoliet => abi::ISOFSMNT_BROKENJOLIET,
            Self::Kiconv => abi::ISOFSMNT_KICONV,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Cd9660Fields {
    fspec: Option<String>,
    export: ExportFields,
    flags: Vec<IsoFlag>,
    ssector: c_int,
    cs_disk: Option<String>,
    cs_local: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum MsdosfsFlag {
    Shortname,
    Longname,
    Nowin95,
    Kiconv,
}

impl MsdosfsFlag {
    fn bit(self) -> c_int {
        match self {
            Self::Shortname => abi::MSDOSFSMNT_SHORTNAME,
            Self::Longname => abi::MSDOSFSMNT_LONGNAME,
            Self::Nowin95 => abi::MSDOSFSMNT_NOWIN95,
            Self::Kiconv => abi::MSDOSFSMNT_KICONV,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MsdosfsFields {
    fspec: Option<String>,
    export: ExportFields,
    uid: u32,
    gid: u32,
    mask: u16,
    dirmask: u16,
    flags: Vec<MsdosfsFlag>,
    cs_win: Option<String>,
    cs_dos: Option<String>,
    cs_local: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NandfsFields {
    fspec: Option<String>,
    cpno: i64,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NfsFields {
    version: c_int,
    sotype: c_int,
    proto: c_int,
    flags: c_int,
    wsize: c_int,
    rsize: c_int,
    readdirsize: c_int,
    timeo: c_int,
    retrans: c_int,
    maxgrouplist: c_int,
    readahead: c_int,
    wcommitsize: c_int,
    deadthresh: c_int,
    hostname: Option<String>,
    acregmin: c_int,
    acregmax: c_int,
    acdirmin: c_int,
    acdirmax: c_int,
}

impl Default for NfsFields {
    fn default() -> Self {
        Self {
            version: 3,
            sotype: 0,
            proto: 0,
            flags: 0,
            wsize: 0,
            rsize: 0,
            readdirsize: 0,
            timeo: 0,
            retrans: 0,
            maxgrouplist: 0,
            readahead: 0,
            wcommitsize: 0,
            deadthresh: 0,
            hostname: None,
            acregmin: 0,
            acregmax: 0,
            acdirmin: 0,
            acdirmax: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum SmbfsFlag {
    Soft,
    Intr,
    Strong,
    HaveNls,
    NoLong,
}

impl SmbfsFlag {
    fn bit(self) -> c_uint {
        match self {
            Self::Soft => abi::SMBFS_MOUNT_SOFT,
            Self::Intr => abi::SMBFS_MOUNT_INTR,
            Self::Strong => abi::SMBFS_MOUNT_STRONG,
            Self::HaveNls => abi::SMBFS_MOUNT_HAVE_NLS,
            Self::NoLong => abi::SMBFS_MOUNT_NO_LONG,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SmbfsFields {
    version: c_int,
    dev: c_int,
    flags: Vec<SmbfsFlag>,
    mount_point: String,
    root_path: String,
    uid: u32,
    gid: u32,
    file_mode: u16,
    dir_mode: u16,
    caseopt: c_int,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct UfsFields {
    fspec: Option<String>,
    export: ExportFields,
}

/// Each struct is zeroed on the heap and filled in place, so its padding stays zero when its bytes
/// are copied whole.
enum LegacyStruct {
    Cd9660(Box<iso_args>),
    Msdosfs(Box<msdosfs_args>),
    Nandfs(Box<nandfs_args>),
    Nfs(Box<nfs_args>),
    Smbfs(Box<smbfs_args>),
    Ufs(Box<ufs_args>),
}

/// An owned legacy argument struct together with the strings it points to.
pub struct LegacyImage {
    args: LegacyStruct,
    _strings: Strings,
}

impl LegacyImage {
    pub fn args(&self) -> LegacyArgs<'_> {
        // Every byte is initialized, and the string pointers all point into `_strings`, which
        // lives as long as `self`.
        unsafe {
            match &self.args {
                LegacyStruct::Cd9660(args) => LegacyArgs::new(args.as_ref()),
                LegacyStruct::Msdosfs(args) => LegacyArgs::new(args.as_ref()),
                LegacyStruct::Nandfs(args) => LegacyArgs::new(args.as_ref()),
                LegacyStruct::Nfs(args) => LegacyArgs::new(args.as_ref()),
                LegacyStruct::Smbfs(args) => LegacyArgs::new(args.as_ref()),
                LegacyStruct::Ufs(args) => LegacyArgs::new(args.as_ref()),
            }
        }
    }
}

fn fold_flags<F: Copy, T: Default + std::ops::BitOr<Output = T>>(
    flags: &[F],
    bit: impl Fn(F) -> T,
) -> T {
    flags.iter().fold(T::default(), |acc, flag| acc | bit(*flag))
}

/// Parse `contents` as the argument struct `encoder` reads.
pub fn parse(encoder: Encoder, contents: &str) -> Result<LegacyImage> {
    let mut strings = Strings::default();
    let args = match encoder {
        Encoder::Cd9660 => {
            let fields: Cd9660Fields = toml::from_str(contents)?;
            let mut args = iso_args::boxed_zeroed();
            args.fspec = strings.add("fspec", fields.fspec)?;
            fields.export.fill(&mut args.export);
            args.flags = fold_flags(&fields.flags, IsoFlag::bit);
            args.ssector = fields.ssector;
            args.cs_disk = strings.add("cs_disk", fields.cs_disk)?;
            args.cs_local = strings.add("cs_local", fields.cs_local)?;
            LegacyStruct::Cd9660(args)
        }
        Encoder::Msdosfs => {
            let fields: MsdosfsFields = toml::from_str(contents)?;
            let mut args = msdosfs_args::boxed_zeroed();
            args.fspec = strings.add("fspec", fields.fspec)?;
            fields.export.fill(&mut args.export);
            args.uid = fields.uid;
            args.gid = fields.gid;
            args.mask = fields.mask;
            args.dirmask = fields.dirmask;
            args.flags = fold_flags(&fields.flags, MsdosfsFlag::bit);
            args.cs_win = strings.add("cs_win", fields.cs_win)?;
            args.cs_dos = strings.add("cs_dos", fields.cs_dos)?;
            args.cs_local = strings.add("cs_local", fields.cs_local)?;
            LegacyStruct::Msdosfs(args)
        }
        Encoder::Nandfs => {
            let fields: NandfsFields = toml::from_str(contents)?;
            let mut args = nandfs_args::boxed_zeroed();
            args.fspec = strings.add("fspec", fields.fspec)?;
            args.cpno = fields.cpno;
            LegacyStruct::Nandfs(args)
        }
        Encoder::Nfs => {
            let fields: NfsFields = toml::from_str(contents)?;
            let mut args = nfs_args::boxed_zeroed();
            args.version = fields.version;
            args.sotype = fields.sotype;
            args.proto = fields.proto;
            args.flags = fields.flags;
            args.wsize = fields.wsize;
            args.rsize = fields.rsize;
            args.readdirsize = fields.readdirsize;
            args.timeo = fields.timeo;
            args.retrans = fields.retrans;
            args.maxgrouplist = fields.maxgrouplist;
            args.readahead = fields.readahead;
            args.wcommitsize = fields.wcommitsize;
            args.deadthresh = fields.deadthresh;
            args.hostname = strings.add("hostname", fields.hostname)?;
            args.acregmin = fields.acregmin;
            args.acregmax = fields.acregmax;
            args.acdirmin = fields.acdirmin;
            args.acdirmax = fields.acdirmax;
            LegacyStruct::Nfs(args)
        }
        Encoder::Smbfs => {
            let fields: SmbfsFields = toml::from_str(contents)?;
            let mut args = smbfs_args::boxed_zeroed();
            args.version = fields.version;
            args.dev = fields.dev;
            args.flags = fold_flags(&fields.flags, SmbfsFlag::bit);
            copy_bounded(
                "mount_point",
                &fields.mount_point,
                &mut args.mount_point,
                |b| b as c_char,
            )?;
            copy_bounded("root_path", &fields.root_path, &mut args.root_path, |b| b)?;
            args.uid = fields.uid;
            args.gid = fields.gid;
            args.file_mode = fields.file_mode;
            args.dir_mode = fields.dir_mode;
            args.caseopt = fields.caseopt;
            LegacyStruct::Smbfs(args)
        }
        Encoder::Ufs => {
            let fields: UfsFields = toml::from_str(contents)?;
            let mut args = ufs_args::boxed_zeroed();
            args.fspec = strings.add("fspec", fields.fspec)?;
            fields.export.fill(&mut args.export);
            LegacyStruct::Ufs(args)
        }
    };
    Ok(LegacyImage {
        args,
        _strings: strings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use mount_shim::OptionList;
    use std::ffi::CStr;

    fn options(encoder: Encoder, contents: &str) -> Vec<(String, Option<Vec<u8>>)> {
        let image = parse(encoder, contents).unwrap();
        let mut list = OptionList::new();
        encoder.encode(&mut list, Some(image.args())).unwrap();
        list.finalize()
            .unwrap()
            .entries()
            .map(|entry| {
                (
                    entry.name.to_string_lossy().into_owned(),
                    entry.value.map(<[u8]>::to_vec),
                )
            })
            .collect()
    }

    fn text<'a>(options: &'a [(String, Option<Vec<u8>>)], name: &str) -> Option<&'a str> {
        options
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
            .map(|v| CStr::from_bytes_with_nul(v).unwrap().to_str().unwrap())
    }

    #[test]
    fn msdosfs_fields() {
        let options = options(
            Encoder::Msdosfs,
            indoc! {r#"
                fspec = "/dev/da0s1"
                uid = 1001
                gid = 20
                mask = 0o644
                dirmask = 0o755
                flags = ["longname", "kiconv"]
                cs_local = "UTF-8"
            "#},
        );
        assert_eq!(text(&options, "from"), Some("/dev/da0s1"));
        assert_eq!(text(&options, "uid"), Some("1001"));
        assert_eq!(text(&options, "gid"), Some("20"));
        assert_eq!(text(&options, "mask"), Some("420"));
        assert_eq!(text(&options, "dirmask"), Some("493"));
        assert_eq!(text(&options, "cs_local"), Some("UTF-8"));
        let names: Vec<_> = options.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"longname"));
        assert!(names.contains(&"kiconv"));
        assert!(names.contains(&"noshortname"));
    }

    #[test]
    fn absent_strings_are_absent_values() {
        let options = options(Encoder::Cd9660, "ssector = 16");
        let from = options.iter().find(|(n, _)| n == "from").unwrap();
        assert_eq!(from.1, None);
        assert_eq!(text(&options, "ssector"), Some("16"));
    }

    #[test]
    fn nandfs_fields() {
        let options = options(Encoder::Nandfs, "fspec = \"/dev/nand0\"\ncpno = 7");
        assert_eq!(text(&options, "from"), Some("/dev/nand0"));
        assert_eq!(text(&options, "snap"), Some("7"));
    }

    #[test]
    fn smbfs_fields() {
        let options = options(
            Encoder::Smbfs,
            indoc! {r#"
                root_path = "//SERVER/SHARE"
                dev = 3
                flags = ["soft", "no-long"]
            "#},
        );
        assert_eq!(text(&options, "rootpath"), Some("//SERVER/SHARE"));
        assert_eq!(text(&options, "dev"), Some("3"));
        let names: Vec<_> = options.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"soft"));
        assert!(names.contains(&"nolong"));
    }

    #[test]
    fn nfs_version_defaults_to_three() {
        let image = parse(Encoder::Nfs, "hostname = \"server\"").unwrap();
        let LegacyStruct::Nfs(args) = &image.args else {
            panic!("wrong struct");
        };
        assert_eq!(args.version, 3);
        let hostname = unsafe { CStr::from_ptr(args.hostname) };
        assert_eq!(hostname, c"server");
    }

    #[test]
    fn nfs_struct_bytes_follow_header_order() {
        let contents = indoc! {r#"
            retrans = 4
            maxgrouplist = 16
            readahead = 2
            wcommitsize = 65536
            deadthresh = 9
        "#};
        // No strings, so no pointers: two parses must agree byte for byte, padding included.
        let first = options(Encoder::Nfs, contents);
        let second = options(Encoder::Nfs, contents);
        assert_eq!(first, second);

        let (_, bytes) = first.iter().find(|(name, _)| name == "nfs_args").unwrap();
        let bytes = bytes.as_deref().unwrap();
        assert_eq!(bytes.len(), std::mem::size_of::<nfs_args>());
        let field = |offset: usize| {
            let offset = offset + std::mem::offset_of!(nfs_args, retrans);
            c_int::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
        };
        assert_eq!([field(0), field(4), field(8), field(12), field(16)], [4, 16, 2, 65536, 9]);
    }

    #[test]
    fn ufs_export_fields() {
        let image = parse(Encoder::Ufs, "[export]\nflags = 2\nroot = 65534").unwrap();
        let LegacyStruct::Ufs(args) = &image.args else {
            panic!("wrong struct");
        };
        assert_eq!(args.export.ex_flags, 2);
        assert_eq!(args.export.ex_root, 65534);
        assert!(args.fspec.is_null());
    }

    #[test]
    fn unknown_field_is_an_error() {
        assert!(parse(Encoder::Ufs, "fpsec = \"/dev/ada0p2\"").is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(parse(Encoder::Msdosfs, "flags = [\"longnames\"]").is_err());
    }

    #[test]
    fn nul_in_string_is_an_error() {
        let err = parse(Encoder::Ufs, "fspec = \"/dev/\\u0000x\"").err().unwrap();
        assert!(err.to_string().contains("fspec"), "{err}");
    }

    #[test]
    fn oversized_root_path_is_an_error() {
        let contents = format!("root_path = \"{}\"", "r".repeat(abi::SMB_MAXROOTPATHLEN + 1));
        let err = parse(Encoder::Smbfs, &contents).err().unwrap();
        assert!(err.to_string().contains("root_path"), "{err}");
    }
}
