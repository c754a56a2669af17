mod dry_run;
mod flags;
mod legacy_file;
mod log;

use anyhow::{bail, Context as _, Result};
use clap::{command, Arg, ArgAction, ArgMatches, Command};
use dry_run::DryRun;
use flags::FlagList;
use legacy_file::LegacyImage;
use log::LogLevel;
use mount_shim::{
    dispatch,
    registry::{self, Translation},
    SystemSyscalls,
};
use mount_shim_config::Config;
use mount_shim_sys::MountFlags;
use slog::{info, Logger};
use std::{
    env,
    ffi::{CStr, CString},
    fs, io,
    path::{Path, PathBuf},
};
use xdg::BaseDirectories;

const ENV_PREFIX: &str = "MOUNT_SHIM_";

fn cli() -> Command {
    command!()
        .name("mount-shim")
        .about("Mount a filesystem from legacy mount(2) arguments by translating them to nmount(2) options.")
        .arg(
            Arg::new("config-file")
                .long("config-file")
                .short('c')
                .value_name("PATH")
                .action(ArgAction::Set)
                .help("Configuration file. Without this, mount-shim/config.toml is searched for in the XDG config directories."),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .short('l')
                .value_name("LEVEL")
                .action(ArgAction::Set)
                .help("Minimum log level to output: error, warning, info or debug."),
        )
        .arg(
            Arg::new("mount-flags")
                .long("mount-flags")
                .short('o')
                .value_name("FLAGS")
                .action(ArgAction::Set)
                .help("Comma-separated mount flags, like rdonly,nosuid."),
        )
        .arg(
            Arg::new("options")
                .long("options")
                .value_name("FILE")
                .action(ArgAction::Set)
                .help("TOML file giving the fields of the filesystem's legacy argument struct."),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print the translated options instead of mounting."),
        )
        .arg(Arg::new("fstype").value_name("FSTYPE").required(true))
        .arg(Arg::new("path").value_name("PATH").required(true))
}

struct Settings {
    log_level: LogLevel,
    mount_flags: MountFlags,
    options: Option<PathBuf>,
    dry_run: bool,
}

impl Settings {
    fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            log_level: config.get_or("log-level", LogLevel::default())?,
            mount_flags: config.get_or("mount-flags", FlagList::default())?.flags(),
            options: config.get_option("options")?,
            dry_run: config.get_flag("dry-run")?.unwrap_or(false),
        })
    }
}

fn config_files(args: &ArgMatches) -> Result<Vec<(PathBuf, String)>> {
    let paths: Vec<PathBuf> = match args.get_one::<String>("config-file") {
        Some(path) => vec![path.into()],
        None => BaseDirectories::with_prefix("mount-shim")
            .context("searching for config files")?
            .find_config_files("config.toml")
            .collect(),
    };
    paths
        .into_iter()
        .map(|path| {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("error reading config file `{}`", path.display()))?;
            Ok((path, contents))
        })
        .collect()
}

fn c_arg(args: &ArgMatches, name: &str) -> Result<CString> {
    let value = args
        .get_one::<String>(name)
        .with_context(|| format!("missing argument `{name}`"))?;
    CString::new(value.as_str()).with_context(|| format!("argument `{name}` contains a NUL byte"))
}

fn load_options(fstype: &CStr, path: &Path) -> Result<LegacyImage> {
    let Some(Translation::Encode(encoder)) = registry::lookup(fstype) else {
        bail!(
            "filesystem type `{}` doesn't take an options file",
            fstype.to_string_lossy()
        );
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("error reading options file `{}`", path.display()))?;
    legacy_file::parse(encoder, &contents)
        .with_context(|| format!("error parsing options file `{}`", path.display()))
}

fn mount_main(settings: Settings, fstype: &CStr, dir: &CStr, log: Logger) -> Result<()> {
    let image = settings
        .options
        .as_ref()
        .map(|path| load_options(fstype, path))
        .transpose()?;
    let data = image.as_ref().map(LegacyImage::args);

    info!(log, "mounting";
        "fstype" => %fstype.to_string_lossy(),
        "path" => %dir.to_string_lossy(),
        "flags" => ?settings.mount_flags,
        "options" => ?settings.options,
        "dry_run" => settings.dry_run);

    let result = if settings.dry_run {
        let mut dry_run = DryRun::new(io::stdout().lock());
        dispatch(&mut dry_run, &log, fstype, dir, settings.mount_flags, data)
    } else {
        dispatch(
            &mut SystemSyscalls,
            &log,
            fstype,
            dir,
            settings.mount_flags,
            data,
        )
    };
    result.with_context(|| {
        format!(
            "error mounting {} on {}",
            fstype.to_string_lossy(),
            dir.to_string_lossy()
        )
    })
}

fn main() -> Result<()> {
    let args = cli().get_matches();
    let fstype = c_arg(&args, "fstype")?;
    let dir = c_arg(&args, "path")?;
    let files = config_files(&args)?;
    let config = Config::new(args, ENV_PREFIX, env::vars(), files)?;
    let settings = Settings::new(&config)?;
    log::run_with_logger(settings.log_level, |log| {
        mount_main(settings, &fstype, &dir, log)
    })
}
