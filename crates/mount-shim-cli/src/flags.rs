//! Mount flags given by name, as in `-o rdonly,nosuid`.

use mount_shim_sys::MountFlags;
use serde::Deserialize;
use std::{
    error,
    fmt::{self, Display, Formatter},
    str::FromStr,
};
use strum::EnumString;

#[derive(Clone, Copy, Debug, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
enum FlagName {
    #[strum(serialize = "rdonly", serialize = "ro")]
    Rdonly,
    #[strum(serialize = "synchronous", serialize = "sync")]
    Synchronous,
    Noexec,
    Nosuid,
    Nfs4acls,
    Union,
    Async,
    Update,
    Reload,
    Force,
    Suiddir,
    Softdep,
    Nosymfollow,
    Snapshot,
    Multilabel,
    Acls,
    Noatime,
}

impl FlagName {
    fn flag(self) -> MountFlags {
        match self {
            Self::Rdonly => MountFlags::RDONLY,
            Self::Synchronous => MountFlags::SYNCHRONOUS,
            Self::Noexec => MountFlags::NOEXEC,
            Self::Nosuid => MountFlags::NOSUID,
            Self::Nfs4acls => MountFlags::NFS4ACLS,
            Self::Union => MountFlags::UNION,
            Self::Async => MountFlags::ASYNC,
            Self::Update => MountFlags::UPDATE,
            Self::Reload => MountFlags::RELOAD,
            Self::Force => MountFlags::FORCE,
            Self::Suiddir => MountFlags::SUIDDIR,
            Self::Softdep => MountFlags::SOFTDEP,
            Self::Nosymfollow => MountFlags::NOSYMFOLLOW,
            Self::Snapshot => MountFlags::SNAPSHOT,
            Self::Multilabel => MountFlags::MULTILABEL,
            Self::Acls => MountFlags::ACLS,
            Self::Noatime => MountFlags::NOATIME,
        }
    }
}

#[derive(Debug)]
pub struct UnknownFlagError(String);

impl Display for UnknownFlagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mount flag `{}`", self.0)
    }
}

impl error::Error for UnknownFlagError {}

/// A comma-separated list of flag names. Empty names are skipped.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub struct FlagList(MountFlags);

impl FlagList {
    pub fn flags(self) -> MountFlags {
        self.0
    }
}

impl FromStr for FlagList {
    type Err = UnknownFlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(MountFlags::default(), |flags, name| {
                let name =
                    FlagName::from_str(name).map_err(|_| UnknownFlagError(name.to_owned()))?;
                Ok(flags | name.flag())
            })
            .map(Self)
    }
}

impl TryFrom<String> for FlagList {
    type Error = UnknownFlagError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
