//! Configuration values looked up, in order, in command-line options, environment variables, and
//! TOML config files. A key like `log-level` is `--log-level` on the command line,
//! `<PREFIX>LOG_LEVEL` in the environment, and `log_level` in a config file.

use anyhow::{bail, Context as _, Result};
use clap::{
    parser::{MatchesError, ValueSource},
    ArgMatches,
};
use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf, str::FromStr};
use toml::Table;

pub struct Config {
    args: ArgMatches,
    env_prefix: &'static str,
    env: HashMap<String, String>,
    files: Vec<(PathBuf, Table)>,
}

fn toml_key(key: &str) -> String {
    key.replace('-', "_")
}

impl Config {
    /// Files earlier in `files` take precedence over later ones.
    pub fn new(
        args: ArgMatches,
        env_prefix: &'static str,
        env: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
        files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<String>)>,
    ) -> Result<Self> {
        let env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let files = files
            .into_iter()
            .map(|(path, contents)| {
                let path = path.into();
                contents
                    .into()
                    .parse::<Table>()
                    .with_context(|| format!("error parsing config file `{}`", path.display()))
                    .map(|table| (path, table))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            args,
            env_prefix,
            env,
            files,
        })
    }

    fn env_key(&self, key: &str) -> String {
        self.env_prefix
            .chars()
            .chain(key.chars())
            .map(|c| match c {
                '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }

    fn from_args<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        let value = match self.args.try_get_one::<String>(key) {
            Err(MatchesError::UnknownArgument { .. }) => None,
            result => result.with_context(|| {
                format!("error getting matches data for command-line option `--{key}`")
            })?,
        };
        value
            .map(String::as_str)
            .map(T::from_str)
            .transpose()
            .with_context(|| format!("error parsing command-line option `--{key}`"))
    }

    fn from_env<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        let env_key = self.env_key(key);
        self.env
            .get(&env_key)
            .map(String::as_str)
            .map(T::from_str)
            .transpose()
            .with_context(|| format!("error parsing environment variable `{env_key}`"))
    }

    fn from_files<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'a> Deserialize<'a>,
    {
        let toml_key = toml_key(key);
        for (path, table) in &self.files {
            if let Some(value) = table.get(&toml_key) {
                return T::deserialize(value.clone()).map(Some).with_context(|| {
                    format!(
                        "error parsing value for key `{toml_key}` in config file `{}`",
                        path.display()
                    )
                });
            }
        }
        Ok(None)
    }

    /// The value for `key` from the first source that has one, or `None`.
    pub fn get_option<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr + for<'a> Deserialize<'a>,
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        if let Some(value) = self.from_args(key)? {
            return Ok(Some(value));
        }
        if let Some(value) = self.from_env(key)? {
            return Ok(Some(value));
        }
        self.from_files(key)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr + for<'a> Deserialize<'a>,
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get_option(key)? {
            Some(value) => Ok(value),
            None => bail!(
                "config value `{key}` must be set via `--{key}` command-line option, \
                `{}` environment variable, or `{}` key in config file",
                self.env_key(key),
                toml_key(key),
            ),
        }
    }

    pub fn get_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr + for<'a> Deserialize<'a>,
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        Ok(self.get_option(key)?.unwrap_or(default))
    }

    /// A boolean switch. A switch left at its default on the command line doesn't count as set
    /// there, so the environment and config files still get a say.
    pub fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        match self.args.try_get_one::<bool>(key) {
            Err(MatchesError::UnknownArgument { .. }) | Ok(None) => {}
            Ok(Some(value)) => {
                if self.args.value_source(key) != Some(ValueSource::DefaultValue) {
                    return Ok(Some(*value));
                }
            }
            Err(err) => return Err(err).with_context(|| {
                format!("error getting matches data for command-line option `--{key}`")
            }),
        }
        if let Some(value) = self.from_env::<bool>(key)? {
            return Ok(Some(value));
        }
        self.from_files(key)
    }
}
