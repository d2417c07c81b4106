// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of Deskmend's settings file to simplify the process of
//! serialization and deserialization. File I/O is left to the caller to figure
//! out.
//!
//! # General Layout
//!
//! The settings file is entirely optional. When present it may override the
//! directories that a scan works on:
//!
//! ```toml
//! [layout]
//! binary_dir = "~/.local/bin"
//! entry_dir = "$HOME/.local/share/applications"
//! ```
//!
//! Both paths go through shell expansion, so `~` and environment variables
//! can be used freely.

use crate::path::Layout;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Settings file layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory layout overrides.
    #[serde(default)]
    pub layout: LayoutSettings,
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every configured path.
        settings.layout.binary_dir = settings.layout.binary_dir.map(expand).transpose()?;
        settings.layout.entry_dir = settings.layout.entry_dir.map(expand).transpose()?;

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

impl From<&Layout> for Settings {
    fn from(layout: &Layout) -> Self {
        Self {
            layout: LayoutSettings {
                binary_dir: Some(layout.binary_dir.clone()),
                entry_dir: Some(layout.entry_dir.clone()),
            },
        }
    }
}

/// Directory layout overrides.
///
/// Unset fields fall back to the defaults under the user's home directory.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Directory that programs are installed into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_dir: Option<PathBuf>,

    /// Directory holding `.desktop` files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_dir: Option<PathBuf>,
}

fn expand(path: PathBuf) -> Result<PathBuf> {
    let expanded = shellexpand::full(path.to_string_lossy().as_ref())
        .map_err(ConfigError::ShellExpansion)?
        .into_owned();

    Ok(PathBuf::from(expanded))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
