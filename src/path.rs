// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where desktop entry files and locally installed binaries live,
//! along with the location of Deskmend's own settings file.

use crate::config::Settings;

use std::path::{Path, PathBuf};

/// Binary directory relative to the user's home directory.
pub const BINARY_DIR: &str = ".local/bin";

/// Desktop entry directory relative to the user's home directory.
pub const ENTRY_DIR: &str = ".local/share/applications";

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to settings file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/deskmend/config.toml`. Does
/// not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_settings_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("deskmend").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Directory layout a scan operates on.
///
/// Desktop entries that point into the binary directory are the ones Deskmend
/// takes care of. Everything else is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory that programs are installed into.
    pub binary_dir: PathBuf,

    /// Directory holding `.desktop` files.
    pub entry_dir: PathBuf,
}

impl Layout {
    /// Construct new layout from explicit directories.
    pub fn new(binary_dir: impl Into<PathBuf>, entry_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary_dir: binary_dir.into(),
            entry_dir: entry_dir.into(),
        }
    }

    /// Construct default layout rooted at a home directory.
    pub fn under_home(home: impl AsRef<Path>) -> Self {
        Self::new(home.as_ref().join(BINARY_DIR), home.as_ref().join(ENTRY_DIR))
    }

    /// Resolve layout from settings, falling back to defaults under the
    /// user's home directory for anything left unset.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if a default is needed and home directory path
    ///   cannot be determined.
    pub fn resolve(settings: &Settings) -> Result<Self> {
        let layout = &settings.layout;
        let binary_dir = match &layout.binary_dir {
            Some(path) => path.clone(),
            None => home_dir()?.join(BINARY_DIR),
        };
        let entry_dir = match &layout.entry_dir {
            Some(path) => path.clone(),
            None => home_dir()?.join(ENTRY_DIR),
        };

        Ok(Self::new(binary_dir, entry_dir))
    }
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
