// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Keep desktop entries pointing at locally installed programs.
//!
//! Programs installed by hand into `~/.local/bin` usually carry their version
//! in the folder name. Every upgrade leaves the desktop entries in
//! `~/.local/share/applications` that launch them pointing at a folder that
//! no longer exists. Deskmend scans those entries, and rewrites stale `Exec`
//! and `Icon` paths to whatever version of the program is installed now.
//!
//! # See Also
//!
//! 1. [`repair`]
//! 2. [`entry`]

pub mod config;
pub mod entry;
pub mod path;
pub mod repair;
pub mod report;

pub use config::Settings;
pub use path::Layout;
pub use repair::{Outcome, Progress, Repairer, Scan};
pub use report::Report;
