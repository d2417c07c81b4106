// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Run statistics.

use crate::repair::{file_name, Outcome};

use std::{collections::BTreeSet, path::PathBuf};
use tracing::{error, info, warn};

/// Tally of desktop entry files checked during one scan.
///
/// Every key of a file contributes to at most one set, so a file whose `Exec`
/// path was fine but whose `Icon` path got repaired is both checked and
/// updated.
///
/// # Invariant
///
/// - Files skipped as invalid or malformed belong to no set.
/// - Keys after the one that stopped checking contribute nothing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    checked: BTreeSet<PathBuf>,
    updated: BTreeSet<PathBuf>,
    not_found: BTreeSet<PathBuf>,
}

impl Report {
    /// Construct new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record outcome of checking a desktop entry file.
    pub fn record(&mut self, entry_path: impl Into<PathBuf>, outcome: &Outcome) {
        let entry_path = entry_path.into();
        let Some(progress) = outcome.progress() else {
            return;
        };

        if !progress.checked.is_empty() {
            self.checked.insert(entry_path.clone());
        }
        if !progress.repairs.is_empty() {
            self.updated.insert(entry_path.clone());
        }
        if let Outcome::NotFound { .. } = outcome {
            self.not_found.insert(entry_path);
        }
    }

    /// Files whose paths were already correct.
    pub fn checked(&self) -> &BTreeSet<PathBuf> {
        &self.checked
    }

    /// Files whose stale paths were repaired.
    pub fn updated(&self) -> &BTreeSet<PathBuf> {
        &self.updated
    }

    /// Files with stale paths that could not be repaired.
    pub fn not_found(&self) -> &BTreeSet<PathBuf> {
        &self.not_found
    }

    /// File names, without directories, of files that could not be repaired.
    pub fn not_found_names(&self) -> Vec<String> {
        self.not_found.iter().map(|path| file_name(path)).collect()
    }

    /// Show a tl;dr of what happened.
    pub fn log_summary(&self) {
        error!(
            "{} .desktop files have paths that do NOT exist",
            self.not_found.len()
        );
        for name in self.not_found_names() {
            error!("    {name}");
        }
        warn!("{} .desktop files were updated", self.updated.len());
        info!(
            "{} .desktop files were already good to go",
            self.checked.len()
        );
    }
}
