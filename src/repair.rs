// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Stale desktop entry repair.
//!
//! Programs installed by hand into the binary directory tend to live in
//! versioned folders, e.g., `~/.local/bin/app-1.2.3/app`. Installing a newer
//! release replaces that folder with `~/.local/bin/app-1.3.0/`, leaving every
//! desktop entry that pointed into the old folder broken.
//!
//! # Repair Heuristic
//!
//! For each of the `Exec` and `Icon` keys of a desktop entry, the referenced
//! path is checked for existence. A broken path that points into the binary
//! directory has its __stale segment__ extracted, i.e., the path component
//! directly after the binary directory. Stripping trailing digits and dots
//! from the stale segment yields the __program stem__. The first entry of
//! the binary directory containing the program stem replaces the stale
//! segment, and the rest of the value is left untouched.
//!
//! Broken paths outside of the binary directory are none of Deskmend's
//! business. Entries like that are skipped without further inspection.
//!
//! # Pitfalls
//!
//! The binary directory is searched in whatever order the file system lists
//! it. If more than one entry contains the program stem, the first one wins
//! and a warning names the rest. Keep only one version of a program installed
//! to avoid surprises.

use crate::{
    entry::{EntryFile, Malformed, Parsed, DESKTOP_ENTRY},
    path::Layout,
    report::Report,
};

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, instrument, warn};

/// Keys every managed desktop entry must have, in checking order.
pub const REQUIRED_KEYS: [&str; 2] = ["Exec", "Icon"];

/// Strip trailing version suffix made of ASCII digits and dots.
///
/// ```text
/// "app-2.10.3" -> "app-"
/// "v10"        -> "v"
/// "tool"       -> "tool"
/// "1.2.3"      -> ""
/// ```
pub fn program_stem(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.')
}

/// Path a key's value refers to on disk.
///
/// `Exec` holds a command line, so only its first token is the path. A
/// double-quoted first token is taken as-is without the quotes. Any other key
/// is treated as a path in full.
pub fn referenced_path<'a>(key: &str, value: &'a str) -> &'a str {
    if key != "Exec" {
        return value;
    }

    let value = value.trim_start();
    if let Some(quoted) = value.strip_prefix('"') {
        return quoted.split('"').next().unwrap_or_default();
    }

    value.split_whitespace().next().unwrap_or_default()
}

/// Locate path component directly following the binary directory in a value.
///
/// Returns the byte offset of the stale segment within `value` together with
/// the segment itself. Returns `None` if the value never refers to anything
/// inside of the binary directory.
pub fn stale_segment<'a>(value: &'a str, binary_dir: &str) -> Option<(usize, &'a str)> {
    let prefix = format!("{}/", binary_dir.trim_end_matches('/'));
    let start = value.find(&prefix)? + prefix.len();
    let rest = &value[start..];
    let end = rest
        .find(|c: char| c == '/' || c == '"' || c.is_whitespace())
        .unwrap_or(rest.len());

    Some((start, &rest[..end]))
}

/// Keys handled before checking a desktop entry file came to an end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Keys whose paths already existed.
    pub checked: Vec<String>,

    /// Keys whose stale paths were repaired and written back.
    pub repairs: Vec<Repair>,
}

/// Classification of a single desktop entry file after checking it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every required key was either valid or repaired.
    Done(Progress),

    /// A stale path points into the binary directory, but no replacement
    /// could be located. Keys before it keep their progress.
    NotFound {
        key: String,
        segment: String,
        progress: Progress,
    },

    /// A stale path points outside of the binary directory. Keys before it
    /// keep their progress.
    Foreign { key: String, progress: Progress },

    /// Lacks the desktop entry group or a required key.
    Invalid,

    /// Not a group-based key-value file.
    Malformed(Malformed),
}

impl Outcome {
    /// Keys handled before checking came to an end, if any were looked at.
    pub fn progress(&self) -> Option<&Progress> {
        match self {
            Self::Done(progress)
            | Self::NotFound { progress, .. }
            | Self::Foreign { progress, .. } => Some(progress),
            Self::Invalid | Self::Malformed(_) => None,
        }
    }
}

/// A single value rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    /// Key whose value was rewritten.
    pub key: String,

    /// Stale value.
    pub from: String,

    /// Repaired value.
    pub to: String,
}

/// Result of scanning the entry directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// Binary directory was missing, so nothing could be repaired.
    MissingBinaryDir,

    /// Every desktop entry file was checked.
    Finished(Report),
}

/// List entries of the binary directory.
///
/// Order of the returned names is the order in which replacements are
/// considered.
pub trait BinaryListing {
    /// List names of every entry in the binary directory.
    fn list(&self, binary_dir: &Path) -> std::io::Result<Vec<String>>;
}

/// Binary listing straight from the file system.
///
/// Names that are not valid UTF-8 cannot hold a program stem, and are
/// skipped.
#[derive(Debug, Default, Clone)]
pub struct ReadDirListing;

impl BinaryListing for ReadDirListing {
    fn list(&self, binary_dir: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(binary_dir)? {
            if let Ok(name) = entry?.file_name().into_string() {
                names.push(name);
            }
        }

        Ok(names)
    }
}

/// Desktop entry repairer.
///
/// Checks desktop entries in the entry directory of a [`Layout`], and repairs
/// stale paths that point into its binary directory.
#[derive(Debug, Clone)]
pub struct Repairer<L = ReadDirListing>
where
    L: BinaryListing,
{
    layout: Layout,
    listing: L,
    dry_run: bool,
}

impl Repairer<ReadDirListing> {
    /// Construct new repairer that lists the binary directory from the file
    /// system.
    pub fn new(layout: Layout) -> Self {
        Self::with_listing(layout, ReadDirListing)
    }
}

impl<L> Repairer<L>
where
    L: BinaryListing,
{
    /// Construct new repairer with custom binary listing.
    pub fn with_listing(layout: Layout, listing: L) -> Self {
        Self {
            layout,
            listing,
            dry_run: false,
        }
    }

    /// Only report what would be repaired, without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run full check and show summary.
    ///
    /// # Errors
    ///
    /// - Return [`Error`] for the same reasons as [`Repairer::scan`].
    pub fn run_check(&self) -> Result<Scan> {
        info!("Running .desktop check");
        let scan = self.scan()?;
        if let Scan::Finished(report) = &scan {
            report.log_summary();
        }
        info!("Finished .desktop check");

        Ok(scan)
    }

    /// Check every `.desktop` file in the entry directory.
    ///
    /// A missing binary directory gets created, and ends the scan early
    /// because there is nothing to repair stale paths with.
    ///
    /// # Errors
    ///
    /// - Return [`Error::CreateBinaryDir`] if binary directory cannot be
    ///   created.
    /// - Return [`Error::ReadEntryDir`] if entry directory cannot be listed.
    /// - Return [`Error`] for the same reasons as [`Repairer::check_entry`].
    #[instrument(skip(self), level = "debug")]
    pub fn scan(&self) -> Result<Scan> {
        let binary_dir = &self.layout.binary_dir;
        if !binary_dir.exists() {
            if !self.dry_run {
                mkdirp::mkdirp(binary_dir).map_err(|err| Error::CreateBinaryDir {
                    source: err,
                    binary_dir: binary_dir.clone(),
                })?;
            }
            error!(
                "Download and install programs in {} first",
                binary_dir.display()
            );
            return Ok(Scan::MissingBinaryDir);
        }

        let mut report = Report::default();
        for entry_path in self.entry_paths()? {
            let outcome = self.check_entry(&entry_path)?;
            report.record(entry_path, &outcome);
        }

        Ok(Scan::Finished(report))
    }

    /// Check a single desktop entry file, repairing it in place if needed.
    ///
    /// Each repaired key is written back right away, so repairs made before
    /// checking stops on a later key stay on disk.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadEntry`] if entry file cannot be read.
    /// - Return [`Error::ListBinaryDir`] if binary directory cannot be listed.
    /// - Return [`Error::WriteEntry`] if repaired entry file cannot be
    ///   written.
    #[instrument(skip(self, entry_path), level = "debug")]
    pub fn check_entry(&self, entry_path: impl AsRef<Path>) -> Result<Outcome> {
        let entry_path = entry_path.as_ref();
        info!("Checking: {}", file_name(entry_path));

        let bytes = fs::read(entry_path).map_err(|err| Error::ReadEntry {
            source: err,
            entry_path: entry_path.into(),
        })?;
        let Ok(content) = String::from_utf8(bytes) else {
            debug!("skip malformed file {:?}: not valid UTF-8", entry_path.display());
            return Ok(Outcome::Malformed(Malformed::InvalidUtf8));
        };

        let mut file = match EntryFile::parse(&content, &REQUIRED_KEYS) {
            Parsed::Valid(file) => file,
            Parsed::Malformed(reason) => {
                debug!("skip malformed file {:?}: {reason}", entry_path.display());
                return Ok(Outcome::Malformed(reason));
            }
            Parsed::NotDesktopEntry => {
                warn!("Not a valid .desktop file");
                return Ok(Outcome::Invalid);
            }
        };

        let binary_dir = self.layout.binary_dir.to_string_lossy().into_owned();
        let mut progress = Progress::default();
        for key in REQUIRED_KEYS {
            let Some(value) = file.get(DESKTOP_ENTRY, key).map(str::to_owned) else {
                return Ok(Outcome::Invalid);
            };

            if Path::new(referenced_path(key, &value)).exists() {
                info!("{key} check");
                progress.checked.push(key.into());
                continue;
            }

            let Some((offset, segment)) = stale_segment(&value, &binary_dir) else {
                warn!("Not a managed .desktop file");
                return Ok(Outcome::Foreign {
                    key: key.into(),
                    progress,
                });
            };

            let Some(replacement) = self.find_replacement(segment)? else {
                error!("Program not found");
                return Ok(Outcome::NotFound {
                    key: key.into(),
                    segment: segment.into(),
                    progress,
                });
            };

            let mut repaired = value.clone();
            repaired.replace_range(offset..offset + segment.len(), &replacement);
            file.set(DESKTOP_ENTRY, key, repaired.as_str());
            if self.dry_run {
                info!("{key} would be updated: {segment} -> {replacement}");
            } else {
                self.persist(entry_path, &file)?;
                info!("{key} updated");
            }

            progress.repairs.push(Repair {
                key: key.into(),
                from: value,
                to: repaired,
            });
        }

        info!("Done");
        Ok(Outcome::Done(progress))
    }

    /// Overwrite entry file with edited content, if anything was edited.
    fn persist(&self, entry_path: &Path, file: &EntryFile) -> Result<()> {
        if !file.is_changed() {
            return Ok(());
        }

        fs::write(entry_path, file.to_string()).map_err(|err| Error::WriteEntry {
            source: err,
            entry_path: entry_path.into(),
        })
    }

    /// Find binary directory entry replacing a stale segment.
    ///
    /// The first entry containing the program stem wins. An empty program
    /// stem is contained in every name, so it picks the first entry listed.
    fn find_replacement(&self, segment: &str) -> Result<Option<String>> {
        let stem = program_stem(segment);
        let names = self
            .listing
            .list(&self.layout.binary_dir)
            .map_err(|err| Error::ListBinaryDir {
                source: err,
                binary_dir: self.layout.binary_dir.clone(),
            })?;

        let mut candidates = names.into_iter().filter(|name| name.contains(stem));
        let Some(first) = candidates.next() else {
            return Ok(None);
        };

        let others = candidates.collect::<Vec<_>>();
        if !others.is_empty() {
            warn!("{stem:?} also matches {others:?}, picking {first:?}");
        }

        Ok(Some(first))
    }

    /// Sorted paths of every `.desktop` file in the entry directory.
    fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        let entry_dir = &self.layout.entry_dir;
        let read_dir_err = |err: std::io::Error| Error::ReadEntryDir {
            source: err,
            entry_dir: entry_dir.clone(),
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(entry_dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            let is_desktop = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(".desktop"));
            if is_desktop && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Desktop entry repair error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binary directory cannot be created when missing.
    #[error("failed to create binary directory at {:?}", binary_dir.display())]
    CreateBinaryDir {
        #[source]
        source: std::io::Error,
        binary_dir: PathBuf,
    },

    /// Binary directory cannot be listed.
    #[error("failed to list binary directory at {:?}", binary_dir.display())]
    ListBinaryDir {
        #[source]
        source: std::io::Error,
        binary_dir: PathBuf,
    },

    /// Entry directory cannot be listed.
    #[error("failed to list entry directory at {:?}", entry_dir.display())]
    ReadEntryDir {
        #[source]
        source: std::io::Error,
        entry_dir: PathBuf,
    },

    /// Desktop entry file cannot be read from.
    #[error("failed to read desktop entry at {:?}", entry_path.display())]
    ReadEntry {
        #[source]
        source: std::io::Error,
        entry_path: PathBuf,
    },

    /// Desktop entry file cannot be written to.
    #[error("failed to write desktop entry at {:?}", entry_path.display())]
    WriteEntry {
        #[source]
        source: std::io::Error,
        entry_path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
