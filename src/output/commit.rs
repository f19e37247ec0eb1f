//! Staged output writing with atomic promotion
//!
//! A full crawl writes into a hidden staging directory next to the final
//! output directory and promotes it in one rename at the end, so readers of
//! the output directory always see a complete previous run or a complete
//! new run. A crash mid-promotion leaves a `.bak` sibling that the next run
//! (or the next finalize) restores.
//!
//! Diff mode skips staging entirely and writes straight into the existing
//! output directory, updating it in place.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::output::layout;
use crate::output::CrawlIndex;
use crate::{DocrawlError, Result};

/// Identifier for one crawl run, used to name the staging directory
///
/// Timestamp plus pid keeps concurrent runs against the same output
/// directory from staging into each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(format!(
            "{}-{}",
            Utc::now().format("%Y%m%d-%H%M%S"),
            std::process::id()
        ))
    }

    /// A fixed identifier, for deterministic staging paths in tests
    pub fn fixed(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Writes crawl output and promotes it atomically at the end of a run
#[derive(Debug)]
pub struct OutputCommitStore {
    /// Where writes land: the staging directory, or the final directory in
    /// direct mode
    working_dir: PathBuf,

    /// The directory readers consume
    final_dir: PathBuf,

    /// Sibling holding the previous output during promotion
    backup_dir: PathBuf,

    /// Staged stores promote on finalize; direct stores write in place
    staged: bool,

    /// Whether per-page files are written at all
    emit_pages: bool,

    /// Spec filenames already taken this run
    spec_names: HashSet<String>,
}

impl OutputCommitStore {
    /// Creates a store staging into a fresh hidden sibling directory
    ///
    /// # Arguments
    ///
    /// * `final_dir` - The output directory readers consume
    /// * `run_id` - Names the staging directory
    /// * `emit_pages` - Whether `write_page` actually writes files
    pub fn staged(final_dir: &Path, run_id: &RunId, emit_pages: bool) -> Result<Self> {
        let name = dir_name(final_dir);
        let parent = final_dir.parent().map(Path::to_path_buf).unwrap_or_default();

        let working_dir = parent.join(format!(".{}.staging-{}", name, run_id));
        let backup_dir = parent.join(format!(".{}.bak", name));

        if working_dir.exists() {
            fs::remove_dir_all(&working_dir)
                .map_err(|e| commit_error("remove stale staging directory", e))?;
        }
        fs::create_dir_all(&working_dir)
            .map_err(|e| commit_error("create staging directory", e))?;

        debug!(staging = %working_dir.display(), "staging crawl output");

        Ok(Self {
            working_dir,
            final_dir: final_dir.to_path_buf(),
            backup_dir,
            staged: true,
            emit_pages,
            spec_names: HashSet::new(),
        })
    }

    /// Creates a store writing directly into the output directory
    ///
    /// Used by diff mode, which updates an existing run in place. If an
    /// earlier run crashed between promotion steps, the leftover backup is
    /// restored before any write.
    pub fn direct(final_dir: &Path, emit_pages: bool) -> Result<Self> {
        let name = dir_name(final_dir);
        let parent = final_dir.parent().map(Path::to_path_buf).unwrap_or_default();
        let backup_dir = parent.join(format!(".{}.bak", name));

        if backup_dir.exists() && !final_dir.exists() {
            info!(
                backup = %backup_dir.display(),
                "restoring output directory from interrupted promotion"
            );
            fs::rename(&backup_dir, final_dir)
                .map_err(|e| commit_error("restore backup directory", e))?;
        }

        fs::create_dir_all(final_dir)
            .map_err(|e| commit_error("create output directory", e))?;

        Ok(Self {
            working_dir: final_dir.to_path_buf(),
            final_dir: final_dir.to_path_buf(),
            backup_dir,
            staged: false,
            emit_pages,
            spec_names: HashSet::new(),
        })
    }

    /// Directory writes currently land in
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Directory readers consume once the run is finalized
    pub fn final_dir(&self) -> &Path {
        &self.final_dir
    }

    /// Writes one page body at the given relative path
    ///
    /// A no-op when per-page output is disabled; the caller still records
    /// the path so index entries stay stable across output configurations.
    pub fn write_page(&self, relative_path: &str, body: &str) -> Result<()> {
        if !self.emit_pages {
            return Ok(());
        }
        self.write_relative(relative_path, format!("{}\n", body).as_bytes())
    }

    /// Writes a spec resource body; returns the relative path used
    ///
    /// Filenames come from the resource URL; a second resource with the
    /// same filename gets a numeric suffix.
    pub fn write_spec(&mut self, url: &Url, body: &str) -> Result<String> {
        let filename = self.unique_spec_name(layout::spec_filename(url));
        let relative = format!("specs/{}", filename);
        self.write_relative(&relative, body.as_bytes())?;
        Ok(relative)
    }

    /// Serializes and writes `index.json`
    pub fn write_index(&self, index: &CrawlIndex) -> Result<()> {
        let json = index.to_json()?;
        self.write_relative("index.json", format!("{}\n", json).as_bytes())
    }

    /// Writes the merged `full.md` document
    pub fn write_merged(&self, merged: &str) -> Result<()> {
        self.write_relative("full.md", format!("{}\n", merged).as_bytes())
    }

    /// Writes `chunks/chunk-NNN.md` files and removes stale ones
    ///
    /// Stale removal matters in direct mode, where a previous run may have
    /// produced more chunks than this one.
    pub fn write_chunks(&self, chunks: &[String]) -> Result<()> {
        for (i, chunk) in chunks.iter().enumerate() {
            let relative = layout::chunk_relative_path(i + 1);
            self.write_relative(&relative, format!("{}\n", chunk).as_bytes())?;
        }

        self.remove_stale_chunks(chunks.len())?;
        Ok(())
    }

    /// Promotes the staging directory to the final path
    ///
    /// Steps, each leaving the final path with a complete run except for
    /// the promotion rename itself:
    ///
    /// 1. A leftover backup with no final directory means an earlier crash
    ///    mid-promotion: rename the backup back first.
    /// 2. Move the current final directory aside as the backup (dropping
    ///    any stale backup).
    /// 3. Rename staging to final. On failure the backup is restored
    ///    best-effort and the error propagates.
    /// 4. Remove the backup; failure here is logged, not fatal.
    ///
    /// Direct stores skip all of this: their writes already landed.
    pub fn finalize(&mut self) -> Result<()> {
        if !self.staged {
            return Ok(());
        }

        if self.backup_dir.exists() && !self.final_dir.exists() {
            info!(
                backup = %self.backup_dir.display(),
                "restoring output directory from interrupted promotion"
            );
            fs::rename(&self.backup_dir, &self.final_dir)
                .map_err(|e| commit_error("restore backup directory", e))?;
        }

        if self.final_dir.exists() {
            if self.backup_dir.exists() {
                fs::remove_dir_all(&self.backup_dir)
                    .map_err(|e| commit_error("remove stale backup directory", e))?;
            }
            fs::rename(&self.final_dir, &self.backup_dir)
                .map_err(|e| commit_error("move previous output aside", e))?;
        }

        if let Err(e) = fs::rename(&self.working_dir, &self.final_dir) {
            if self.backup_dir.exists() {
                if let Err(restore) = fs::rename(&self.backup_dir, &self.final_dir) {
                    warn!(
                        error = %restore,
                        "could not restore previous output after failed promotion"
                    );
                }
            }
            return Err(commit_error("promote staging directory", e));
        }

        if self.backup_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.backup_dir) {
                warn!(error = %e, backup = %self.backup_dir.display(), "could not remove backup directory");
            }
        }

        info!(output = %self.final_dir.display(), "output committed");
        Ok(())
    }

    /// Discards the staging directory after a failed run
    ///
    /// Direct stores leave their directory as-is.
    pub fn cleanup(&self) {
        if self.staged && self.working_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.working_dir) {
                warn!(error = %e, staging = %self.working_dir.display(), "could not remove staging directory");
            }
        }
    }

    fn write_relative(&self, relative_path: &str, bytes: &[u8]) -> Result<()> {
        let path = self.working_dir.join(relative_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| commit_error("create output subdirectory", e))?;
        }

        fs::write(&path, bytes).map_err(|e| commit_error("write output file", e))
    }

    fn unique_spec_name(&mut self, base: String) -> String {
        if self.spec_names.insert(base.clone()) {
            return base;
        }

        let path = Path::new(&base);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("spec")
            .to_string();
        let extension = path.extension().and_then(|s| s.to_str());

        for n in 2.. {
            let candidate = match extension {
                Some(ext) => format!("{}-{}.{}", stem, n, ext),
                None => format!("{}-{}", stem, n),
            };
            if self.spec_names.insert(candidate.clone()) {
                return candidate;
            }
        }

        base
    }

    fn remove_stale_chunks(&self, keep: usize) -> Result<()> {
        let chunks_dir = self.working_dir.join("chunks");
        let entries = match fs::read_dir(&chunks_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(ordinal) = layout::parse_chunk_ordinal(name) {
                if ordinal > keep {
                    fs::remove_file(entry.path())
                        .map_err(|e| commit_error("remove stale chunk file", e))?;
                }
            }
        }

        Ok(())
    }
}

/// Name component of the output directory, for staging/backup siblings
fn dir_name(final_dir: &Path) -> String {
    final_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "out".to_string())
}

fn commit_error(message: &str, source: std::io::Error) -> DocrawlError {
    DocrawlError::Commit {
        message: message.to_string(),
        source,
    }
}
