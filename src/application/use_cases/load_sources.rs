use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::domain::{DomainError, Language, SourceDocument};

/// Maximum number of files read concurrently.
const READ_CONCURRENCY: usize = 16;

/// Collects source files under a directory into documents.
///
/// Hidden files and anything ignored by `.gitignore` are skipped. Files that
/// cannot be read or are not UTF-8 are logged and left out.
pub struct SourceLoader {
    extensions: BTreeSet<String>,
}

impl SourceLoader {
    /// Accepts every extension a supported [`Language`] claims.
    pub fn new() -> Self {
        Self::with_extensions(
            Language::ALL
                .iter()
                .flat_map(|lang| lang.extensions().iter().copied()),
        )
    }

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// Loads `root` (a directory, or a single file), returning documents sorted by path.
    /// Document paths are relative to `root`.
    pub async fn load(&self, root: &Path) -> Result<Vec<SourceDocument>, DomainError> {
        if !root.exists() {
            return Err(DomainError::invalid_input(format!(
                "Path does not exist: {}",
                root.display()
            )));
        }

        let files = self.collect_files(root);
        let total_files = files.len() as u64;
        info!("Found {} source files under {}", total_files, root.display());

        let progress_bar = ProgressBar::new(total_files);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let base = if root.is_file() {
            root.parent().unwrap_or(root).to_path_buf()
        } else {
            root.to_path_buf()
        };

        let mut documents: Vec<SourceDocument> = stream::iter(files)
            .map(|path| {
                let base = base.clone();
                let progress_bar = progress_bar.clone();
                async move {
                    let result = read_document(&base, &path).await;
                    progress_bar.inc(1);
                    match result {
                        Ok(document) => Some(document),
                        Err(e) => {
                            warn!("Skipping {}: {}", path.display(), e);
                            None
                        }
                    }
                }
            })
            .buffer_unordered(READ_CONCURRENCY)
            .filter_map(|doc| async { doc })
            .collect()
            .await;

        progress_bar.finish_and_clear();

        documents.sort_by(|a, b| a.file().cmp(b.file()));
        info!(
            "Loaded {} of {} source files",
            documents.len(),
            total_files
        );
        Ok(documents)
    }

    fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        if root.is_file() {
            return if self.accepts(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            };
        }

        WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Error walking directory: {}", e);
                    None
                }
            })
            .filter(|entry| entry.path().is_file() && self.accepts(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_document(base: &Path, path: &Path) -> Result<SourceDocument, DomainError> {
    let relative_path = path
        .strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DomainError::unreadable(format!("{}: {}", relative_path, e)))?;
    let content = String::from_utf8(bytes)
        .map_err(|_| DomainError::unreadable(format!("{}: not valid UTF-8", relative_path)))?;

    debug!("Read {} ({} bytes)", relative_path, content.len());
    Ok(SourceDocument::new(relative_path, content))
}
