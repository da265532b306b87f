//! # Pipeline Driver
//!
//! Runs one crawl from start to finish:
//!
//! `Idle → Fetching → Converting → Persisting → CleaningUp → Done | Failed`
//!
//! Fetching delegates to a [`SiteFetcher`]. Converting reads every page the
//! fetcher left in the workspace and runs it through the processor, one page
//! at a time in path order. Persisting writes the artifacts under the output
//! directory. The workspace is removed on every exit path.
//!
//! Only configuration and fetch failures end a run early. A page that has no
//! content match, cannot be read, converted or written is logged, recorded in
//! the [`RunReport`], and the run moves on.
//!
//! [`Converter`] holds the converting and persisting half on its own, for
//! directories of pages that were fetched earlier.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ConfigError, RunConfig};
use crate::crawler::{FetchReport, FetchRequest, SiteFetcher, Storage, UrlFilter};
use crate::error::Result;
use crate::processor::{
    ConversionConfig, Document, MarkdownArtifact, MarkdownConverter, ProcessError,
    process_document,
};

const WORKSPACE_PREFIX: &str = "site2md-";

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Fetching,
    Converting,
    Persisting,
    CleaningUp,
    Done,
    Failed,
}

/// A page that produced no artifact because nothing matched the selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    pub path: PathBuf,
    pub url: String,
    pub reason: String,
}

/// A page whose processing or writing failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPage {
    pub path: PathBuf,
    pub error: String,
}

/// Summary of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub state: RunState,

    /// Pages the fetcher wrote
    pub fetched: usize,

    /// Discovered links the filter rejected
    pub links_rejected: usize,

    /// Artifacts written, relative to the output directory
    pub converted: Vec<PathBuf>,

    pub skipped: Vec<SkippedPage>,

    pub failed: Vec<FailedPage>,
}

/// Directory holding raw pages for the duration of a run.
///
/// Always a fresh directory created for the run, so removing it never
/// touches anything else.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// A fresh directory under the system temp dir
    pub fn temporary() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()?;
        Ok(Self { dir })
    }

    /// A fresh directory inside `parent`, which is created if missing
    pub fn within(parent: impl AsRef<Path>) -> std::io::Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Converts a directory of fetched pages into the output tree
pub struct Converter {
    conversion: ConversionConfig,
    output_dir: PathBuf,
    storage: Storage,
    progress: ProgressBar,
}

impl Converter {
    pub fn new(conversion: ConversionConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            conversion,
            output_dir: output_dir.into(),
            storage: Storage::new(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report conversion progress on this bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Convert a directory of already fetched pages into the output tree.
    ///
    /// The directory is left in place.
    #[instrument(skip(self))]
    pub async fn convert_workspace(&self, dir: &Path) -> Result<RunReport> {
        let (mut report, artifacts) = self.convert_pages(dir, None).await?;
        self.persist_all(artifacts, &mut report).await?;
        report.state = RunState::Done;
        Ok(report)
    }

    async fn convert_pages(
        &self,
        dir: &Path,
        fetch: Option<&FetchReport>,
    ) -> Result<(RunReport, Vec<MarkdownArtifact>)> {
        let converter = MarkdownConverter::new(&self.conversion)?;
        let pages = self
            .storage
            .list_files(dir, self.storage.page_extension())
            .await?;

        let mut report = RunReport {
            fetched: fetch.map_or(pages.len(), |f| f.pages.len()),
            links_rejected: fetch.map_or(0, |f| f.rejected),
            ..Default::default()
        };

        info!("Converting {} pages", pages.len());
        self.progress.set_length(pages.len() as u64);

        let mut artifacts = Vec::with_capacity(pages.len());
        for path in pages {
            let url = fetch
                .and_then(|f| f.url_for_path(&path))
                .map(str::to_string)
                .unwrap_or_else(|| path.display().to_string());
            self.progress.set_message(url.clone());

            match self.convert_page(dir, &path, &url, &converter).await {
                Ok(text) => artifacts.push(MarkdownArtifact {
                    relative_path: self.storage.markdown_path_for(&path),
                    text,
                }),
                Err(e @ ProcessError::NoContentMatch { .. }) => {
                    warn!("Skipping {} ({}): {}", path.display(), url, e);
                    report.skipped.push(SkippedPage {
                        path,
                        url,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!("Failed to convert {} ({}): {}", path.display(), url, e);
                    report.failed.push(FailedPage {
                        path,
                        error: e.to_string(),
                    });
                }
            }
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        Ok((report, artifacts))
    }

    async fn persist_all(
        &self,
        artifacts: Vec<MarkdownArtifact>,
        report: &mut RunReport,
    ) -> Result<()> {
        self.storage.create_dir_all(&self.output_dir).await?;
        for artifact in artifacts {
            match self.persist(&artifact).await {
                Ok(()) => report.converted.push(artifact.relative_path),
                Err(e) => {
                    error!("{}", e);
                    report.failed.push(FailedPage {
                        path: artifact.relative_path,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    #[instrument(skip(self, dir, path, converter), fields(path = %path.display()))]
    async fn convert_page(
        &self,
        dir: &Path,
        path: &Path,
        url: &str,
        converter: &MarkdownConverter,
    ) -> std::result::Result<String, ProcessError> {
        let read_error = |reason: String| ProcessError::Read {
            path: path.to_path_buf(),
            reason,
        };

        let full_path = self
            .storage
            .resolve(dir, path)
            .map_err(|e| read_error(e.to_string()))?;
        let html = self
            .storage
            .read_text(&full_path)
            .await
            .map_err(|e| read_error(e.to_string()))?;

        let document = Document {
            url: url.to_string(),
            path: path.to_path_buf(),
            html,
        };
        process_document(&document, &self.conversion, converter)
    }

    async fn persist(&self, artifact: &MarkdownArtifact) -> std::result::Result<(), ProcessError> {
        let write_error = |reason: String| ProcessError::Write {
            path: artifact.relative_path.clone(),
            reason,
        };

        let target = self
            .storage
            .resolve(&self.output_dir, &artifact.relative_path)
            .map_err(|e| write_error(e.to_string()))?;
        self.storage
            .write_text(&target, &artifact.text)
            .await
            .map_err(|e| write_error(e.to_string()))?;

        debug!("Wrote {}", target.display());
        Ok(())
    }
}

/// Drives a run over a fetcher
pub struct Pipeline<F> {
    config: RunConfig,
    fetcher: F,
    converter: Converter,
    storage: Storage,
    state: RunState,
}

impl<F: SiteFetcher> Pipeline<F> {
    pub fn new(config: RunConfig, fetcher: F) -> Self {
        let converter = Converter::new(config.conversion.clone(), config.output_dir.clone());
        Self {
            config,
            fetcher,
            converter,
            storage: Storage::new(),
            state: RunState::Idle,
        }
    }

    /// Report conversion progress on this bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.converter = self.converter.with_progress(progress);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Fetch, convert and persist, then remove the workspace.
    ///
    /// The workspace is removed whether or not the run succeeds.
    #[instrument(skip_all, fields(start = %self.config.target))]
    pub async fn run(&mut self, workspace: Workspace) -> Result<RunReport> {
        let result = self.fetch_and_convert(workspace.path()).await;

        self.transition(RunState::CleaningUp);
        match self.storage.remove_dir_all(workspace.path()).await {
            Ok(_) => debug!("Workspace {} removed", workspace.path().display()),
            Err(e) => error!("Failed to remove workspace: {}", e),
        }
        drop(workspace);

        match result {
            Ok(mut report) => {
                self.transition(RunState::Done);
                report.state = RunState::Done;
                info!(
                    "Converted {} pages ({} skipped, {} failed)",
                    report.converted.len(),
                    report.skipped.len(),
                    report.failed.len()
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(RunState::Failed);
                error!("Run failed: {}", e);
                Err(e)
            }
        }
    }

    async fn fetch_and_convert(&mut self, workspace: &Path) -> Result<RunReport> {
        ensure_outside(&self.config.output_dir, workspace)?;

        self.transition(RunState::Fetching);
        self.storage.create_dir_all(workspace).await?;

        let filter = UrlFilter::new(
            self.config.base_domain(),
            self.config.crawler.filter_rule.clone(),
        );
        let fetch = self
            .fetcher
            .fetch(FetchRequest {
                start: &self.config.target,
                filter: &filter,
                max_depth: self.config.crawler.max_depth,
                max_pages: self.config.crawler.max_pages,
                delay: self.config.crawler.delay(),
                workspace,
            })
            .await?;

        self.transition(RunState::Converting);
        let (mut report, artifacts) = self.converter.convert_pages(workspace, Some(&fetch)).await?;

        self.transition(RunState::Persisting);
        self.converter.persist_all(artifacts, &mut report).await?;

        Ok(report)
    }
}

/// Refuse an output directory that cleanup would take with it
fn ensure_outside(output_dir: &Path, workspace: &Path) -> std::result::Result<(), ConfigError> {
    let output = std::path::absolute(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
    let workspace = std::path::absolute(workspace).unwrap_or_else(|_| workspace.to_path_buf());

    if output.starts_with(&workspace) {
        return Err(ConfigError::OutputInsideWorkspace { output, workspace });
    }
    Ok(())
}
