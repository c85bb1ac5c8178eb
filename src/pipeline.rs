//! Ingestion pipeline orchestration.
//!
//! Coordinates one ingest: validation and asset check → fetch → extract →
//! render prompt → generate code → materialize workspace → launch editor →
//! persist catalog entry. Stages run strictly in sequence; the first failure
//! aborts the run and is returned unchanged. Launching is the one best-effort
//! stage: its failure is logged and the entry is still persisted.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use dsakit::catalog::SqliteCatalog;
//! # use dsakit::config::Config;
//! # use dsakit::pipeline::Pipeline;
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::minimal();
//! let catalog = SqliteCatalog::open(&config.db.path).await?;
//! let pipeline = Pipeline::from_config(&config, Arc::new(catalog), "api-key".to_string())?;
//! let entry = pipeline.ingest("https://leetcode.com/problems/two-sum/", "").await?;
//! println!("{}", entry.workspace_path);
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::codegen::CodeGenClient;
use crate::config::Config;
use crate::error::IngestError;
use crate::extract::ExtractorRegistry;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::launcher::{EditorLauncher, Launcher};
use crate::models::CatalogEntry;
use crate::progress::{NoProgress, ProgressEvent, ProgressReporter, Stage};
use crate::prompt;
use crate::workspace::WorkspaceMaterializer;

/// Shortest API key accepted by the validation gate.
const MIN_API_KEY_LEN: usize = 3;

pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    extractors: ExtractorRegistry,
    prompt_template: PathBuf,
    codegen: CodeGenClient,
    workspace: Arc<WorkspaceMaterializer>,
    launcher: Option<Arc<dyn Launcher>>,
    catalog: Arc<dyn CatalogStore>,
    reporter: Arc<dyn ProgressReporter>,
    allowed_prefixes: Vec<String>,
    require_problem_data: bool,
    api_key: String,
}

impl Pipeline {
    /// Build a pipeline with the production stages described by `config`.
    pub fn from_config(
        config: &Config,
        catalog: Arc<dyn CatalogStore>,
        api_key: String,
    ) -> Result<Self, IngestError> {
        let launcher: Option<Arc<dyn Launcher>> = if config.pipeline.launch_editor {
            Some(Arc::new(EditorLauncher::new(&config.editor)))
        } else {
            None
        };

        Ok(Self {
            fetcher: Arc::new(HttpFetcher::new(&config.fetch)?),
            extractors: ExtractorRegistry::with_builtins(),
            prompt_template: config.prompt.template.clone(),
            codegen: CodeGenClient::new(&config.codegen)?,
            workspace: Arc::new(WorkspaceMaterializer::new(&config.workspace)),
            launcher,
            catalog,
            reporter: Arc::new(NoProgress),
            allowed_prefixes: config.pipeline.allowed_prefixes.clone(),
            require_problem_data: config.pipeline.require_problem_data,
            api_key,
        })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_launcher(mut self, launcher: Option<Arc<dyn Launcher>>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    /// Fail with `ResourceMissing` unless the prompt template and template
    /// archive are both present. Runs before any network I/O in `ingest`;
    /// long-running hosts also call it at startup.
    pub fn check_assets(&self) -> Result<(), IngestError> {
        if !self.prompt_template.is_file() {
            return Err(IngestError::ResourceMissing(format!(
                "prompt template not found: {}",
                self.prompt_template.display()
            )));
        }
        self.workspace.check_template()
    }

    /// Run every stage for `url` and return the persisted catalog entry.
    pub async fn ingest(&self, url: &str, pseudo_code: &str) -> Result<CatalogEntry, IngestError> {
        let mut stage = Stage::Idle;
        let result = self.run(url, pseudo_code, &mut stage).await;

        match &result {
            Ok(entry) => self.reporter.report(ProgressEvent::Finished {
                url: url.to_string(),
                workspace: entry.workspace_path.clone(),
            }),
            Err(err) => {
                warn!(%url, stage = %stage, code = err.code(), error = %err, "ingest failed");
                self.reporter.report(ProgressEvent::Failed {
                    url: url.to_string(),
                    stage,
                    code: err.code(),
                    message: err.to_string(),
                });
            }
        }

        result
    }

    async fn run(
        &self,
        url: &str,
        pseudo_code: &str,
        stage: &mut Stage,
    ) -> Result<CatalogEntry, IngestError> {
        validate_request(url, &self.api_key, &self.allowed_prefixes)?;
        self.check_assets()?;

        self.enter(url, stage, Stage::Fetching);
        let html = self.fetcher.fetch(url).await?;

        self.enter(url, stage, Stage::Extracting);
        let extraction = self.extractors.extract(url, &html);
        if !extraction.is_found() {
            if self.require_problem_data {
                return Err(IngestError::ProblemNotFound(url.to_string()));
            }
            warn!(%url, source = %extraction.source(), "no problem data found, continuing with empty metadata");
        }
        let problem = extraction.into_info();
        info!(source = %problem.source, id = %problem.id, title = %problem.title, "problem extracted");

        self.enter(url, stage, Stage::Rendering);
        let rendered = prompt::render_from_file(&self.prompt_template, &problem, pseudo_code)?;

        self.enter(url, stage, Stage::Generating);
        let code = self.codegen.generate(&rendered, &self.api_key).await?;
        if code.is_empty() {
            warn!(%url, "generation returned no text");
        }

        self.enter(url, stage, Stage::Materializing);
        let workspace = Arc::clone(&self.workspace);
        let target_problem = problem.clone();
        let dir = tokio::task::spawn_blocking(move || workspace.materialize(&target_problem, &code))
            .await
            .map_err(|e| IngestError::Workspace(format!("materialize task failed: {}", e)))??;

        if let Some(launcher) = &self.launcher {
            self.enter(url, stage, Stage::Launching);
            if let Err(err) = launcher.launch(&dir) {
                warn!(workspace = %dir.display(), error = %err, "editor launch failed");
            }
        }

        self.enter(url, stage, Stage::Persisting);
        let entry = CatalogEntry {
            id: problem.id,
            title: problem.title,
            url: url.to_string(),
            workspace_path: dir.to_string_lossy().into_owned(),
            timestamp: Utc::now(),
        };
        self.catalog.save_or_update(&entry).await?;

        *stage = Stage::Done;
        info!(%url, workspace = %entry.workspace_path, "ingest complete");
        Ok(entry)
    }

    fn enter(&self, url: &str, current: &mut Stage, next: Stage) {
        *current = next;
        info!(%url, stage = %next, "stage");
        self.reporter.report(ProgressEvent::Entered {
            url: url.to_string(),
            stage: next,
        });
    }
}

/// Reject a request before any I/O: the URL must be an allowed prefix
/// followed by a non-empty slug, and the API key must look configured.
pub fn validate_request(
    url: &str,
    api_key: &str,
    allowed_prefixes: &[String],
) -> Result<(), IngestError> {
    if api_key.trim().len() < MIN_API_KEY_LEN {
        return Err(IngestError::Validation(
            "generation API key is not configured".to_string(),
        ));
    }

    if !allowed_prefixes
        .iter()
        .any(|prefix| has_slug_after(url, prefix))
    {
        return Err(IngestError::Validation(format!(
            "unsupported URL '{}': expected one of {}",
            url,
            allowed_prefixes.join(", ")
        )));
    }

    Ok(())
}

/// `url` starts with `prefix` and the next path segment is not empty.
fn has_slug_after(url: &str, prefix: &str) -> bool {
    match url.strip_prefix(prefix) {
        Some(rest) => rest
            .trim_start_matches('/')
            .split(['/', '?', '#'])
            .next()
            .is_some_and(|slug| !slug.is_empty()),
        None => false,
    }
}
