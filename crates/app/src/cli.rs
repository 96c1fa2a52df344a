//! Command-line surface.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use harmatch_application::{
    AppState, AppStore, ExecuteRequest, ExecuteRequestInput, GenerateMatch, GenerateMatchInput,
    JobStatusPoller, MatchQuery, RemoteService, SnapshotStorage,
};
use harmatch_domain::{
    ColumnWidths, DEFAULT_MAX_CANDIDATES, DetailsTab, ItemId, JobId, OverrideUpdate, ParamsTab,
    ResponseTab, UploadFile, parse_pair,
};
use harmatch_infrastructure::{
    ClientConfig, FileSnapshotStorage, MemorySnapshotStorage, ReqwestRemoteService,
};
use tracing::{debug, warn};

use crate::render;

#[derive(Debug, Parser)]
#[command(
    name = "harmatch",
    version,
    about = "Find and replay requests from captured HTTP traffic"
)]
pub struct Cli {
    /// Service base URL (overrides HARMATCH_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Snapshot file (overrides HARMATCH_STATE_PATH)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a HAR file and make it the active job
    Upload {
        /// Path to the .har file
        file: PathBuf,
    },
    /// Capture a URL into a HAR and make it the active job
    Convert {
        /// Page to capture
        url: String,
    },
    /// Show the status of the active job
    Status {
        /// Keep polling until the job completes or fails
        #[arg(long)]
        watch: bool,
    },
    /// List the requests of the active job
    Requests,
    /// Find the request matching a description
    Match {
        /// What the wanted request does
        prompt: String,
        /// Shortlist size before model matching
        #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATES)]
        max_candidates: u32,
    },
    /// Print only the curl command for a description
    Download {
        /// What the wanted request does; the last prompt when omitted
        prompt: Option<String>,
        /// Shortlist size before model matching
        #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATES)]
        max_candidates: u32,
        /// Write the command to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the analysis of one request
    Details {
        /// Request id; the matched request when omitted
        id: Option<ItemId>,
    },
    /// Edit the overrides applied on execution
    Override {
        #[command(subcommand)]
        action: OverrideAction,
    },
    /// Show or change execution settings
    Settings {
        /// Upstream timeout in seconds
        #[arg(long)]
        timeout: Option<u32>,
        /// Whether redirects are followed
        #[arg(long)]
        follow_redirects: Option<bool>,
    },
    /// Replay a request with the stored overrides and settings
    Execute {
        /// Request id; the matched request when omitted
        id: Option<ItemId>,
    },
    /// Select the tab shown in a panel
    Tab {
        #[command(subcommand)]
        panel: TabPanel,
    },
    /// Check that the service is up
    Health,
    /// Print the stored state as JSON
    Show,
    /// Clear all stored state
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum OverrideAction {
    /// Set query parameters (KEY=VALUE)
    Query {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Set headers (KEY=VALUE)
    Header {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Replace the body; clears the body override when omitted
    Body { text: Option<String> },
    /// Remove every override
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum TabPanel {
    /// Details panel
    Details { tab: DetailsTabArg },
    /// Override editor
    Params { tab: ParamsTabArg },
    /// Response viewer
    Response { tab: ResponseTabArg },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DetailsTabArg {
    Curl,
    Details,
    Execute,
}

impl From<DetailsTabArg> for DetailsTab {
    fn from(arg: DetailsTabArg) -> Self {
        match arg {
            DetailsTabArg::Curl => Self::Curl,
            DetailsTabArg::Details => Self::Details,
            DetailsTabArg::Execute => Self::Execute,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ParamsTabArg {
    Query,
    Headers,
    Body,
}

impl From<ParamsTabArg> for ParamsTab {
    fn from(arg: ParamsTabArg) -> Self {
        match arg {
            ParamsTabArg::Query => Self::Query,
            ParamsTabArg::Headers => Self::Headers,
            ParamsTabArg::Body => Self::Body,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResponseTabArg {
    Body,
    Headers,
    Request,
}

impl From<ResponseTabArg> for ResponseTab {
    fn from(arg: ResponseTabArg) -> Self {
        match arg {
            ResponseTabArg::Body => Self::Body,
            ResponseTabArg::Headers => Self::Headers,
            ResponseTabArg::Request => Self::Request,
        }
    }
}

/// A hydrated store and a client for one invocation.
struct Session {
    client: Arc<ReqwestRemoteService>,
    store: AppStore,
}

impl Session {
    async fn open(cli: &Cli) -> Result<Self> {
        let mut config = ClientConfig::from_env().context("invalid environment configuration")?;
        if let Some(url) = &cli.api_url {
            config.base_url = ClientConfig::for_base_url(url)?.base_url;
        }
        if let Some(path) = &cli.state {
            config.state_path = Some(path.clone());
        }

        let storage: Arc<dyn SnapshotStorage> = match config.snapshot_path() {
            Some(path) => {
                debug!(path = %path.display(), "using snapshot file");
                Arc::new(FileSnapshotStorage::new(path))
            }
            None => {
                warn!("no data directory available, state will not be kept");
                Arc::new(MemorySnapshotStorage::new())
            }
        };
        let store = AppStore::new(storage);
        store.hydrate().await;

        let client = Arc::new(ReqwestRemoteService::new(&config)?);
        Ok(Self { client, store })
    }

    fn active_job(&self) -> Result<JobId> {
        self.store
            .job_id()
            .context("no active job; run `harmatch upload` or `harmatch convert` first")
    }

    fn item_or_selected(&self, id: Option<ItemId>) -> Result<ItemId> {
        id.or_else(|| self.store.read(AppState::selected_request_id))
            .context("no request selected; pass an id or run `harmatch match` first")
    }
}

/// Runs one command against the stored session.
pub async fn run(cli: Cli) -> Result<()> {
    let session = Session::open(&cli).await?;
    let Session { client, store } = &session;

    match cli.command {
        Command::Upload { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let name = file
                .file_name()
                .map_or_else(|| "upload.har".to_string(), |n| n.to_string_lossy().into_owned());
            let job = client.submit_file(&UploadFile::new(name, bytes)).await?;
            store.set_job_id(job.id.clone(), job.file_name.clone(), job.total_requests);
            println!("{}", render::job(&job));
        }
        Command::Convert { url } => {
            let job = client.submit_url(&url).await?;
            store.set_job_id(job.id.clone(), job.file_name.clone(), job.total_requests);
            println!("{}", render::job(&job));
        }
        Command::Status { watch } => {
            let job_id = session.active_job()?;
            if watch {
                watch_status(client, store, job_id).await?;
            } else {
                let job = client.fetch_status(&job_id).await?;
                store.record_job_status(&job);
                println!("{}", render::job(&job));
            }
        }
        Command::Requests => {
            let job_id = session.active_job()?;
            let items = client.fetch_job_items(&job_id).await?;
            println!("{}", render::items_table(&items, &ColumnWidths::default()));
        }
        Command::Match {
            prompt,
            max_candidates,
        } => {
            let job_id = session.active_job()?;
            store.set_prompt(prompt.clone());
            let input = GenerateMatchInput::new(job_id, prompt).with_max_candidates(max_candidates);
            let result = GenerateMatch::new(Arc::clone(client), store.clone())
                .execute(input)
                .await?;
            store.set_details_tab(DetailsTab::Curl);
            println!("{}", render::match_result(&result));
        }
        Command::Download {
            prompt,
            max_candidates,
            output,
        } => {
            let job_id = session.active_job()?;
            let prompt = prompt.unwrap_or_else(|| store.read(|s| s.prompt.clone()));
            if prompt.trim().is_empty() {
                bail!("no prompt given and none stored");
            }
            let query = MatchQuery {
                job_id,
                prompt,
                max_candidates,
            };
            let command = client.download_match(&query).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, format!("{command}\n"))
                        .await
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    println!("wrote {}", path.display());
                }
                None => println!("{command}"),
            }
        }
        Command::Details { id } => {
            let id = session.item_or_selected(id)?;
            let details = client.fetch_item_details(id).await?;
            store.set_details_tab(DetailsTab::Details);
            print!("{}", render::details(&details));
        }
        Command::Override { action } => {
            apply_override(store, action)?;
            println!("{}", serde_json::to_string_pretty(&store.read(|s| s.overrides.clone()))?);
        }
        Command::Settings {
            timeout,
            follow_redirects,
        } => {
            let mut settings = store.read(|s| s.execution_settings);
            if let Some(timeout) = timeout {
                settings.timeout_seconds = timeout;
            }
            if let Some(follow) = follow_redirects {
                settings.follow_redirects = follow;
            }
            store.set_execution_settings(settings);
            println!(
                "timeout: {}s, follow redirects: {}",
                settings.timeout_seconds, settings.follow_redirects
            );
        }
        Command::Execute { id } => {
            let id = session.item_or_selected(id)?;
            let input = ExecuteRequestInput::from_state(id, &store.state());
            let result = ExecuteRequest::new(Arc::clone(client), store.clone())
                .execute(input)
                .await?;
            store.set_details_tab(DetailsTab::Execute);
            print!("{}", render::execution(&result));
        }
        Command::Tab { panel } => match panel {
            TabPanel::Details { tab } => store.set_details_tab(tab.into()),
            TabPanel::Params { tab } => store.set_params_tab(tab.into()),
            TabPanel::Response { tab } => store.set_response_tab(tab.into()),
        },
        Command::Health => {
            let health = client.health().await?;
            println!("{}", health.status);
            if !health.is_healthy() {
                bail!("service reports {}", health.status);
            }
        }
        Command::Show => {
            println!("{}", serde_json::to_string_pretty(&store.state())?);
        }
        Command::Reset => {
            store.reset_state();
            println!("state cleared");
        }
    }
    Ok(())
}

async fn watch_status(
    client: &Arc<ReqwestRemoteService>,
    store: &AppStore,
    job_id: JobId,
) -> Result<()> {
    let mut poller = JobStatusPoller::new(Arc::clone(client)).with_store(store.clone());
    let mut updates = poller.subscribe();
    poller.set_job(Some(job_id));

    let mut last_line = String::new();
    loop {
        updates
            .changed()
            .await
            .context("status poller stopped unexpectedly")?;
        let state = updates.borrow_and_update().clone();

        if let Some(error) = &state.error {
            eprintln!("{error}");
        }
        if let Some(job) = &state.job {
            let line = render::job(job);
            if line != last_line {
                println!("{line}");
                last_line = line;
            }
        }
        if state.is_settled() {
            return Ok(());
        }
    }
}

/// Merges `KEY=VALUE` pairs into `current`; later pairs win.
fn merge_pairs(
    mut current: BTreeMap<String, String>,
    pairs: &[String],
) -> Result<BTreeMap<String, String>> {
    for raw in pairs {
        let (key, value) = parse_pair(raw)?;
        current.insert(key, value);
    }
    Ok(current)
}

fn apply_override(store: &AppStore, action: OverrideAction) -> Result<()> {
    let update = match action {
        OverrideAction::Query { pairs } => {
            let current = store.read(|s| s.overrides.query_params.clone());
            OverrideUpdate::Query(merge_pairs(current, &pairs)?)
        }
        OverrideAction::Header { pairs } => {
            let current = store.read(|s| s.overrides.headers.clone());
            OverrideUpdate::Headers(merge_pairs(current, &pairs)?)
        }
        OverrideAction::Body { text } => OverrideUpdate::Body(text),
        OverrideAction::Clear => {
            store.reset_overrides();
            return Ok(());
        }
    };
    store.update_overrides(update);
    Ok(())
}
