//! `atlas` command line: renders one view headlessly and prints its frame as JSON.

use std::env;
use std::path::PathBuf;

use catalog::{CatalogError, DatasetCatalog, ScaleKind};
use clap::{Args, Parser, Subcommand};
use foundation::Year;
use layers::{CorrelationFrame, MapFrame, Presenter, RankingFrame};
use runtime::{ConfigError, Coordinator, CoordinatorError, Slot, ViewerConfig, load_directory};
use serde::Serialize;
use streaming::{DirectorySource, ResourceSource};
use tracing::debug;

pub const DEFAULT_DATA_ROOT: &str = "public/data";

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless renderer for the indicator atlas views")]
pub struct Cli {
    /// Directory holding `datasets/...` (default: $ATLAS_DATA_ROOT or public/data)
    #[arg(long, global = true)]
    pub data_root: Option<PathBuf>,

    /// Viewer config JSON
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Dataset registry JSON replacing the built-in one
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List selectable datasets by group
    Datasets,

    /// Choropleth map frame
    Map(ViewArgs),

    /// Ranking bar chart frame
    Ranking(ViewArgs),

    /// Correlation scatter frame of two datasets
    Correlation(ViewArgs),

    /// Threshold legend (empty unless the scale is threshold)
    Legend(ViewArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct ViewArgs {
    /// Primary dataset name (default from config)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Secondary dataset for the correlation y axis (default from config)
    #[arg(long)]
    pub secondary: Option<String>,

    /// Year column; for correlation it must be shared by both datasets
    #[arg(long)]
    pub year: Option<i32>,

    /// linear | logarithmic | threshold
    #[arg(long, value_parser = parse_scale)]
    pub scale: Option<ScaleKind>,

    /// Number of ranking bars, 0 for all
    #[arg(long)]
    pub limit: Option<usize>,

    /// Entity name or id to highlight
    #[arg(long)]
    pub highlight: Option<String>,
}

fn parse_scale(s: &str) -> Result<ScaleKind, String> {
    ScaleKind::parse(s).ok_or_else(|| format!("unknown scale {s:?}"))
}

#[derive(Debug)]
pub enum ToolError {
    Config(ConfigError),
    Catalog(CatalogError),
    Coordinator(CoordinatorError),
    Json(serde_json::Error),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Config(e) => write!(f, "{e}"),
            ToolError::Catalog(e) => write!(f, "{e}"),
            ToolError::Coordinator(e) => write!(f, "{e}"),
            ToolError::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<CoordinatorError> for ToolError {
    fn from(e: CoordinatorError) -> Self {
        ToolError::Coordinator(e)
    }
}

/// Keeps nothing; the CLI renders the frame it needs on demand.
struct Discard;

impl Presenter for Discard {
    fn present_map(&mut self, _frame: &MapFrame) {}
    fn present_ranking(&mut self, _frame: &RankingFrame) {}
    fn present_correlation(&mut self, _frame: &CorrelationFrame) {}
}

#[derive(Serialize)]
struct GroupListing<'a> {
    group: &'a str,
    datasets: Vec<&'a str>,
}

pub fn data_root(cli: &Cli) -> PathBuf {
    cli.data_root.clone().unwrap_or_else(|| {
        PathBuf::from(env::var("ATLAS_DATA_ROOT").unwrap_or_else(|_| DEFAULT_DATA_ROOT.to_string()))
    })
}

fn load_config(cli: &Cli) -> Result<ViewerConfig, ToolError> {
    match &cli.config {
        Some(path) => ViewerConfig::load(path).map_err(ToolError::Config),
        None => Ok(ViewerConfig::default()),
    }
}

fn load_catalog(cli: &Cli) -> Result<DatasetCatalog, ToolError> {
    match &cli.registry {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| ToolError::Catalog(CatalogError::Json(e.to_string())))?;
            DatasetCatalog::from_json_str(&raw).map_err(ToolError::Catalog)
        }
        None => DatasetCatalog::builtin().map_err(ToolError::Catalog),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum View {
    Map,
    Ranking,
    Correlation,
    Legend,
}

/// Runs one command and returns its pretty-printed JSON output.
pub async fn run(cli: &Cli) -> Result<String, ToolError> {
    let catalog = load_catalog(cli)?;
    let (view, args) = match &cli.command {
        Command::Datasets => {
            let listing: Vec<GroupListing<'_>> = catalog
                .groups()
                .into_iter()
                .map(|(group, datasets)| GroupListing { group, datasets })
                .collect();
            return serde_json::to_string_pretty(&listing).map_err(ToolError::Json);
        }
        Command::Map(a) => (View::Map, a),
        Command::Ranking(a) => (View::Ranking, a),
        Command::Correlation(a) => (View::Correlation, a),
        Command::Legend(a) => (View::Legend, a),
    };

    let config = load_config(cli)?;
    let source = DirectorySource::new(data_root(cli));
    debug!(root = %source.root().display(), "data root");
    let needs_secondary = view == View::Correlation;
    let coordinator = open(config, catalog, &source, args, needs_secondary).await?;

    let json = match view {
        View::Map => serde_json::to_string_pretty(&coordinator.render_map()),
        View::Ranking => serde_json::to_string_pretty(&coordinator.render_ranking()),
        View::Correlation => serde_json::to_string_pretty(&coordinator.render_correlation()),
        View::Legend => serde_json::to_string_pretty(&coordinator.legend()),
    };
    json.map_err(ToolError::Json)
}

async fn open<S: ResourceSource>(
    config: ViewerConfig,
    catalog: DatasetCatalog,
    source: &S,
    args: &ViewArgs,
    needs_secondary: bool,
) -> Result<Coordinator<Discard>, ToolError> {
    let directory = load_directory(source, &config.directory_resource).await?;

    let primary = args.dataset.clone().unwrap_or_else(|| config.initial_dataset_a.clone());
    let secondary = args.secondary.clone().unwrap_or_else(|| config.initial_dataset_b.clone());
    let mut c = Coordinator::new(config, catalog, directory, Discard);
    c.select_dataset(source, Slot::Primary, &primary).await?;
    if needs_secondary {
        c.select_dataset(source, Slot::Secondary, &secondary).await?;
    }

    if let Some(mode) = args.scale {
        c.select_scale_mode(mode)?;
    }
    if let Some(year) = args.year {
        if needs_secondary {
            c.select_correlation_year(Year(year))?;
        } else {
            c.select_year(Year(year))?;
        }
    }
    if let Some(limit) = args.limit {
        c.set_ranking_limit(limit)?;
    }
    if let Some(h) = &args.highlight {
        c.highlight(h)?;
    }
    Ok(c)
}
