use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gas_ingest::parsers::pipeline_projects::ProjectFilter;
use gas_ingest::DashboardConfig;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

mod benchmarks_page;
mod download;
mod output;
mod pipelines_page;
mod refresh;
mod rigs_page;
mod sources;
mod storage_page;
mod trade_page;

use output::OutputWriter;
use sources::SourceReader;

#[derive(Parser)]
#[command(name = "natgas_dashboard")]
#[command(about = "Download and reshape natural gas market data into dashboard tables")]
struct Cli {
    /// TOML configuration file (defaults are used for missing keys)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding locally supplied price and storage files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory downloaded workbooks are saved to
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Directory the page tables are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Reuse previous downloads instead of fetching
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Henry Hub, JKM and TTF prices with LNG spreads
    Benchmarks,
    /// LNG pipeline projects and capacity
    Pipelines(PipelineArgs),
    /// Rig counts and dry shale production
    Rigs,
    /// Imports and exports
    Trade,
    /// US and EU storage
    Storage,
    /// Every page
    All,
    /// Rebuild one page periodically
    Watch {
        #[arg(value_enum)]
        page: Page,

        /// Seconds between refreshes (overrides the config)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Args, Default, Clone)]
struct PipelineArgs {
    /// Keep only these statuses
    #[arg(long)]
    status: Vec<String>,

    /// Keep only these state lists
    #[arg(long)]
    state: Vec<String>,

    /// Keep only these in-service years
    #[arg(long)]
    year: Vec<i32>,

    /// Keep only these project types
    #[arg(long)]
    project_type: Vec<String>,
}

impl PipelineArgs {
    fn to_filter(&self) -> ProjectFilter {
        ProjectFilter {
            statuses: self.status.iter().cloned().collect(),
            states: self.state.iter().cloned().collect(),
            years: self.year.iter().copied().collect(),
            project_types: self.project_type.iter().cloned().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Page {
    Benchmarks,
    Pipelines,
    Rigs,
    Trade,
    Storage,
    All,
}

const PAGES: [Page; 5] = [Page::Benchmarks, Page::Pipelines, Page::Rigs, Page::Trade, Page::Storage];

/// Build one page's tables into `out`.
fn build_page(page: Page, sources: &SourceReader, pipeline_filter: &ProjectFilter, out: &OutputWriter) -> Result<()> {
    match page {
        Page::Benchmarks => benchmarks_page::run(sources.config(), out),
        Page::Pipelines => pipelines_page::run(sources, pipeline_filter, out),
        Page::Rigs => rigs_page::run(sources, out),
        Page::Trade => trade_page::run(sources, out),
        Page::Storage => storage_page::run(sources, out),
        Page::All => PAGES
            .iter()
            .try_for_each(|&page| build_page(page, sources, pipeline_filter, out)),
    }
}

/// Each page is published as a unit; a page that fails keeps its previous
/// tables.
fn run_page(page: Page, config: &DashboardConfig, offline: bool, pipeline_filter: &ProjectFilter) -> Result<()> {
    let out = OutputWriter::new(&config.output_dir)?;
    let sources = SourceReader::new(config, offline)?;

    let pages = match page {
        Page::All => PAGES.to_vec(),
        single => vec![single],
    };
    for page in pages {
        let published = out.publish(|staged| build_page(page, &sources, pipeline_filter, staged))?;
        info!("{:?}: {} tables published", page, published.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.download_dir {
        config.download_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    info!("Writing tables to {}", config.output_dir.display());

    let no_filter = ProjectFilter::default();
    match cli.command {
        Command::Benchmarks => run_page(Page::Benchmarks, &config, cli.offline, &no_filter)?,
        Command::Pipelines(args) => run_page(Page::Pipelines, &config, cli.offline, &args.to_filter())?,
        Command::Rigs => run_page(Page::Rigs, &config, cli.offline, &no_filter)?,
        Command::Trade => run_page(Page::Trade, &config, cli.offline, &no_filter)?,
        Command::Storage => run_page(Page::Storage, &config, cli.offline, &no_filter)?,
        Command::All => run_page(Page::All, &config, cli.offline, &no_filter)?,
        Command::Watch { page, interval } => {
            let secs = interval.unwrap_or(config.refresh_interval_secs);
            if secs == 0 {
                anyhow::bail!("--interval must be greater than 0");
            }
            info!("Refreshing {:?} every {}s", page, secs);
            refresh::watch(Duration::from_secs(secs), None, || {
                run_page(page, &config, cli.offline, &no_filter)
            })?;
        }
    }

    Ok(())
}
