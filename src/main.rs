use clap::{Parser, ValueEnum};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use imgfetch::downloader::config::{DEFAULT_CONCURRENCY, DEFAULT_DIRECTORY};
use imgfetch::http::DEFAULT_CREDENTIALS_PATH;
use imgfetch::{DownloadOutcome, DownloaderBuilder, Engine};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Fetch a batch of images over HTTP into a directory.
#[derive(Parser, Debug)]
#[command(name = "imgfetch", version, about)]
struct Args {
    /// URLs to fetch.
    urls: Vec<String>,

    /// File with one URL per line. Blank lines and lines starting with `#`
    /// are ignored.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Maximum number of requests in flight.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Directory the files are saved into.
    #[arg(short, long, default_value = DEFAULT_DIRECTORY)]
    output: PathBuf,

    /// JSON file providing the headers sent with every request.
    #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,

    /// Scheduler to run the batch on.
    #[arg(long, value_enum, default_value_t = EngineArg::Tasks)]
    engine: EngineArg,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Ignore content type parameters and case when picking an extension.
    #[arg(long)]
    normalize_content_type: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EngineArg {
    Tasks,
    Threads,
    /// Run the batch on tasks, then again on threads.
    Both,
}

impl EngineArg {
    fn engines(self) -> Vec<Engine> {
        match self {
            EngineArg::Tasks => vec![Engine::Tasks],
            EngineArg::Threads => vec![Engine::Threads],
            EngineArg::Both => vec![Engine::Tasks, Engine::Threads],
        }
    }
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read URL list {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    debug!(?args, "CLI arguments parsed");

    let mut urls = args.urls.clone();
    if let Some(ref input) = args.input {
        urls.extend(read_url_file(input)?);
    }
    if urls.is_empty() {
        bail!("no URLs given: pass them as arguments or with --input");
    }

    for engine in args.engine.engines() {
        let mut builder = DownloaderBuilder::new()
            .directory(args.output.clone())
            .concurrent_downloads(args.concurrency)
            .credentials(args.credentials.clone())
            .engine(engine)
            .normalize_content_type(args.normalize_content_type)
            .progress_bar(args.progress);
        if let Some(secs) = args.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let result = builder.build().run(urls.iter().cloned()).await?;

        for (url, outcome) in urls.iter().zip(result.outcomes()) {
            match outcome {
                DownloadOutcome::Saved { path } => println!("{}\t{}", url, path.display()),
                DownloadOutcome::Skipped(reason) => println!("{}\t-\t{}", url, reason),
                DownloadOutcome::Failed(reason) => println!("{}\t-\t{}", url, reason),
            }
        }
    }

    Ok(())
}
