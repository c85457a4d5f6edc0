use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tralbum::{Config, DirNaming, FailurePolicy, FetcherConfig, ReleaseRecord, Tralbum};

#[derive(Parser)]
#[command(name = "tralbum-cli")]
#[command(about = "CLI for Tralbum - Bandcamp release downloader", long_about = None)]
struct Cli {
    /// Directory release folders are created in
    #[arg(short, long, env = "TRALBUM_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "TRALBUM_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Pages or assets fetched at the same time (1-8)
    #[arg(short, long, env = "TRALBUM_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// How release folders are named
    #[arg(long, value_enum, default_value_t = DirName::Title)]
    dir_name: DirName,

    /// Record failed assets and keep going instead of stopping
    #[arg(long)]
    keep_going: bool,

    /// Embed title/artist/album/cover tags into downloaded tracks
    #[arg(long)]
    tag: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DirName {
    Title,
    Slug,
}

impl From<DirName> for DirNaming {
    fn from(d: DirName) -> Self {
        match d {
            DirName::Title => DirNaming::Title,
            DirName::Slug => DirNaming::Slug,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Download one release, or every release of an author
    Download {
        /// Author subdomain (the part before .bandcamp.com)
        author: String,

        /// Release slug; omit to download the whole catalog
        slug: Option<String>,
    },
    /// Show release metadata without downloading
    List {
        /// Author subdomain (the part before .bandcamp.com)
        author: String,

        /// Release slug; omit to list the whole catalog
        slug: Option<String>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = Config::default();
    config.fetcher = FetcherConfig {
        timeout: Duration::from_millis(cli.timeout_ms),
        ..FetcherConfig::default()
    };

    let mut tralbum = Tralbum::with_config(config)?;
    tralbum.set_output_dir(&cli.output);
    tralbum.set_concurrency(cli.concurrency);
    tralbum.set_dir_naming(cli.dir_name.into());
    tralbum.set_embed_tags(cli.tag);
    if cli.keep_going {
        tralbum.set_failure_policy(FailurePolicy::Continue);
    }

    match cli.command {
        Commands::Download { author, slug } => {
            match slug {
                Some(slug) => {
                    tralbum.add_release(&author, &slug).await?;
                }
                None => {
                    tralbum.add_author(&author).await?;
                }
            }

            let report = tralbum.download_queued().await?;
            for release in &report.releases {
                println!(
                    "✅ {} -> {} ({} file(s))",
                    release.title,
                    release.directory.display(),
                    release.written.len()
                );
                for (asset, err) in &release.failed {
                    println!("   - {}: {}", asset, err);
                }
            }
            if !report.all_successful() {
                println!("{} asset(s) failed", report.total_failed());
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::List { author, slug, json } => {
            let releases = match slug {
                Some(slug) => vec![tralbum.collect_one(&author, &slug).await?],
                None => tralbum.collect_all(&author).await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&releases)?);
            } else {
                print_releases(&releases);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_releases(releases: &[ReleaseRecord]) {
    for release in releases {
        println!(
            "{} - {} (ID: {}, slug: {})",
            release.author, release.title, release.id, release.slug
        );
        for (i, track) in release.tracks.iter().enumerate() {
            println!("  {}. {} [{}]", i + 1, track.title, track.format);
        }
    }
}
