use clap::Parser;
use playlist_dl::error::Result;
use playlist_dl::validation::{is_playlist, validate_url};
use playlist_dl::{process_playlist, process_video, Config, MediaTool, Prompter, YtDlp};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Download a playlist (or a single video) at one consistent quality.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Playlist or video URL
    url: String,

    /// Destination directory (skips the destination question)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Maximum number of concurrent metadata fetches and downloads
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Use this yt-dlp binary instead of installing one
    #[arg(long = "yt-dlp", value_name = "PATH")]
    yt_dlp: Option<PathBuf>,

    /// Re-encode playlist downloads into this container
    #[arg(long, value_name = "EXT")]
    recode: Option<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Main entry point for the application.
///
/// # Steps
/// 1. Parses arguments (a missing URL prints usage and exits non-zero)
/// 2. Initializes logging, `RUST_LOG` taking precedence over `-v`
/// 3. Runs the playlist or single-video flow
/// 4. Exits with status 1 if the flow fails
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Starting application...");
    let start = Instant::now();

    if let Err(e) = run_application(args).await {
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    println!("Time taken: {:.2} seconds", start.elapsed().as_secs_f64());
    info!("Application completed successfully");
    Ok(())
}

/// Resolves configuration, asks for the destination and dispatches on the URL kind.
///
/// # Errors
/// Returns error if:
/// - The URL is invalid (checked before anything else runs)
/// - The configuration file cannot be read
/// - The media tool cannot be provisioned
/// - An interactive question gets no valid answer
async fn run_application(args: Args) -> Result<()> {
    let url = validate_url(&args.url)?;

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(jobs) = args.jobs {
        config = config.with_jobs(jobs);
    }
    if let Some(path) = args.yt_dlp {
        config.ytdlp_path = Some(path);
    }

    // Blocking stdin; questions are only asked while no fetch or download is running.
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout(), config.max_prompt_attempts);

    let destination = match args.output {
        Some(dir) => dir,
        None => PathBuf::from(prompter.input(
            "Where do you want to save the files?",
            &config.output_dir.to_string_lossy(),
        )?),
    };
    tokio::fs::create_dir_all(&destination).await?;

    let tool: Arc<dyn MediaTool> = Arc::new(YtDlp::from_config(&config).await?);

    let end = if is_playlist(&url) {
        process_playlist(tool, config, &url, destination, args.recode, &mut prompter).await?
    } else {
        process_video(tool, config, &url, destination, &mut prompter).await?
    };
    debug!(?end, "Session finished");
    Ok(())
}
