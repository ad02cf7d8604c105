use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use endscan::{
    BatchReport, EndscanError, FfmpegLogLevel, OllamaRecognizer, Pipeline, PipelineOptions,
    PlannedVideo, ProgressCallback, ProgressInfo, RecognizerOptions, SamplingOptions, Stage,
    list_video_files, parse_episode_count, plan_batch, validate_video_folder,
};
use indicatif::{ProgressBar, ProgressStyle};

const CLI_AFTER_HELP: &str = "Examples:\n  endscan scan ~/videos/season_1 --episodes 12\n  endscan scan --progress --verbose\n  endscan plan ~/videos/season_1 --episodes 12 --json\n  endscan completions zsh > _endscan";

#[derive(Debug, Parser)]
#[command(
    name = "endscan",
    version,
    about = "Find episode end times in videos that contain several episodes",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging from endscan.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while sampling and recognizing.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg console output (quiet, error, warning, info, debug).
    #[arg(long, global = true, default_value = "error")]
    ffmpeg_log_level: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sample frames around estimated boundaries and detect episode ends.
    #[command(
        about = "Detect episode end times",
        after_help = "Examples:\n  endscan scan ~/videos/season_1 --episodes 12\n  endscan scan ~/videos --episodes 8 --radius 45 --model llava:13b --json"
    )]
    Scan {
        /// Folder containing the video files. Prompted for when omitted.
        folder: Option<PathBuf>,
        /// Total episodes across all videos. Prompted for when omitted.
        #[arg(long, short, value_parser = episode_count_arg)]
        episodes: Option<u32>,
        /// Seconds sampled on each side of a boundary estimate.
        #[arg(long)]
        radius: Option<u32>,
        /// Ollama-compatible generate endpoint.
        #[arg(long)]
        endpoint: Option<String>,
        /// Vision model used for text recognition.
        #[arg(long)]
        model: Option<String>,
        /// Per-request timeout in seconds. Waits indefinitely when omitted.
        #[arg(long)]
        timeout: Option<u64>,
        /// Name of the results file written into the folder.
        #[arg(long)]
        results: Option<String>,
        /// Print the batch summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the episode allocation and boundary estimates.
    #[command(
        about = "Print checkpoints without sampling",
        after_help = "Examples:\n  endscan plan ~/videos/season_1 --episodes 12\n  endscan plan ~/videos/season_1 --episodes 12 --json"
    )]
    Plan {
        folder: Option<PathBuf>,
        #[arg(long, short, value_parser = episode_count_arg)]
        episodes: Option<u32>,
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn episode_count_arg(value: &str) -> Result<u32, String> {
    parse_episode_count(value).map_err(|error| error.to_string())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "warn,endscan=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Ask on stderr until `parse` accepts a line from `input`.
fn prompt_until<T, R: BufRead>(
    input: &mut R,
    message: &str,
    parse: impl Fn(&str) -> Result<T, EndscanError>,
) -> Result<T, Box<dyn std::error::Error>> {
    loop {
        eprint!("{} ", message.bold());
        io::stderr().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err("no input provided".into());
        }

        match parse(line.trim_end_matches(['\r', '\n'])) {
            Ok(value) => return Ok(value),
            Err(error) => eprintln!("{} {error}", "invalid:".yellow().bold()),
        }
    }
}

fn resolve_folder(folder: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match folder {
        Some(folder) => Ok(validate_video_folder(folder)?),
        None => prompt_until(
            &mut io::stdin().lock(),
            "Folder containing the video files:",
            |line| validate_video_folder(line.trim()),
        ),
    }
}

fn resolve_episodes(episodes: Option<u32>) -> Result<u32, Box<dyn std::error::Error>> {
    match episodes {
        Some(count) => Ok(count),
        None => prompt_until(
            &mut io::stdin().lock(),
            "Number of episodes in these videos:",
            parse_episode_count,
        ),
    }
}

/// `1290.4` → `00:21:30`.
fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn format_timestamps(timestamps: &[f64]) -> String {
    if timestamps.is_empty() {
        return "none".to_string();
    }
    timestamps
        .iter()
        .map(|&seconds| format!("{} ({seconds:.0}s)", format_timestamp(seconds)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One indicatif bar per stage and video.
struct TerminalProgress {
    bar: Mutex<Option<(Stage, String, ProgressBar)>>,
    style: ProgressStyle,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let style =
            ProgressStyle::with_template("{spinner:.green} {msg:24} {bar:40.cyan/blue} {pos}/{len}")?
                .progress_chars("##-");
        Ok(Self {
            bar: Mutex::new(None),
            style,
        })
    }

    fn start_bar(&self, info: &ProgressInfo) -> ProgressBar {
        let bar = ProgressBar::new(info.total.unwrap_or(0));
        bar.set_style(self.style.clone());
        let stage = match info.stage {
            Stage::Sampling => "sampling",
            Stage::Recognition => "reading",
            _ => "working",
        };
        bar.set_message(format!("{stage} {}", info.video));
        bar
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let Ok(mut current) = self.bar.lock() else {
            return;
        };

        let same_bar = current
            .as_ref()
            .is_some_and(|(stage, video, _)| *stage == info.stage && *video == info.video);
        if !same_bar {
            if let Some((_, _, previous)) = current.take() {
                previous.finish();
            }
            *current = Some((info.stage, info.video.clone(), self.start_bar(info)));
        }

        if let Some((_, _, bar)) = current.as_ref() {
            bar.set_position(info.current);
            if info.total.is_some_and(|total| info.current >= total) {
                bar.finish();
            }
        }
    }
}

fn print_plan(folder: &Path, planned: &[PlannedVideo]) {
    println!("{} {}", "folder".cyan().bold(), folder.display());
    for video in planned {
        println!("{} ({} episode(s))", video.video.bold(), video.episodes);
        match (&video.error, video.duration_seconds) {
            (Some(error), _) => println!("  {} {error}", "unreadable:".yellow().bold()),
            (None, Some(duration)) => {
                println!("  duration    {}", format_timestamp(duration));
                println!("  checkpoints {}", format_timestamps(&video.checkpoints));
            }
            (None, None) => {}
        }
    }
}

fn print_report(report: &BatchReport) {
    println!("{} {:?}", "episodes per file".cyan().bold(), report.allocation);
    for outcome in &report.processed {
        println!("{}", outcome.video.bold());
        println!("  checkpoints {}", format_timestamps(&outcome.checkpoints));
        println!("  frames      {}", outcome.frames_sampled);
        if outcome.recognition_failures > 0 {
            println!(
                "  {}",
                format!("{} recognition failure(s)", outcome.recognition_failures).yellow()
            );
        }
        let ends = format_timestamps(&outcome.end_timestamps);
        if outcome.end_timestamps.is_empty() {
            println!("  end times   {}", ends.yellow());
        } else {
            println!("  end times   {}", ends.green());
        }
    }
    for skipped in &report.skipped {
        eprintln!(
            "{} {}: {}",
            "skipped:".yellow().bold(),
            skipped.video,
            skipped.reason
        );
    }
    println!(
        "{} {}",
        "results".green().bold(),
        report.results_path.display()
    );
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    endscan::set_ffmpeg_log_level(cli.global.ffmpeg_log_level.parse::<FfmpegLogLevel>()?);

    match cli.command {
        Commands::Scan {
            folder,
            episodes,
            radius,
            endpoint,
            model,
            timeout,
            results,
            json,
        } => {
            let folder = resolve_folder(folder)?;
            let videos = list_video_files(&folder)?;
            let episode_count = resolve_episodes(episodes)?;

            let mut recognizer_options = RecognizerOptions::new();
            if let Some(endpoint) = endpoint {
                recognizer_options = recognizer_options.with_endpoint(endpoint);
            }
            if let Some(model) = model {
                recognizer_options = recognizer_options.with_model(model);
            }
            if let Some(seconds) = timeout {
                recognizer_options = recognizer_options.with_timeout(Duration::from_secs(seconds));
            }
            let recognizer = OllamaRecognizer::new(recognizer_options)?;

            let mut sampling = SamplingOptions::new();
            if let Some(radius) = radius {
                sampling = sampling.with_radius(radius);
            }
            let mut options = PipelineOptions::new().with_sampling(sampling);
            if let Some(results) = results {
                options = options.with_results_file_name(results);
            }
            if cli.global.progress {
                options = options.with_progress(Arc::new(TerminalProgress::new()?));
            }

            let results_path = folder.join(options.results_file_name());
            let report = Pipeline::new(&recognizer, options).run_videos(
                &videos,
                episode_count,
                results_path,
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Plan {
            folder,
            episodes,
            json,
        } => {
            let folder = resolve_folder(folder)?;
            let videos = list_video_files(&folder)?;
            let episode_count = resolve_episodes(episodes)?;
            let planned = plan_batch(&videos, episode_count)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&planned)?);
            } else {
                print_plan(&folder, &planned);
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "endscan", &mut io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
