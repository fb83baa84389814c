use std::{collections::HashSet, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use futures::{StreamExt, stream};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tubenote_core::{
    ChatSummarizer, Config, NotionClient, Outcome, Pipeline, Progress, Provider, Stage,
    StageStatus, TubenoteError, YtDlpSource, config::DEFAULT_MAX_SUMMARY_TOKENS,
    format_draft_readable, get_root_cache_dir,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    Grok,
    #[default]
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "tubenote")]
#[command(about = "Summarize YouTube videos with AI and publish the summaries to Notion")]
struct Cli {
    /// Video URLs
    urls: Vec<String>,

    /// File with one URL per line; blank lines and `#` comments are skipped
    #[arg(short = 'F', long)]
    file: Option<PathBuf>,

    /// AI provider for summarization
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,

    /// Model name, overrides the provider default
    #[arg(short, long)]
    model: Option<String>,

    /// Upper bound on summary length, in tokens
    #[arg(long, default_value_t = DEFAULT_MAX_SUMMARY_TOKENS)]
    max_tokens: u32,

    /// Transcript language (e.g., "en", "de"). Defaults to DEFAULT_LANGUAGE or "en".
    #[arg(short, long)]
    lang: Option<String>,

    /// Force re-processing even if cached files exist
    #[arg(short, long)]
    force: bool,

    /// Print the page instead of publishing it to Notion
    #[arg(long)]
    dry_run: bool,

    /// Number of videos processed concurrently
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn create_spinner(multi: &MultiProgress, msg: &str) -> ProgressBar {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// URLs from a batch file, one per line
fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Drop repeated URLs, keeping first occurrence order
fn dedup_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn done_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Metadata => "Metadata fetched",
        Stage::Transcript => "Transcript extracted",
        Stage::Summary => "Summary generated",
        Stage::Publish => "Published to Notion",
    }
}

/// Spinner for one video; finished stages are printed above it
struct SpinnerProgress {
    bar: ProgressBar,
    prefix: String,
}

impl Progress for SpinnerProgress {
    fn update(&self, stage: Stage, status: StageStatus) {
        match status {
            StageStatus::Running => self
                .bar
                .set_message(format!("{}{}...", self.prefix, stage.label())),
            StageStatus::Done => self.bar.println(format!(
                "{} {}{}",
                style("✓").green().bold(),
                self.prefix,
                done_label(stage)
            )),
            StageStatus::Cached => self.bar.println(format!(
                "{} {}{} {}",
                style("✓").green().bold(),
                self.prefix,
                done_label(stage),
                style("(cached)").dim()
            )),
        }
    }
}

fn error_hint(err: &TubenoteError) -> Option<&'static str> {
    if err.is_missing_captions() {
        Some(
            "This video doesn't have captions or transcripts available.\n\
             Try another video, or another language with --lang.",
        )
    } else if err.is_database_not_found() {
        Some(
            "Couldn't find your Notion database. Please check:\n\
             1. NOTION_DATABASE_ID is correct\n\
             2. The database is shared with your integration",
        )
    } else if err.is_auth_failure() {
        Some("API authentication failed. Please check your API keys.")
    } else {
        None
    }
}

fn report(url: &str, result: &std::result::Result<Outcome, TubenoteError>, show_url: bool) {
    if show_url {
        println!("\n{}", style(url).bold());
    }
    match result {
        Ok(Outcome::Published { page, .. }) => {
            println!("{} {}", style("Title:").dim(), style(&page.title).green());
            println!("{} {}", style("Notion URL:").dim(), style(&page.url).cyan());
        }
        Ok(Outcome::Drafted(draft)) => {
            println!("{} {}", style("Title:").dim(), style(&draft.title).green());
            println!("{}", style("─".repeat(60)).dim());
            println!("{}", format_draft_readable(draft));
        }
        Err(err) => {
            eprintln!("{} {}", style("Error:").red().bold(), err);
            if let Some(hint) = error_hint(err) {
                eprintln!("{}", style(hint).yellow());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.file {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read URL file {}", path.display()))?;
        urls.extend(parse_url_list(&content));
    }
    let total = urls.len();
    let urls = dedup_urls(urls);
    if urls.len() < total {
        debug!(skipped = total - urls.len(), "dropped duplicate URLs");
    }
    if urls.is_empty() {
        bail!("No video URLs given. Pass URLs as arguments or use --file.");
    }

    let config = Config::from_env()?;
    let language = cli.lang.clone().unwrap_or_else(|| config.language.clone());

    // Validate credentials early
    let summarizer = match ChatSummarizer::new(cli.provider.clone().into(), cli.model.clone()) {
        Ok(summarizer) => summarizer.with_max_tokens(cli.max_tokens),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let mut pipeline = Pipeline::new(
        Arc::new(YtDlpSource::new(&language)),
        Arc::new(summarizer),
        get_root_cache_dir(),
    )
    .force(cli.force);

    if !cli.dry_run {
        match config.notion() {
            Ok(notion) => pipeline = pipeline.with_store(Arc::new(NotionClient::new(notion))),
            Err(e) => {
                eprintln!("{} {}", style("Error:").red().bold(), e);
                std::process::exit(1);
            }
        }
    }

    println!(
        "\n{}  {}\n",
        style("tubenote").cyan().bold(),
        style(pipeline.summarizer().describe()).dim()
    );

    info!(
        videos = urls.len(),
        jobs = cli.jobs,
        dry_run = cli.dry_run,
        language = %language,
        "starting"
    );

    let multi = MultiProgress::new();
    let batch = urls.len() > 1;
    let pipeline = &pipeline;
    let multi = &multi;

    let mut results = stream::iter(urls.iter().enumerate())
        .map(|(index, url)| async move {
            let prefix = if batch {
                format!("[{}] ", index + 1)
            } else {
                String::new()
            };
            let progress = SpinnerProgress {
                bar: create_spinner(multi, &format!("{prefix}Starting...")),
                prefix,
            };
            let result = pipeline.process(url, &progress).await;
            progress.bar.finish_and_clear();
            (index, url, result)
        })
        .buffer_unordered(cli.jobs.max(1))
        .collect::<Vec<_>>()
        .await;
    results.sort_by_key(|(index, ..)| *index);

    for (_, url, result) in &results {
        report(url, result, batch);
    }

    let failed = results.iter().filter(|(.., r)| r.is_err()).count();
    if batch {
        println!(
            "\n{} {} succeeded, {} failed",
            style("Done:").bold(),
            style(results.len() - failed).green(),
            style(failed).red()
        );
    }
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
