use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xdg::BaseDirectories;

use pr_threads::app::{App, BrowserOptions};
use pr_threads::config::{Config, APP_NAME};
use pr_threads::filter::filter_threads;
use pr_threads::github;
use pr_threads::output::{self, Styler};
use pr_threads::render::RendererPool;
use pr_threads::term;

const LOG_FILE: &str = "pr-threads.log";

#[derive(Parser, Debug)]
#[command(name = "pr-threads")]
#[command(about = "Browse and triage GitHub pull request review threads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print review threads
    List {
        #[command(flatten)]
        target: TargetArgs,

        /// Print JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Browse review threads interactively
    Tui {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Reply to a review thread
    Reply {
        #[arg(long)]
        thread_id: String,

        /// Reply text
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the reply text from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        #[arg(long)]
        host: Option<String>,
    },
    /// Mark a review thread as resolved
    Resolve(ThreadArgs),
    /// Mark a review thread as unresolved
    Unresolve(ThreadArgs),
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Repository name (e.g., "owner/repo"); defaults to the current checkout
    #[arg(long)]
    repo: Option<String>,

    /// Pull request number; defaults to the PR of the current branch
    #[arg(long)]
    pr: Option<u32>,

    /// all | unresolved | resolved | resolved-no-reply
    #[arg(long)]
    status: Option<String>,

    /// GitHub host (overrides GH_HOST)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Args, Debug)]
struct ThreadArgs {
    #[arg(long)]
    thread_id: String,

    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_logging(&config);

    match cli.command {
        Command::List { target, json } => list(&config, target, json).await,
        Command::Tui { target } => browse(&config, target).await,
        Command::Reply {
            thread_id,
            body,
            body_file,
            host,
        } => {
            let body = read_body(body, body_file.as_deref())?;
            let host = config.resolve_host(host.as_deref(), github::env_host());
            let id = github::reply_to_thread(&host, &thread_id, &body).await?;
            println!("replied with comment id {}", id);
            Ok(())
        }
        Command::Resolve(args) => set_resolved(&config, args, true).await,
        Command::Unresolve(args) => set_resolved(&config, args, false).await,
    }
}

/// ログはファイルにのみ出力（TUIが端末を占有するため）。開けなければ無効
fn init_logging(config: &Config) {
    let Some(path) = BaseDirectories::with_prefix(APP_NAME)
        .ok()
        .and_then(|dirs| dirs.place_cache_file(LOG_FILE).ok())
    else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level.0))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

async fn list(config: &Config, target: TargetArgs, json: bool) -> Result<()> {
    let mode = config.resolve_status(target.status.as_deref())?;
    let host = config.resolve_host(target.host.as_deref(), github::env_host());
    let repo = github::resolve_repo(target.repo.as_deref()).await?;
    let pr = github::resolve_pr_number(target.pr).await?;
    let threads = github::fetch_all_threads(&host, &repo, pr).await?;
    let visible = filter_threads(&threads, mode);
    info!(%mode, total = threads.len(), visible = visible.len(), "listing threads");

    let mut stdout = std::io::stdout().lock();
    if json {
        return output::write_json(&mut stdout, &visible);
    }

    let caps = term::probe();
    let width = config.render.list_width;
    let mut renderers = RendererPool::new(config.render.theme.clone());
    let renderer = if caps.color && config.render.markdown {
        renderers.renderer_for_width(width)
    } else {
        None
    };
    output::write_threads(&mut stdout, &visible, width, renderer, Styler::new(caps.color))
}

async fn browse(config: &Config, target: TargetArgs) -> Result<()> {
    let mode = config.resolve_status(target.status.as_deref())?;
    let caps = term::probe();
    if !caps.interactive {
        anyhow::bail!("tui requires an interactive terminal (stdout is not a tty)");
    }
    let host = config.resolve_host(target.host.as_deref(), github::env_host());
    let repo = github::resolve_repo(target.repo.as_deref()).await?;
    let pr = github::resolve_pr_number(target.pr).await?;
    let threads = github::fetch_all_threads(&host, &repo, pr).await?;

    let size = term::terminal_size()?;
    let options = BrowserOptions {
        markdown: config.render.markdown && caps.color,
        color: caps.color,
        theme: config.render.theme.clone(),
    };
    let mut app = App::new(repo, pr, threads, mode, options, size);
    app.run().await
}

async fn set_resolved(config: &Config, args: ThreadArgs, resolved: bool) -> Result<()> {
    let host = config.resolve_host(args.host.as_deref(), github::env_host());
    let state = github::set_thread_resolved(&host, &args.thread_id, resolved).await?;
    let label = if state.is_resolved {
        "resolved"
    } else {
        "unresolved"
    };
    println!("thread {} is now {}", state.id, label);
    Ok(())
}

/// `--body` か `--body-file` のどちらか一方。空白のみの本文はエラー
fn read_body(body: Option<String>, body_file: Option<&Path>) -> Result<String> {
    let body = match (body, body_file) {
        (Some(_), Some(_)) => anyhow::bail!("provide only one of --body or --body-file"),
        (Some(body), None) => body,
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("--body or --body-file is required"),
    };
    if body.trim().is_empty() {
        anyhow::bail!("reply body is empty");
    }
    Ok(body)
}
