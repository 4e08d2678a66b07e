//! Command-line surface of the content engine.
//!
//! # Responsibility
//! - Map subcommands onto core services; no business rules live here.
//! - Print human-readable output on stdout, diagnostics through `log`.

use chrono::Utc;
use clap::{Parser, Subcommand};
use content_engine_core::{
    build_insight_draft, build_monthly_report, default_log_level, init_logging, needs_run_store,
    open_db, render_report_text, resolve_engine_config, shared_registry, write_json_file,
    write_monthly_insight, DbError, EngineSettings, ResolveEngineInput, ResolvedEngineConfig,
    RunRequest, RunService, SaveOutcome, SqliteInsightRepository, SqliteRunRepository,
    ENGINE_PRESETS,
};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "content-engine")]
#[command(about = "Compose articles from strategy, source and channel capabilities", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one article
    Run {
        /// Preset id (e.g. default, gentle-rewrite, seo-push)
        #[arg(long)]
        preset: Option<String>,

        /// Strategy id
        #[arg(long)]
        strategy: Option<String>,

        /// Source id
        #[arg(long)]
        source: Option<String>,

        /// Channel id
        #[arg(long)]
        channel: Option<String>,

        /// Topic override; skips the source
        #[arg(long)]
        topic: Option<String>,

        /// Draft text to rewrite
        #[arg(long)]
        draft: Option<String>,

        /// Print the article as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered capabilities and presets
    Options,

    /// Build the monthly report and insight draft, then store the insight
    Monthly {
        /// Month as YYYY-MM
        month: String,

        /// Output directory for reports/ and insights/
        #[arg(long, default_value = "scripts")]
        out_dir: PathBuf,

        /// Open the insight draft and wait for Enter before storing it
        #[arg(long)]
        open: bool,
    },

    /// Store the monthly insight, optionally from an edited JSON file
    Insight {
        /// Month as YYYY-MM
        month: String,

        /// Insight JSON file to merge over the defaults
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = EngineSettings::from_env();

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        settings
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string())
    };
    if let Err(err) = init_logging(&level, settings.log_dir.as_deref()) {
        eprintln!("warning: logging disabled: {err}");
    }

    let result = match cli.command {
        Commands::Run {
            preset,
            strategy,
            source,
            channel,
            topic,
            draft,
            json,
        } => {
            let request = RunRequest {
                selection: ResolveEngineInput {
                    preset_id: preset,
                    strategy_id: strategy,
                    source_id: source,
                    channel_id: channel,
                },
                topic,
                draft,
            };
            run_command(&settings, &request, json)
        }
        Commands::Options => options_command(&settings),
        Commands::Monthly {
            month,
            out_dir,
            open,
        } => monthly_command(&settings, &month, &out_dir, open),
        Commands::Insight { month, file } => insight_command(&settings, &month, file.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_command(settings: &EngineSettings, request: &RunRequest, json: bool) -> CliResult {
    let registry = shared_registry(settings);
    let config = resolve_engine_config(&registry, &request.selection);
    let conn = open_run_store(settings, &config)?;
    let repo = conn.as_ref().map(SqliteRunRepository::new);

    let mut service = RunService::new(&registry);
    if let Some(repo) = &repo {
        service = service.with_repository(repo, settings.save_runs);
    }
    let outcome = service.generate_resolved(config, request, Utc::now())?;
    let config = &outcome.output.config;
    let article = &outcome.output.article;

    if json {
        println!("{}", serde_json::to_string_pretty(article)?);
        return Ok(());
    }

    let preset = config.preset_id.as_deref().unwrap_or("-");
    if config.warnings.is_empty() {
        println!("preset: {preset}");
    } else {
        println!("preset: {preset} / warnings: {}", config.warnings.join(" | "));
    }
    println!("# {}", article.title);
    if let Some(seed) = &outcome.seed {
        println!(
            "seed: {} / savedAt: {}",
            seed.strategy_id.as_deref().unwrap_or("-"),
            seed.saved_at
        );
    }
    println!(
        "strategy: {} / source: {} / channel: {}",
        article.ids.strategy_id, article.ids.source_id, article.ids.channel_id
    );
    if let SaveOutcome::Saved { run_key } = &outcome.save {
        println!("saved: {run_key}");
    }
    println!();
    println!("{}", article.content);
    Ok(())
}

/// Opens the run store only when this run saves or seeds from it.
///
/// A store that is needed only for rewrite seeds may fail to open; the run
/// then goes ahead without seeds.
fn open_run_store(
    settings: &EngineSettings,
    config: &ResolvedEngineConfig,
) -> Result<Option<Connection>, DbError> {
    if !needs_run_store(config, settings.save_runs) {
        return Ok(None);
    }
    match open_db(&settings.db_path) {
        Ok(conn) => Ok(Some(conn)),
        Err(err) if !settings.save_runs => {
            warn!(
                "event=seed_store_open module=cli status=skip path={} error_code={} error={}",
                settings.db_path.display(),
                err.code(),
                err
            );
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn options_command(settings: &EngineSettings) -> CliResult {
    let options = shared_registry(settings).options();
    println!("strategies: {}", options.strategies.join(", "));
    println!("sources:    {}", options.sources.join(", "));
    println!("channels:   {}", options.channels.join(", "));
    println!();
    println!("presets:");
    for preset in ENGINE_PRESETS {
        println!(
            "- {} ({}): {} / {} / {}",
            preset.preset_id, preset.label, preset.strategy_id, preset.source_id, preset.channel_id
        );
    }
    Ok(())
}

fn monthly_command(settings: &EngineSettings, month: &str, out_dir: &Path, open: bool) -> CliResult {
    let conn = open_db(&settings.db_path)?;
    let now = Utc::now();

    let report = build_monthly_report(&SqliteRunRepository::new(&conn), month, now)?;
    print!("{}", render_report_text(&report));
    let report_path = write_json_file(&out_dir.join("reports").join(format!("{month}.json")), &report)?;

    let draft = build_insight_draft(&report);
    let insight_path =
        write_json_file(&out_dir.join("insights").join(format!("{month}.json")), &draft)?;

    if open {
        open_for_editing(&insight_path, &mut io::stdin().lock())?;
    }

    write_monthly_insight(
        &SqliteInsightRepository::new(&conn),
        month,
        Some(&insight_path),
        now,
    )?;
    info!("event=monthly_pipeline module=cli status=ok month={}", month);

    println!("Done monthly pipeline for {month}");
    println!("- report:  {}", report_path.display());
    println!("- insight: {}", insight_path.display());
    Ok(())
}

/// Hands `path` to the platform file opener, then blocks until Enter.
fn open_for_editing(path: &Path, input: &mut impl BufRead) -> CliResult {
    let status = opener_command(path).status()?;
    if !status.success() {
        return Err(format!("file opener exited with {status} for {}", path.display()).into());
    }
    info!(
        "event=insight_open module=cli status=ok path={}",
        path.display()
    );
    wait_for_enter(input)
}

fn opener_command(path: &Path) -> Command {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/c", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };
    command.arg(path);
    command
}

fn wait_for_enter(input: &mut impl BufRead) -> CliResult {
    print!("\nEdit the insight, save it, then press Enter to store it\n> ");
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

fn insight_command(settings: &EngineSettings, month: &str, file: Option<&Path>) -> CliResult {
    let conn = open_db(&settings.db_path)?;
    let stored = write_monthly_insight(&SqliteInsightRepository::new(&conn), month, file, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}
