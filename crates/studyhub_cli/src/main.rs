//! Command-line entry point over the StudyHub core.
//!
//! # Responsibility
//! - Verify core linkage (`ping`, `version`).
//! - Inspect and maintain a StudyHub database: GPA, stats, backup, clear.

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use studyhub_core::service::backup_service::backup_file_name;
use studyhub_core::{
    AcademicService, BackupService, CalendarService, FinanceService, NoteService,
    SqliteKvStorage, Store, StudyService,
};

const DB_PATH_ENV: &str = "STUDYHUB_DB_PATH";
const DB_FILE_NAME: &str = "studyhub.sqlite3";

#[derive(Parser)]
#[command(name = "studyhub", about = "StudyHub local data tool")]
struct Cli {
    /// Database file (defaults to $STUDYHUB_DB_PATH, then the temp dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage
    Ping,

    /// Print the core version
    Version,

    /// Show per-semester and cumulative GPA
    Gpa {
        /// Ignore Honors/AP bonuses
        #[arg(long)]
        unweighted: bool,
    },

    /// Show collection statistics
    Stats,

    /// Export a backup bundle
    Export {
        /// Output file (defaults to studyhub-backup-YYYY-MM-DD.json)
        path: Option<PathBuf>,
    },

    /// Import a backup bundle, replacing the collections it carries
    Import {
        /// Input file path
        path: PathBuf,
    },

    /// Remove every StudyHub collection
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose)?;

    match &cli.command {
        Commands::Ping => {
            println!("studyhub_core ping={}", studyhub_core::ping());
            Ok(())
        }
        Commands::Version => {
            println!("studyhub_core version={}", studyhub_core::core_version());
            Ok(())
        }
        Commands::Gpa { unweighted } => cmd_gpa(&cli, !unweighted),
        Commands::Stats => cmd_stats(&cli),
        Commands::Export { path } => cmd_export(&cli, path.as_deref()),
        Commands::Import { path } => cmd_import(&cli, path),
        Commands::Clear { yes } => cmd_clear(&cli, *yes),
    }
}

fn init_logging(verbose: bool) -> Result<LoggerHandle> {
    let level = if verbose { "debug" } else { "warn" };
    Logger::try_with_str(level)
        .context("invalid log level")?
        .log_to_stderr()
        .start()
        .context("failed to start logger")
}

fn db_path(cli: &Cli) -> PathBuf {
    if let Some(path) = &cli.db {
        return path.clone();
    }
    std::env::var(DB_PATH_ENV)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

fn open_store(cli: &Cli) -> Result<Store<SqliteKvStorage>> {
    let path = db_path(cli);
    let conn = studyhub_core::open_db(&path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    debug!("event=cli_open module=cli status=ok path={}", path.display());
    Ok(Store::new(SqliteKvStorage::new(conn)))
}

fn cmd_gpa(cli: &Cli, weighted: bool) -> Result<()> {
    let store = open_store(cli)?;
    let academics = AcademicService::new(&store).context("failed to load semesters")?;
    let summary = academics.summary(weighted);

    for semester in &summary.semesters {
        println!(
            "{:<20} {:>6}  gpa={:.2}  courses={}  credits={}",
            semester.name, semester.year, semester.gpa, semester.course_count, semester.credit_hours
        );
    }
    println!(
        "cumulative ({}): {:.2} over {} course(s), {} credit(s)",
        if weighted { "weighted" } else { "unweighted" },
        summary.cumulative_gpa,
        summary.course_count,
        summary.credit_hours
    );
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let today = Local::now().date_naive();

    let notes = NoteService::new(&store).context("failed to load notes")?;
    let academics = AcademicService::new(&store).context("failed to load semesters")?;
    let finance = FinanceService::new(&store).context("failed to load finance data")?;
    let calendar = CalendarService::new(&store).context("failed to load events")?;
    let study = StudyService::new(&store).context("failed to load study tools")?;

    let gpa = academics.summary(true);
    println!("notes:       {}", notes.notes().len());
    println!(
        "semesters:   {} ({} courses, gpa {:.2})",
        gpa.semesters.len(),
        gpa.course_count,
        gpa.cumulative_gpa
    );
    println!(
        "expenses:    {} (this month ${:.2})",
        finance.expenses().len(),
        finance.monthly_total(today)
    );
    println!("goals:       {}", finance.goals().len());
    println!(
        "events:      {} ({} homework open)",
        calendar.events().len(),
        calendar.homework(today).len()
    );
    println!("flashcards:  {}", study.flashcards().len());
    println!("quiz:        {}", study.quiz().len());
    Ok(())
}

fn cmd_export(cli: &Cli, path: Option<&Path>) -> Result<()> {
    let store = open_store(cli)?;
    let bundle = BackupService::new(&store)
        .export_bundle(Utc::now())
        .context("failed to export collections")?;

    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
    std::fs::write(&path, &bundle)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        "event=cli_export module=cli status=ok path={} bytes={}",
        path.display(),
        bundle.len()
    );

    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(cli: &Cli, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let store = open_store(cli)?;
    let report = BackupService::new(&store)
        .import_bundle(&raw)
        .context("invalid backup file")?;
    info!(
        "event=cli_import module=cli status=ok path={} written={} skipped={}",
        path.display(),
        report.written.len(),
        report.skipped.len()
    );

    println!(
        "imported from {}. written={}, skipped={}",
        path.display(),
        report.written.join(","),
        report.skipped.join(",")
    );
    Ok(())
}

fn cmd_clear(cli: &Cli, confirmed: bool) -> Result<()> {
    if !confirmed {
        warn!("event=cli_clear module=cli status=refused reason=missing_confirmation");
        bail!("refusing to clear all data without --yes");
    }
    let store = open_store(cli)?;
    BackupService::new(&store)
        .clear_all()
        .context("failed to clear data")?;
    info!("event=cli_clear module=cli status=ok");
    println!("cleared all StudyHub data in {}", db_path(cli).display());
    Ok(())
}
