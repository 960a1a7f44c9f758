use clap::{Parser, Subcommand};
use skating_importer::{
    BatchCorrections, CategoryAnalyzer, ClubRegistry, CoachTransitionBuilder, ImportConfig,
    ImportService, ImportSession, RankDictionary, assign_judge_roles, similarity::SequenceMatcher,
    xml,
};
use skating_storage::{Database, MemoryDatabase, PgDatabase, Store};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "skate-import")]
#[command(about = "Figure skating results importer for CalcFS XML exports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Use an in-memory store instead of PostgreSQL; nothing is persisted.
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// JSON rank dictionary replacing the built-in one.
    #[arg(long)]
    rank_dictionary: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and show what it contains, without touching a store.
    Parse { file: PathBuf },
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// JSON object: file name -> { category index -> corrected name }.
        #[arg(long)]
        corrections: Option<PathBuf>,

        /// Skip the club merge pass after registering each file's clubs.
        #[arg(long)]
        no_club_merge: bool,

        /// Build coach history inside each file's transaction.
        #[arg(long)]
        coach_history: bool,
    },
    MergeClubs,
    CoachHistory,
    JudgeRoles {
        /// Only report the roles that would be assigned.
        #[arg(long)]
        dry_run_roles: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "skate_import={0},skating_importer={0},skating_storage={0}",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let dictionary = match &cli.rank_dictionary {
        Some(path) => {
            tracing::info!("Loading rank dictionary from: {}", path.display());
            RankDictionary::load(path).await?
        }
        None => RankDictionary::default(),
    };

    if let Commands::Parse { file } = &cli.command {
        return handle_parse(file, &dictionary).await;
    }

    if cli.dry_run {
        tracing::info!("Dry run: using an in-memory store");
        let db = MemoryDatabase::new();
        return run(&db, cli.command, &dictionary).await;
    }

    let database_url = cli
        .database_url
        .as_deref()
        .ok_or("DATABASE_URL is required unless --dry-run is given")?;
    tracing::info!("Connecting to database...");
    let db = PgDatabase::connect(database_url, cli.max_connections).await?;
    db.migrate().await?;

    run(&db, cli.command, &dictionary).await
}

async fn run<D: Database>(
    db: &D,
    command: Commands,
    dictionary: &RankDictionary,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Parse { file } => handle_parse(&file, dictionary).await,
        Commands::Import {
            files,
            corrections,
            no_club_merge,
            coach_history,
        } => {
            let config = ImportConfig {
                merge_clubs_after_import: !no_club_merge,
                build_coach_history: coach_history,
                ..Default::default()
            };
            handle_import(db, &files, corrections.as_deref(), dictionary, config).await
        }
        Commands::MergeClubs => handle_merge_clubs(db).await,
        Commands::CoachHistory => {
            let report = CoachTransitionBuilder::new().run(db).await?;
            tracing::info!(
                "Coach history: {} participations, {} periods created, {} transitions, {} backdated, {} skipped",
                report.processed,
                report.created,
                report.transitions,
                report.backdated,
                report.skipped
            );
            Ok(())
        }
        Commands::JudgeRoles { dry_run_roles } => handle_judge_roles(db, dry_run_roles).await,
    }
}

async fn handle_parse(file: &Path, dictionary: &RankDictionary) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Parsing: {}", file.display());
    let parsed = xml::parse_file(file).await?;

    if let Some(event) = parsed.event() {
        tracing::info!(
            "Event: {} ({})",
            event.name,
            event
                .begin_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "no date".to_string())
        );
    }
    tracing::info!(
        "{} categories, {} segments, {} judges, {} persons, {} clubs, {} participants, {} performances",
        parsed.categories.len(),
        parsed.segments.len(),
        parsed.judges.len(),
        parsed.persons.len(),
        parsed.clubs.len(),
        parsed.participants.len(),
        parsed.performances.len()
    );

    let analyzer = CategoryAnalyzer::new(dictionary);
    for suggestion in analyzer.analyze(&parsed.categories) {
        let marker = if suggestion.needs_review { "review" } else { "ok" };
        tracing::info!(
            "  [{}] {} -> {} ({})",
            suggestion.index,
            suggestion.original_name,
            suggestion.suggested_name,
            marker
        );
    }

    Ok(())
}

async fn handle_import<D: Database>(
    db: &D,
    files: &[PathBuf],
    corrections: Option<&Path>,
    dictionary: &RankDictionary,
    config: ImportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let corrections: BatchCorrections = match corrections {
        Some(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            serde_json::from_str(&content)?
        }
        None => BatchCorrections::new(),
    };

    let service = ImportService::new(db, dictionary, config);
    let report = service.import_batch(files, &corrections).await;

    for summary in &report.succeeded {
        tracing::info!(
            "  ✓ {}: event {}, {} athletes, {} clubs ({} merged), {} participants, {} performances",
            summary.file,
            summary.event_id,
            summary.athletes,
            summary.clubs,
            summary.clubs_merged,
            summary.participants,
            summary.performances
        );
        for pending in &summary.pending_categories {
            tracing::warn!(
                "    category [{}] '{}' saved as '{}', needs review",
                pending.index,
                pending.name,
                pending.suggested_name
            );
        }
    }
    for failed in &report.failed {
        let kind = if failed.error.is_conflict() { " (conflict)" } else { "" };
        tracing::error!("  ✗ {}{}: {}", failed.file, kind, failed.error);
    }

    if !report.is_success() {
        return Err(format!("{} file(s) failed to import", report.failed.len()).into());
    }
    Ok(())
}

async fn handle_merge_clubs<D: Database>(db: &D) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = db.begin().await?;
    let mut session = ImportSession::new();
    let merges = ClubRegistry::<SequenceMatcher>::default()
        .merge_all_duplicates(&mut store, &mut session)
        .await?;
    store.commit().await?;

    let moved: u64 = merges.iter().map(|m| m.athletes_moved).sum();
    tracing::info!("Merged {} club(s), {} athlete(s) moved", merges.len(), moved);
    Ok(())
}

async fn handle_judge_roles<D: Database>(db: &D, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = db.begin().await?;
    let changes = assign_judge_roles(&mut store, dry_run).await?;
    if dry_run {
        store.rollback().await?;
        for change in &changes {
            tracing::info!(
                "  segment {} judge {} seat {} -> {}",
                change.segment_id,
                change.judge_id,
                change.order_num,
                change.role.as_code()
            );
        }
    } else {
        store.commit().await?;
    }
    tracing::info!("{} panel role(s) {}", changes.len(), if dry_run { "to update" } else { "updated" });
    Ok(())
}
