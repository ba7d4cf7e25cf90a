//! Lectio CLI
//!
//! Command-line interface for Lectio - the reading practice catalog.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lectio_core::Config;

mod commands;
mod engine;
mod output;

use engine::Engine;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "lectio")]
#[command(about = "Lectio - local-first reading practice catalog")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a reading to the catalog
    Add {
        /// Reading date (YYYY-MM-DD)
        date: String,
        /// Display title
        title: String,
        /// Full text content (reads stdin when omitted)
        #[arg(short, long)]
        content: Option<String>,
        /// Reading type (gospel, first-reading, psalm, second-reading, responsorial)
        #[arg(short = 't', long, default_value = "gospel")]
        reading_type: String,
        /// Citation reference
        #[arg(short, long)]
        reference: Option<String>,
        /// Difficulty 1-5
        #[arg(short, long, default_value_t = 1)]
        difficulty: u8,
        /// Two-letter language code
        #[arg(short, long, default_value = "en")]
        language: String,
    },
    /// List readings
    #[command(alias = "ls")]
    List {
        /// Only readings for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Filter by reading type
        #[arg(short = 't', long)]
        reading_type: Option<String>,
        /// Filter by language
        #[arg(short, long)]
        language: Option<String>,
        /// Only favorites
        #[arg(short, long)]
        favorites: bool,
        /// Maximum rows
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show a reading in full
    Show {
        /// Reading ID
        id: String,
    },
    /// Search readings by text
    Search {
        /// Search query
        query: String,
        /// Maximum results
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Popular readings (favorites first, then newest)
    Popular {
        /// Maximum results
        #[arg(long, default_value_t = lectio_core::content::FEATURED_COUNT)]
        limit: usize,
    },
    /// Recommended readings across difficulty levels
    Recommend {
        /// Owner of the recommendations
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Manage favorites
    #[command(alias = "fav")]
    Favorite {
        #[command(subcommand)]
        command: FavoriteCommands,
    },
    /// Search history analytics
    Analytics,
    /// Catalog statistics
    Stats,
    /// Export the catalog
    Export {
        /// Output format (json or csv)
        #[arg(short, long, default_value = "json")]
        format: String,
        /// What to include (full, readings, favorites, custom)
        #[arg(long, default_value = "full")]
        data_type: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Import a JSON export
    Import {
        /// File to import
        file: String,
        /// Clear the catalog first
        #[arg(long)]
        overwrite: bool,
        /// Skip readings whose id already exists
        #[arg(long)]
        skip_duplicates: bool,
        /// Restore favorite membership from the file
        #[arg(long)]
        favorites: bool,
    },
    /// Manage backups
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Cloud synchronization
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Validate the catalog
    Validate {
        /// Also run the cross-record integrity scan
        #[arg(long)]
        integrity: bool,
    },
    /// Show engine and catalog status
    Status,
    /// Show configuration
    Config,
}

#[derive(Subcommand)]
enum FavoriteCommands {
    /// Favorite a reading
    Add {
        /// Reading ID
        id: String,
    },
    /// Unfavorite a reading
    #[command(alias = "rm")]
    Remove {
        /// Reading ID
        id: String,
    },
    /// List favorited readings
    #[command(alias = "ls")]
    List,
    /// Favorites statistics
    Stats,
    /// Manage named collections
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// Create a collection
    Create {
        /// Collection name
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a collection
    #[command(alias = "rm")]
    Delete {
        /// Collection ID
        id: String,
    },
    /// Add a reading to a collection
    Add {
        /// Collection ID
        collection: String,
        /// Reading ID
        reading: String,
    },
    /// Remove a reading from a collection
    Remove {
        /// Collection ID
        collection: String,
        /// Reading ID
        reading: String,
    },
    /// List collections
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum BackupCommands {
    /// Create a named backup
    Create {
        /// Backup label
        name: String,
    },
    /// List backups, oldest first
    #[command(alias = "ls")]
    List,
    /// Restore a backup, replacing the catalog
    Restore {
        /// Backup ID
        id: String,
    },
    /// Delete a backup
    #[command(alias = "rm")]
    Delete {
        /// Backup ID
        id: String,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Run a sync now
    Now,
    /// Show sync engine status
    Status,
    /// List unresolved conflicts
    Conflicts,
    /// Resolve a conflict (policy: local, cloud, merge)
    Resolve {
        /// Conflict ID
        id: String,
        /// Resolution policy
        policy: String,
    },
    /// Run the validate-then-sync workflow
    Workflow,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    // Config display doesn't need the engine
    if matches!(cli.command, Commands::Config) {
        return commands::status::show_config(&output);
    }

    let config = Config::load()?;
    let engine = Engine::bootstrap(config)?;
    let failures = engine.start().await;
    if !failures.is_empty() && !output.is_quiet() {
        eprintln!("⚠ Services failed to initialize: {}", failures.join(", "));
    }

    let result = dispatch(cli.command, &engine, &output).await;

    engine.stop().await;
    result
}

async fn dispatch(command: Commands, engine: &Engine, output: &Output) -> Result<()> {
    match command {
        Commands::Add {
            date,
            title,
            content,
            reading_type,
            reference,
            difficulty,
            language,
        } => {
            commands::reading::add(
                engine, date, title, content, reading_type, reference, difficulty, language, output,
            )
            .await
        }
        Commands::List {
            date,
            reading_type,
            language,
            favorites,
            limit,
            offset,
        } => {
            commands::reading::list(
                engine, date, reading_type, language, favorites, limit, offset, output,
            )
            .await
        }
        Commands::Show { id } => commands::reading::show(engine, id, output).await,
        Commands::Search { query, limit } => {
            commands::search::search(engine, query, limit, output).await
        }
        Commands::Popular { limit } => commands::reading::popular(engine, limit, output).await,
        Commands::Recommend { user } => commands::reading::recommend(engine, user, output).await,
        Commands::Favorite { command } => handle_favorite_command(command, engine, output).await,
        Commands::Analytics => commands::search::analytics(engine, output).await,
        Commands::Stats => commands::stats::show(engine, output).await,
        Commands::Export {
            format,
            data_type,
            output: file,
        } => commands::export::export(engine, format, data_type, file, output).await,
        Commands::Import {
            file,
            overwrite,
            skip_duplicates,
            favorites,
        } => commands::export::import(engine, file, overwrite, skip_duplicates, favorites, output).await,
        Commands::Backup { command } => handle_backup_command(command, engine, output).await,
        Commands::Sync { command } => handle_sync_command(command, engine, output).await,
        Commands::Validate { integrity } => {
            commands::validate::run(engine, integrity, output).await
        }
        Commands::Status => commands::status::show(engine, output).await,
        Commands::Config => unreachable!(), // Handled above
    }
}

async fn handle_favorite_command(
    command: FavoriteCommands,
    engine: &Engine,
    output: &Output,
) -> Result<()> {
    match command {
        FavoriteCommands::Add { id } => commands::favorite::add(engine, id, output).await,
        FavoriteCommands::Remove { id } => commands::favorite::remove(engine, id, output).await,
        FavoriteCommands::List => commands::favorite::list(engine, output).await,
        FavoriteCommands::Stats => commands::favorite::stats(engine, output).await,
        FavoriteCommands::Collection { command } => match command {
            CollectionCommands::Create { name, description } => {
                commands::favorite::create_collection(engine, name, description, output)
            }
            CollectionCommands::Delete { id } => {
                commands::favorite::delete_collection(engine, id, output)
            }
            CollectionCommands::Add {
                collection,
                reading,
            } => commands::favorite::add_to_collection(engine, collection, reading, output),
            CollectionCommands::Remove {
                collection,
                reading,
            } => commands::favorite::remove_from_collection(engine, collection, reading, output),
            CollectionCommands::List => commands::favorite::list_collections(engine, output),
        },
    }
}

async fn handle_backup_command(
    command: BackupCommands,
    engine: &Engine,
    output: &Output,
) -> Result<()> {
    match command {
        BackupCommands::Create { name } => commands::backup::create(engine, name, output).await,
        BackupCommands::List => commands::backup::list(engine, output),
        BackupCommands::Restore { id } => commands::backup::restore(engine, id, output).await,
        BackupCommands::Delete { id } => commands::backup::delete(engine, id, output),
    }
}

async fn handle_sync_command(
    command: Option<SyncCommands>,
    engine: &Engine,
    output: &Output,
) -> Result<()> {
    match command {
        Some(SyncCommands::Now) | None => commands::sync::sync_now(engine, output).await,
        Some(SyncCommands::Status) => commands::sync::status(engine, output),
        Some(SyncCommands::Conflicts) => commands::sync::conflicts(engine, output),
        Some(SyncCommands::Resolve { id, policy }) => {
            commands::sync::resolve(engine, id, policy, output).await
        }
        Some(SyncCommands::Workflow) => commands::sync::workflow(engine, output).await,
    }
}
