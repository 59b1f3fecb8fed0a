// ABOUTME: CLI entry point for mysql-dump-migrator
// ABOUTME: Parses commands and routes to appropriate handlers

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mysql_dump_migrator::commands::{self, profile, DumpOptions};
use mysql_dump_migrator::config::{load_migration_job, resolve_connection};
use mysql_dump_migrator::connection::{ConnectionDescriptor, DEFAULT_PORT};
use mysql_dump_migrator::migration::{DumpMode, MigrationPlan, DEFAULT_BATCH_SIZE};
use mysql_dump_migrator::profiles::{ConnectionProfile, ProfileStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mysql-dump-migrator")]
#[command(about = "Table-by-table MySQL dumps and schema migration by dump replay", long_about = None)]
struct Cli {
    /// Directory holding connections.json and settings.json
    #[arg(long, global = true, env = "MYSQL_DUMP_MIGRATOR_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export schema and/or data of selected tables to a SQL file
    Dump {
        /// mysql:// URL or saved connection name
        #[arg(long)]
        source: String,
        /// Schema to export (overrides the one in the URL or profile)
        #[arg(long)]
        database: Option<String>,
        /// Tables to export (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,
        /// Export every base table of the schema
        #[arg(long, conflicts_with = "tables")]
        all_tables: bool,
        #[arg(long, value_enum, default_value_t = DumpMode::Both)]
        mode: DumpMode,
        /// Output file (defaults to <database>.sql)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Rows per INSERT statement
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Take the data section from mysqldump instead of the built-in serializer
        #[arg(long)]
        use_mysqldump: bool,
        /// Interactive mode for selecting tables
        #[arg(long)]
        interactive: bool,
    },
    /// Keep only the schema or data part of a whole-database dump file
    Filter {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        mode: DumpMode,
    },
    /// Copy tables from a source schema into a target schema
    Migrate {
        /// Migration job file (TOML); cannot be combined with the plan flags
        #[arg(long, conflicts_with_all = [
            "source",
            "target",
            "source_database",
            "target_database",
            "tables",
            "mode",
            "batch_size",
        ])]
        config: Option<PathBuf>,
        /// mysql:// URL or saved connection name
        #[arg(long, required_unless_present = "config")]
        source: Option<String>,
        #[arg(long, required_unless_present = "config")]
        target: Option<String>,
        #[arg(long)]
        source_database: Option<String>,
        #[arg(long)]
        target_database: Option<String>,
        /// Tables to migrate (comma-separated); all base tables when omitted
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,
        #[arg(long, value_enum, default_value_t = DumpMode::Both)]
        mode: DumpMode,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Interactive mode for selecting tables
        #[arg(long)]
        interactive: bool,
    },
    /// List the base tables of a schema with row and size estimates
    Tables {
        #[arg(long)]
        source: String,
        #[arg(long)]
        database: Option<String>,
    },
    /// List the schemas visible to a connection
    Databases {
        #[arg(long)]
        source: String,
    },
    /// Check that a server is reachable with the given credentials
    TestConnection {
        #[arg(long)]
        source: String,
    },
    /// Manage saved connections
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show or change application settings
    Settings {
        /// Path to the mysqldump binary; an empty value means search PATH
        #[arg(long)]
        mysqldump_path: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List saved connections
    List,
    /// Save a new connection
    Add {
        name: String,
        #[arg(long)]
        host: String,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        #[arg(long)]
        user: String,
        #[arg(long, env = "MYSQL_PWD", default_value = "", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        database: String,
    },
    /// Change fields of a saved connection
    Update {
        /// Name or id of the connection
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        database: Option<String>,
    },
    /// Delete a saved connection
    Remove {
        /// Name or id of the connection
        name: String,
    },
}

fn connection(
    reference: &str,
    database: Option<String>,
    store: &ProfileStore,
) -> Result<ConnectionDescriptor> {
    let descriptor = resolve_connection(reference, store)?;
    Ok(match database {
        Some(db) => descriptor.with_database(db),
        None => descriptor,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut store = match cli.config_dir {
        Some(dir) => ProfileStore::load(dir)?,
        None => ProfileStore::load_default()?,
    };

    match cli.command {
        Commands::Dump {
            source,
            database,
            tables,
            all_tables,
            mode,
            output,
            batch_size,
            use_mysqldump,
            interactive,
        } => {
            let source = connection(&source, database, &store)?;
            let options = DumpOptions {
                mode,
                tables,
                all_tables,
                interactive,
                output,
                batch_size,
                use_mysqldump,
            };
            commands::dump(&source, options, store.settings()).await?;
            Ok(())
        }
        Commands::Filter {
            input,
            output,
            mode,
        } => commands::filter(&input, output.as_deref(), mode),
        Commands::Migrate {
            config,
            source,
            target,
            source_database,
            target_database,
            tables,
            mode,
            batch_size,
            yes,
            interactive,
        } => {
            let plan = match (config, source, target) {
                (Some(path), _, _) => load_migration_job(&path)?.into_plan(&store)?,
                (None, Some(source), Some(target)) => MigrationPlan::new(
                    connection(&source, source_database, &store)?,
                    connection(&target, target_database, &store)?,
                    mode,
                )
                .with_tables(tables)
                .with_batch_size(batch_size),
                _ => bail!("Either --config or both --source and --target are required"),
            };
            commands::migrate(plan, interactive, yes).await?;
            Ok(())
        }
        Commands::Tables { source, database } => {
            commands::tables(&connection(&source, database, &store)?).await
        }
        Commands::Databases { source } => {
            commands::databases(&connection(&source, None, &store)?).await
        }
        Commands::TestConnection { source } => {
            commands::test_connection(&connection(&source, None, &store)?).await
        }
        Commands::Profile { action } => match action {
            ProfileAction::List => {
                profile::list(&store);
                Ok(())
            }
            ProfileAction::Add {
                name,
                host,
                port,
                user,
                password,
                database,
            } => {
                let new_profile = ConnectionProfile {
                    id: String::new(),
                    name,
                    host,
                    port,
                    user,
                    password,
                    database,
                };
                profile::add(&mut store, new_profile).map(|_| ())
            }
            ProfileAction::Update {
                name,
                rename,
                host,
                port,
                user,
                password,
                database,
            } => profile::update(&mut store, &name, |p| {
                if let Some(v) = rename {
                    p.name = v;
                }
                if let Some(v) = host {
                    p.host = v;
                }
                if let Some(v) = port {
                    p.port = v;
                }
                if let Some(v) = user {
                    p.user = v;
                }
                if let Some(v) = password {
                    p.password = v;
                }
                if let Some(v) = database {
                    p.database = v;
                }
            }),
            ProfileAction::Remove { name } => profile::remove(&mut store, &name),
        },
        Commands::Settings { mysqldump_path } => profile::settings(&mut store, mysqldump_path),
    }
}
