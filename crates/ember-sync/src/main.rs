//! ember-sync CLI
//!
//! Command-line tool for reconciling a SQLite database with declared tables.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ember_sync::prelude::*;

/// Reconciles a SQLite database with declared tables.
#[derive(Parser)]
#[command(name = "ember-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the database in line with a declaration file.
    Sync {
        /// JSON file declaring the tables.
        #[arg(short, long)]
        schema: PathBuf,

        /// Keep rows when removing undeclared columns.
        #[arg(short, long)]
        preserve: bool,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the live columns of a table.
    Inspect {
        /// Table name.
        table: String,
    },

    /// Check whether a table exists.
    Exists {
        /// Table name.
        table: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = SqliteConnectOptions::from_str(&cli.database)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    match cli.command {
        Commands::Sync {
            schema,
            preserve,
            dry_run,
        } => {
            let declaration = SchemaDeclaration::load(&schema)?;
            info!(
                path = %schema.display(),
                tables = declaration.tables.len(),
                "Loaded declaration"
            );
            let sync = SchemaSync::new(pool).tables(declaration.tables);

            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
                for planned in sync.plan(preserve).await? {
                    println!("-- {}: {}", planned.table, planned.outcome);
                    for sql in &planned.statements {
                        println!("{sql};");
                    }
                }
            } else {
                let report = sync.sync_schema(preserve).await?;
                for (table, outcome) in &report {
                    println!("{table}: {outcome}");
                }
            }
        }

        Commands::Inspect { table } => {
            let sync = SchemaSync::new(pool);
            if !sync.table_exists(&table).await? {
                println!("Table '{table}' does not exist.");
                return Ok(());
            }

            println!("\n{table}");
            println!("{:-<60}", "");
            for column in sync.live_columns(&table).await? {
                println!(
                    " {:>3} {:<24} {:<10}{}{}{}",
                    column.ordinal,
                    column.name,
                    column.declared_type,
                    if column.not_null { " NOT NULL" } else { "" },
                    if column.is_primary_key() {
                        format!(" PK#{}", column.pk_ordinal)
                    } else {
                        String::new()
                    },
                    column
                        .default_literal
                        .as_deref()
                        .map(|d| format!(" DEFAULT {d}"))
                        .unwrap_or_default(),
                );
            }
            println!();
        }

        Commands::Exists { table } => {
            let exists = SchemaSync::new(pool).table_exists(&table).await?;
            println!("{exists}");
        }
    }

    Ok(())
}
