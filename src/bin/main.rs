//! Soarbase CLI - inspect and maintain Soar project databases
//!
//! Usage:
//!   soarbase [--db <path>] new <agent>
//!   soarbase [--db <path>] dump
//!   soarbase [--db <path>] restore <dump-file>
//!   soarbase [--db <path>] datamap <agent> <problem-space> [--dry-run]
//!   soarbase [--db <path>] search <agent> <problem-space> <attribute>
//!
//! The database path defaults to `database_path` from soarbase.toml (or
//! `project.soar` when no config file exists). Proposed datamap corrections
//! are applied only when `auto_apply_corrections` is set.
//!
//! Examples:
//!   soarbase new my-agent
//!   soarbase --db project.soar dump > backup.sql
//!   soarbase datamap my-agent top-space --dry-run

use clap::{Parser, Subcommand};
use soarbase::config::Settings;
use soarbase::datamap::{
    apply_corrections, find_rules_using_attribute, propose_datamap_corrections, NullProgress,
};
use soarbase::graph::Row;
use soarbase::schema::Table;
use soarbase::storage::{Storage, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "soarbase")]
#[command(about = "Soarbase - a persisted relational graph engine for Soar projects")]
#[command(version)]
struct Cli {
    /// Project database path (defaults to database_path from soarbase.toml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project database with one agent
    New {
        /// Name of the agent to create
        agent: String,
    },

    /// Print the project as replayable SQL
    Dump,

    /// Replay a SQL dump into a project database
    Restore {
        /// Dump file produced by `dump`
        dump_file: PathBuf,
    },

    /// Propose (and optionally apply) datamap corrections for a problem space
    Datamap {
        /// Agent name
        agent: String,

        /// Problem space name
        problem_space: String,

        /// Print proposed corrections without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// List rules in a problem space's scope that use an attribute
    Search {
        /// Agent name
        agent: String,

        /// Problem space name
        problem_space: String,

        /// Attribute name to look for
        attribute: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let settings = Settings::load().map_err(|e| e.to_string())?;
    let db = database_path(cli.db, &settings);

    match cli.command {
        Commands::New { agent } => cmd_new(db, agent),
        Commands::Dump => cmd_dump(db),
        Commands::Restore { dump_file } => cmd_restore(db, dump_file),
        Commands::Datamap {
            agent,
            problem_space,
            dry_run,
        } => cmd_datamap(
            db,
            agent,
            problem_space,
            dry_run,
            settings.project.auto_apply_corrections,
        ),
        Commands::Search {
            agent,
            problem_space,
            attribute,
        } => cmd_search(db, agent, problem_space, attribute),
    }
}

/// The `--db` argument wins over the configured path.
fn database_path(arg: Option<PathBuf>, settings: &Settings) -> PathBuf {
    arg.unwrap_or_else(|| PathBuf::from(&settings.project.database_path))
}

fn open(db: &PathBuf) -> Result<Storage, String> {
    Storage::open(db).map_err(|e| format!("opening '{}': {}", db.display(), e))
}

fn find_named<'db>(
    storage: &'db Storage,
    table: Table,
    name: &str,
) -> Result<Row<'db>, String> {
    let rows = Row::all_in_table(storage, table).map_err(|e| e.to_string())?;
    rows.into_iter()
        .find(|row| row.name() == name)
        .ok_or_else(|| format!("no {} named '{}'", table.short_name(), name))
}

fn find_problem_space<'db>(
    storage: &'db Storage,
    agent: &str,
    problem_space: &str,
) -> Result<Row<'db>, String> {
    let agent_row = find_named(storage, Table::Agents, agent)?;
    agent_row
        .children_of_type(Table::ProblemSpaces)
        .map_err(|e| e.to_string())?
        .into_iter()
        .find(|row| row.name() == problem_space)
        .ok_or_else(|| format!("agent '{}' has no problem space '{}'", agent, problem_space))
}

fn cmd_new(db: PathBuf, agent: String) -> Result<(), String> {
    let storage = open(&db)?;
    storage
        .insert(Table::Agents, &[("name", Value::text(agent.as_str()))])
        .map_err(|e| e.to_string())?;
    println!("Created agent '{}' in {}", agent, db.display());
    Ok(())
}

fn cmd_dump(db: PathBuf) -> Result<(), String> {
    let storage = open(&db)?;
    let dump = storage.sql_dump().map_err(|e| e.to_string())?;
    print!("{}", dump);
    Ok(())
}

fn cmd_restore(db: PathBuf, dump_file: PathBuf) -> Result<(), String> {
    let storage = open(&db)?;
    storage
        .restore_from_dump_file(&dump_file)
        .map_err(|e| format!("restoring from '{}': {}", dump_file.display(), e))?;
    println!("Restored {} from {}", db.display(), dump_file.display());
    Ok(())
}

fn cmd_datamap(
    db: PathBuf,
    agent: String,
    problem_space: String,
    dry_run: bool,
    auto_apply: bool,
) -> Result<(), String> {
    let storage = open(&db)?;
    let space = find_problem_space(&storage, &agent, &problem_space)?;
    let (set, mut corrections) =
        propose_datamap_corrections(&space, &mut NullProgress).map_err(|e| e.to_string())?;

    if corrections.is_empty() {
        println!("Datamap already covers every terminal path.");
        return Ok(());
    }
    for correction in &corrections {
        println!("{}", correction.describe(&set));
    }
    if dry_run {
        return Ok(());
    }
    if !auto_apply {
        println!("Set auto_apply_corrections = true in soarbase.toml to apply.");
        return Ok(());
    }
    apply_corrections(&space, &set, &mut corrections).map_err(|e| e.to_string())?;
    println!("Applied {} correction(s).", corrections.len());
    Ok(())
}

fn cmd_search(
    db: PathBuf,
    agent: String,
    problem_space: String,
    attribute: String,
) -> Result<(), String> {
    let storage = open(&db)?;
    let space = find_problem_space(&storage, &agent, &problem_space)?;
    let rules = find_rules_using_attribute(&space, &attribute, &mut NullProgress)
        .map_err(|e| e.to_string())?;
    if rules.is_empty() {
        println!("No rules use ^{}", attribute);
        return Ok(());
    }
    for rule in rules {
        println!("{}", rule.name());
    }
    Ok(())
}
