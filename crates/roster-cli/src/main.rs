//! `roster` — import staff rosters, HR exports and visa-request lists into
//! the roster store.
//!
//! # Usage
//!
//! ```text
//! roster staff  roster.csv
//! roster visa   requests.csv --json
//! roster smarthr crew.csv
//! roster resolve "派遣-スグクル(株)"
//! roster alias 0b6f0c5e-... "スグクル"
//! ```
//!
//! Settings come from `roster.toml` (or `--config`) and `ROSTER_*`
//! environment variables; see [`settings::Settings`].

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use roster_core::store::RosterStore as _;
use roster_import::{
  CaseUpsertEngine, MappingTables, OrganizationResolver, PersonUpsertEngine, RowHandler, run,
};
use roster_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Foreign-worker roster importer")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "roster.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
  /// Import the staff roster export.
  Staff(ImportArgs),
  /// Import the visa-request list.
  Visa(ImportArgs),
  /// Import the SmartHR crew export.
  Smarthr(ImportArgs),
  /// Resolve a company name to an organization id, creating it if needed.
  Resolve { name: String },
  /// Register a manual alias for an organization.
  Alias { org_id: Uuid, alias: String },
}

#[derive(clap::Args, Debug, PartialEq, Eq)]
struct ImportArgs {
  /// CSV file to import.
  csv: PathBuf,

  /// Print the summary as JSON.
  #[arg(long)]
  json: bool,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let tables = Arc::new(load_tables(&settings).await?);

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let store = Arc::new(store);

  let tenant = store
    .ensure_tenant(settings.tenant.clone())
    .await
    .with_context(|| format!("failed to open tenant {:?}", settings.tenant))?;

  match cli.command {
    Command::Staff(args) => {
      let engine = PersonUpsertEngine::staff_roster(store, tables);
      import(&args, tenant.tenant_id, &engine).await
    }
    Command::Visa(args) => {
      let engine = CaseUpsertEngine::new(store, tables);
      import(&args, tenant.tenant_id, &engine).await
    }
    Command::Smarthr(args) => {
      let engine = PersonUpsertEngine::smarthr(store, tables);
      import(&args, tenant.tenant_id, &engine).await
    }
    Command::Resolve { name } => {
      let resolver = OrganizationResolver::new(store, tables);
      match resolver.resolve(&name, tenant.tenant_id).await? {
        Some(org_id) => println!("{org_id}"),
        None => bail!("company name is blank"),
      }
      Ok(())
    }
    Command::Alias { org_id, alias } => {
      let resolver = OrganizationResolver::new(store, tables);
      if resolver.register_alias(org_id, &alias).await? {
        println!("registered {alias:?} for {org_id}");
      } else {
        println!("alias {alias:?} is blank or already taken");
      }
      Ok(())
    }
  }
}

/// Built-in tables, or the ones in the configured file.
async fn load_tables(settings: &Settings) -> anyhow::Result<MappingTables> {
  let Some(path) = &settings.tables else {
    return Ok(MappingTables::default());
  };
  let text = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read mapping tables {path:?}"))?;
  MappingTables::from_toml_str(&text)
    .with_context(|| format!("failed to parse mapping tables {path:?}"))
}

/// Run one CSV through `handler` and print the summary. Row errors are
/// reported but do not fail the command; an aborted run does.
async fn import<H>(args: &ImportArgs, tenant_id: Uuid, handler: &H) -> anyhow::Result<()>
where
  H: RowHandler<Store = SqliteStore>,
{
  let text = tokio::fs::read_to_string(&args.csv)
    .await
    .with_context(|| format!("failed to read {:?}", args.csv))?;

  let (summary, aborted) = match run(&text, tenant_id, handler).await {
    Ok(summary) => (summary, None),
    Err(aborted) => (aborted.summary.clone(), Some(aborted)),
  };

  if args.json {
    println!("{}", serde_json::to_string_pretty(&summary)?);
  } else {
    print!("{summary}");
  }

  match aborted {
    Some(aborted) => Err(aborted.into()),
    None => Ok(()),
  }
}
