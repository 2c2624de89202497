//! `phonebook`: command-line front end for the company phone directory.
//!
//! # Usage
//!
//! ```text
//! phonebook import staff.xlsx --user admin
//! phonebook tree
//! phonebook employees --department 4
//! phonebook --config ~/.config/phonebook/phonebook.toml logs --limit 5
//! ```
//!
//! Settings come from `phonebook.toml` (or `--config`), overridden by
//! `PHONEBOOK_*` environment variables, overridden by flags.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use phonebook_core::{
  department::DepartmentId,
  employee::{Employee, EmployeeId},
  import::{ImportSource, Reconciler},
  rank::RankScale,
  store::{DirectoryStore, EmployeeQuery},
  tree::{DepartmentTree, DirectoryNode},
};
use phonebook_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "phonebook", version, about = "Company phone directory")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "phonebook.toml")]
  config: PathBuf,

  /// SQLite database file (overrides `store_path`).
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  /// Rank scale: `standard` (8 levels) or `legacy` (5 levels).
  #[arg(long)]
  scale: Option<RankScale>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reconcile a staff spreadsheet into the directory.
  Import {
    file: PathBuf,
    /// Recorded in the import log as the uploader.
    #[arg(long)]
    user: Option<String>,
  },
  /// Print departments with their employees.
  Tree,
  /// List employees, optionally limited to a department subtree.
  Employees {
    #[arg(long, conflicts_with = "unassigned")]
    department: Option<i64>,
    /// Only employees without a department.
    #[arg(long)]
    unassigned: bool,
  },
  /// Print one employee as JSON.
  Show { id: i64 },
  DeleteEmployee { id: i64 },
  /// Delete a department and its sub-departments. Their employees are kept.
  DeleteDepartment { id: i64 },
  /// Show past import runs, newest first.
  Logs {
    #[arg(long)]
    limit: Option<usize>,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Settings {
  store_path: PathBuf,
  rank_scale: RankScale,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("phonebook.db"),
      rank_scale: RankScale::default(),
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so JSON on stdout stays parseable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config.as_path()).required(false))
    .add_source(config::Environment::with_prefix("PHONEBOOK"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let store_path = expand_tilde(cli.store.as_deref().unwrap_or(&settings.store_path));
  let scale = cli.scale.unwrap_or(settings.rank_scale);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Import { file, user } => import(&store, scale, file, user).await,
    Command::Tree => print_tree(&store, scale).await,
    Command::Employees { department, unassigned } => {
      let query = EmployeeQuery { department: department.map(DepartmentId), unassigned };
      list_employees(&store, &query).await
    }
    Command::Show { id } => show(&store, EmployeeId(id)).await,
    Command::DeleteEmployee { id } => {
      if !store.delete_employee(EmployeeId(id)).await? {
        bail!("no employee with id {id}");
      }
      println!("deleted employee {id}");
      Ok(())
    }
    Command::DeleteDepartment { id } => {
      if !store.delete_department(DepartmentId(id)).await? {
        bail!("no department with id {id}");
      }
      println!("deleted department {id} and its sub-departments");
      Ok(())
    }
    Command::Logs { limit } => {
      let runs = store.list_import_runs(limit).await?;
      println!("{}", serde_json::to_string_pretty(&runs)?);
      Ok(())
    }
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn import(
  store: &SqliteStore,
  scale: RankScale,
  file: PathBuf,
  user: Option<String>,
) -> anyhow::Result<()> {
  let file_name = file
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| file.to_string_lossy().into_owned());

  let path = file.clone();
  let table = tokio::task::spawn_blocking(move || phonebook_sheet::read_path(&path))
    .await
    .context("sheet reader panicked")?
    .with_context(|| format!("failed to read {}", file.display()))?;

  let mut source = ImportSource::new(file_name);
  if let Some(user) = user {
    source = source.with_user(user);
  }

  let run = store
    .import(Reconciler::new(scale), table, source)
    .await
    .context("import failed")?;

  println!("{}", serde_json::to_string_pretty(&run.summary())?);
  Ok(())
}

async fn print_tree(store: &SqliteStore, scale: RankScale) -> anyhow::Result<()> {
  let directory = store.directory().await?;

  for node in &directory.roots {
    print_node(node, scale, 0);
  }
  if !directory.unassigned.is_empty() {
    println!("(no department)");
    for employee in &directory.unassigned {
      print_employee(employee, scale, 1);
    }
  }
  Ok(())
}

fn print_node(node: &DirectoryNode, scale: RankScale, depth: usize) {
  let indent = "  ".repeat(depth);
  let department = &node.department;
  if department.short_name.is_empty() {
    println!("{indent}{} [{}]", department.name, department.id);
  } else {
    println!(
      "{indent}{} ({}) [{}]",
      department.name, department.short_name, department.id
    );
  }
  for employee in &node.employees {
    print_employee(employee, scale, depth + 1);
  }
  for child in &node.children {
    print_node(child, scale, depth + 1);
  }
}

fn print_employee(employee: &Employee, scale: RankScale, depth: usize) {
  let r = &employee.record;
  println!(
    "{}- {} | {} | {} | ext. {} | {}",
    "  ".repeat(depth),
    r.full_name,
    r.position,
    r.phone,
    r.internal_phone,
    scale.label(r.hierarchy).unwrap_or("?"),
  );
}

async fn list_employees(
  store: &SqliteStore,
  query: &EmployeeQuery,
) -> anyhow::Result<()> {
  let tree = store.department_tree().await?;
  for employee in store.list_employees(query).await? {
    let r = &employee.record;
    println!(
      "{}\t{}\t{}\t{}\t{}\t{}",
      employee.id,
      r.full_name,
      r.position,
      r.internal_phone,
      r.hierarchy,
      department_label(&tree, r.department_id),
    );
  }
  Ok(())
}

async fn show(store: &SqliteStore, id: EmployeeId) -> anyhow::Result<()> {
  let Some(employee) = store.get_employee(id).await? else {
    bail!("no employee with id {id}");
  };
  let tree = store.department_tree().await?;

  let mut value = serde_json::to_value(&employee)?;
  let path = employee
    .record
    .department_id
    .map(|d| tree.full_path(d))
    .unwrap_or_default();
  value["department_path"] = path.into();
  println!("{}", serde_json::to_string_pretty(&value)?);
  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn department_label(tree: &DepartmentTree, id: Option<DepartmentId>) -> String {
  id.map(|id| tree.display_path(id)).unwrap_or_default()
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
