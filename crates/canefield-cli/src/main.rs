//! `canefield`: command-line front end for the harvest ledger.
//!
//! # Usage
//!
//! ```text
//! canefield data seed
//! canefield farm add --name "Santa Rita" --owner "Joao" --document 529.982.247-25 --location SP
//! canefield harvest add --farm 1 --plot T01 --date 15/09/2024 --method mechanical \
//!   --quantity 1240 --loss mechanical=12 --loss root_damage=2.5
//! canefield report full --output report.txt
//! ```

mod app;
mod seed;
mod settings;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::App;
use clap::{Args as ClapArgs, Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "canefield", version, about = "Sugarcane harvest and loss ledger")]
struct Args {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "canefield.toml", global = true)]
  config: PathBuf,

  /// Data directory; overrides the configured `data_dir`.
  #[arg(long, value_name = "DIR", env = "CANEFIELD_DATA_DIR", global = true)]
  data_dir: Option<PathBuf>,

  /// Log progress at INFO level (RUST_LOG takes precedence).
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Register, list and inspect farms.
  #[command(subcommand)]
  Farm(FarmCommand),
  /// Attach plots to farms and change their status.
  #[command(subcommand)]
  Plot(PlotCommand),
  /// Record and inspect harvests.
  #[command(subcommand)]
  Harvest(HarvestCommand),
  /// Analytics reports.
  Report(ReportArgs),
  /// Advisories for one harvest record.
  Recommend {
    /// Harvest id.
    id: u32,
  },
  /// Seed, back up and check the data files.
  #[command(subcommand)]
  Data(DataCommand),
  /// Inspect and synchronise the SQLite mirror.
  #[command(subcommand)]
  Mirror(MirrorCommand),
}

#[derive(Subcommand, Debug)]
pub enum FarmCommand {
  Add {
    #[arg(long)]
    name:     String,
    #[arg(long)]
    owner:    String,
    /// CPF (11 digits) or CNPJ (14 digits); punctuation is ignored.
    #[arg(long)]
    document: String,
    #[arg(long)]
    location: String,
  },
  List,
  Show {
    id: u32,
  },
  /// Case-insensitive search on the farm name.
  Find {
    text: String,
  },
  Stats,
}

#[derive(Subcommand, Debug)]
pub enum PlotCommand {
  Add {
    #[arg(long)]
    farm:    u32,
    #[arg(long)]
    code:    String,
    /// Hectares.
    #[arg(long)]
    area:    f64,
    #[arg(long)]
    variety: String,
    /// Planting year.
    #[arg(long)]
    year:    i32,
  },
  Show {
    #[arg(long)]
    farm: u32,
    #[arg(long)]
    code: String,
  },
  Status {
    #[arg(long)]
    farm:   u32,
    #[arg(long)]
    code:   String,
    /// `active` or `inactive`.
    status: String,
  },
}

#[derive(Subcommand, Debug)]
pub enum HarvestCommand {
  Add {
    #[arg(long)]
    farm:     u32,
    #[arg(long)]
    plot:     String,
    /// `DD/MM/YYYY` or `YYYY-MM-DD`.
    #[arg(long)]
    date:     String,
    /// `manual`, `mechanical` or `mixed`.
    #[arg(long)]
    method:   String,
    /// Tonnes harvested.
    #[arg(long)]
    quantity: f64,
    /// `category=percent`; repeat for each category.
    #[arg(long = "loss", value_name = "CATEGORY=PCT", value_parser = parse_loss)]
    losses:   Vec<(String, f64)>,
  },
  List {
    #[arg(long)]
    farm:   Option<u32>,
    #[arg(long)]
    method: Option<String>,
  },
  Show {
    id: u32,
  },
}

#[derive(ClapArgs, Debug)]
pub struct ReportArgs {
  #[arg(value_enum)]
  pub kind:   ReportKind,
  /// Number of plots in the critical-plot ranking.
  #[arg(long, default_value_t = 5)]
  pub top:    usize,
  /// Also write the report, with a header and footer, to this file.
  #[arg(short, long, value_name = "FILE")]
  pub output: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
  Dashboard,
  Full,
  Varieties,
  Methods,
  Critical,
}

#[derive(Subcommand, Debug)]
pub enum DataCommand {
  /// Replace all data with the demonstration set.
  Seed,
  /// Copy the data files into a backup directory.
  Backup {
    #[arg(long, value_name = "DIR")]
    dest: Option<PathBuf>,
  },
  /// Report whether each data file parses.
  Check,
}

#[derive(Subcommand, Debug)]
pub enum MirrorCommand {
  Status,
  /// Overwrite the mirror with the current data files.
  Sync,
  /// Overwrite the data files with the mirror's contents.
  Load,
}

fn parse_loss(s: &str) -> Result<(String, f64), String> {
  let (category, pct) = s
    .split_once('=')
    .ok_or_else(|| format!("expected CATEGORY=PCT, got {s:?}"))?;
  let pct = pct
    .trim()
    .parse::<f64>()
    .map_err(|e| format!("invalid percentage {pct:?}: {e}"))?;
  Ok((category.trim().to_owned(), pct))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let default_level = if args.verbose { LevelFilter::INFO } else { LevelFilter::WARN };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let mut settings = Settings::load(&args.config)?;
  if let Some(dir) = args.data_dir {
    settings.data_dir = dir;
  }

  let mut app = App::open(settings).await?;
  let output = app.run(args.command).await?;
  print!("{output}");
  Ok(())
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Args::command().debug_assert(); }

  #[test]
  fn loss_flag_parses_pairs() {
    assert_eq!(parse_loss("root_damage=2.5").unwrap(), ("root_damage".into(), 2.5));
    assert!(parse_loss("root_damage").is_err());
    assert!(parse_loss("pest=lots").is_err());
  }

  #[test]
  fn report_flags() {
    let args =
      Args::try_parse_from(["canefield", "report", "critical", "--top", "3", "-o", "out.txt"])
        .unwrap();
    let Command::Report(report) = args.command else { panic!("expected report") };
    assert_eq!(report.kind, ReportKind::Critical);
    assert_eq!(report.top, 3);
    assert_eq!(report.output, Some(PathBuf::from("out.txt")));
  }
}
