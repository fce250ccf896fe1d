use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::charts::ChartOptions;
use crate::data::filter::SexFilter;
use crate::geo::{DEFAULT_BOUNDARIES_PATH, DEFAULT_FEATURE_KEY};

#[derive(Parser, Debug)]
#[command(name = "enem-dashboard")]
#[command(author, version, about = "Dashboard of ENEM candidate microdata", long_about = None)]
pub struct Cli {
    /// Microdata file (.parquet, .csv, .json or .xlsx)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Exam edition shown in chart titles
    #[arg(long, global = true, default_value_t = 2023)]
    pub year: u16,

    /// GeoJSON with state outlines for the map
    /// [default: assets/brazil-states.geojson when present]
    #[arg(long, global = true)]
    pub boundaries: Option<PathBuf>,

    /// Feature property holding the two-letter state code
    #[arg(long, global = true, default_value = DEFAULT_FEATURE_KEY)]
    pub feature_key: String,

    /// Image shown left of the page title
    #[arg(long, global = true)]
    pub logo_left: Option<PathBuf>,

    /// Image shown right of the page title
    #[arg(long, global = true)]
    pub logo_right: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Open the interactive dashboard (default)
    Gui,

    /// Print the frequency tables for one sex selection
    Summary {
        /// todos, masculino or feminino
        #[arg(long, default_value = "todos")]
        sex: SexFilter,
    },

    /// Write the five chart specs as JSON
    Export {
        /// todos, masculino or feminino
        #[arg(long, default_value = "todos")]
        sex: SexFilter,

        /// Output file path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data: Option<PathBuf>,
    pub chart_options: ChartOptions,
    pub boundaries: Option<PathBuf>,
    pub feature_key: String,
    pub logos: Vec<PathBuf>,
    pub command: Commands,
}

impl From<Cli> for DashboardConfig {
    fn from(cli: Cli) -> Self {
        DashboardConfig {
            data: cli.data,
            chart_options: ChartOptions { year: cli.year },
            boundaries: cli.boundaries,
            feature_key: cli.feature_key,
            logos: cli.logo_left.into_iter().chain(cli.logo_right).collect(),
            command: cli.command.unwrap_or(Commands::Gui),
        }
    }
}

impl DashboardConfig {
    /// Data path for the headless commands, which cannot run without one.
    pub fn require_data(&self) -> Result<&Path> {
        self.data
            .as_deref()
            .context("--data is required for this command")
    }

    /// Outlines to load: the explicit `--boundaries` file, else the default
    /// asset if it exists.
    pub fn boundaries_path(&self) -> Option<PathBuf> {
        resolve_boundaries(self.boundaries.as_deref(), Path::new(DEFAULT_BOUNDARIES_PATH))
    }

    /// Logos as URIs the egui image loaders understand.
    pub fn logo_uris(&self) -> Vec<String> {
        self.logos
            .iter()
            .map(|p| format!("file://{}", p.display()))
            .collect()
    }
}

fn resolve_boundaries(explicit: Option<&Path>, fallback: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => fallback.is_file().then(|| fallback.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DashboardConfig {
        Cli::try_parse_from(args.iter().copied()).unwrap().into()
    }

    #[test]
    fn defaults_to_gui() {
        let cfg = parse(&["enem-dashboard"]);
        assert_eq!(cfg.command, Commands::Gui);
        assert_eq!(cfg.chart_options.year, 2023);
        assert_eq!(cfg.feature_key, "sigla");
        assert!(cfg.require_data().is_err());
    }

    #[test]
    fn parses_export_with_global_options() {
        let cfg = parse(&[
            "enem-dashboard",
            "export",
            "--sex",
            "feminino",
            "--data",
            "dados.parquet",
            "--year",
            "2022",
        ]);
        assert_eq!(
            cfg.command,
            Commands::Export { sex: SexFilter::Female, output: None }
        );
        assert_eq!(cfg.require_data().unwrap(), Path::new("dados.parquet"));
        assert_eq!(cfg.chart_options.year, 2022);
    }

    #[test]
    fn rejects_unknown_sex() {
        assert!(Cli::try_parse_from(["enem-dashboard", "summary", "--sex", "x"]).is_err());
    }

    #[test]
    fn explicit_boundaries_win_over_default_asset() {
        let dir = tempfile::TempDir::new().unwrap();
        let asset = dir.path().join("brazil-states.geojson");
        std::fs::write(&asset, "{}").unwrap();

        let explicit = Path::new("outro.geojson");
        assert_eq!(resolve_boundaries(Some(explicit), &asset), Some(explicit.to_path_buf()));
        assert_eq!(resolve_boundaries(None, &asset), Some(asset.clone()));
        assert_eq!(resolve_boundaries(None, &dir.path().join("missing.geojson")), None);
    }

    #[test]
    fn logos_keep_left_right_order() {
        let cfg = parse(&["enem-dashboard", "--logo-right", "b.png", "--logo-left", "a.png"]);
        assert_eq!(cfg.logo_uris(), vec!["file://a.png", "file://b.png"]);
    }
}
