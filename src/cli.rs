use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::data::{load_catalog, CatalogHandle, ValidationSeverity, WeaponCatalog, WeaponSelection};
use crate::parallel::{evaluate_request, TtkRequest};
use crate::server::{self, api::TtkResponse, routes::AppState};

#[derive(Debug, Parser)]
#[command(name = "ttksim", version, about = "Time-to-kill simulator for weapon loadouts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API and calculator page.
    Serve {
        /// Address to bind, overrides TTKSIM_BIND.
        #[arg(long)]
        bind: Option<String>,
        #[command(flatten)]
        catalog: CatalogArg,
    },
    /// Run one simulation and print the result.
    Simulate(SimulateArgs),
    /// Load a catalog and report every diagnostic.
    Validate {
        /// Catalog file; defaults to TTKSIM_CATALOG or data/weapons.csv.
        path: Option<PathBuf>,
    },
    /// List the weapons and levels a catalog offers.
    Weapons {
        #[command(flatten)]
        catalog: CatalogArg,
    },
}

#[derive(Debug, Args)]
pub struct CatalogArg {
    /// Catalog file (CSV, JSON or YAML), overrides TTKSIM_CATALOG.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Target health pool.
    #[arg(long)]
    pub health: f64,
    /// Weapons as `<name>=<level>`, e.g. `"Ultimate Orkan=MK2_Lv7"`.
    #[arg(required = true, value_name = "NAME=LEVEL")]
    pub weapons: Vec<String>,
    #[command(flatten)]
    pub catalog: CatalogArg,
    /// Include the fire-event timeline.
    #[arg(long)]
    pub trace: bool,
    /// Print a tab-separated table instead of JSON.
    #[arg(long)]
    pub table: bool,
}

pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };
    let config = AppConfig::from_env();

    match cli.command {
        Command::Serve { bind, catalog } => handle_serve(config, bind, catalog),
        Command::Simulate(args) => handle_simulate(config, args),
        Command::Validate { path } => handle_validate(path.unwrap_or(config.catalog_path)),
        Command::Weapons { catalog } => handle_weapons(catalog.resolve(&config)),
    }
}

impl CatalogArg {
    fn resolve(self, config: &AppConfig) -> PathBuf {
        self.catalog.unwrap_or_else(|| config.catalog_path.clone())
    }
}

fn handle_serve(config: AppConfig, bind: Option<String>, catalog: CatalogArg) -> i32 {
    let path = catalog.resolve(&config);
    let handle = match CatalogHandle::load(&path) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("failed to load catalog: {err}");
            return 1;
        }
    };
    log_diagnostics(&handle.snapshot());

    let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let state = AppState::new(handle, &config);
    match server::run_server(state, &bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_simulate(config: AppConfig, args: SimulateArgs) -> i32 {
    let mut selections = Vec::with_capacity(args.weapons.len());
    for raw in &args.weapons {
        match parse_selection(raw) {
            Some(selection) => selections.push(selection),
            None => {
                eprintln!("invalid weapon '{raw}', expected <name>=<level>");
                return 2;
            }
        }
    }

    let catalog = match load_catalog(args.catalog.resolve(&config)) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("failed to load catalog: {err}");
            return 1;
        }
    };
    log_diagnostics(&catalog);

    let request = TtkRequest {
        target_health: args.health,
        weapons: selections,
        trace: args.trace,
    };
    let result = match evaluate_request(&catalog, &request, &config.simulation()) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };
    let response = TtkResponse::from(&result);

    if args.table {
        println!("weapon\tlevel\tshots\tdamage\treloads\treload_time");
        for row in &response.breakdown {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{:.2}",
                row.name, row.level, row.shots, row.damage, row.reloads, row.reload_time
            );
        }
        println!(
            "total\t\t{}\t{}\t\tttk={:.2} dps={}",
            response.total_shots, response.total_damage, response.ttk, response.dps
        );
        return 0;
    }

    match serde_json::to_string_pretty(&response) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize simulation result: {err}");
            1
        }
    }
}

fn handle_validate(path: PathBuf) -> i32 {
    let catalog = match load_catalog(&path) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return 1;
        }
    };

    let report = catalog.report();
    if report.has_errors() {
        let errors = report
            .diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error)
            .count();
        eprintln!("validation failed: {errors} error(s), {} weapon(s) usable", catalog.len());
        for diag in &report.diagnostics {
            eprintln!("- {diag}");
        }
        return 1;
    }

    for diag in &report.diagnostics {
        println!("- {diag}");
    }
    println!("validation passed: {} ({} weapons)", path.display(), catalog.len());
    0
}

fn handle_weapons(path: PathBuf) -> i32 {
    let catalog = match load_catalog(&path) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("failed to load catalog: {err}");
            return 1;
        }
    };

    for (name, spec) in catalog.to_map() {
        println!("{name}\t{}", spec.level_keys().collect::<Vec<_>>().join(","));
    }
    0
}

/// Split on the last `=`, so weapon names may themselves contain `=`.
pub fn parse_selection(raw: &str) -> Option<WeaponSelection> {
    let (name, level) = raw.rsplit_once('=')?;
    let (name, level) = (name.trim(), level.trim());
    if name.is_empty() || level.is_empty() {
        return None;
    }
    Some(WeaponSelection {
        name: name.to_string(),
        level: level.to_string(),
    })
}

fn log_diagnostics(catalog: &WeaponCatalog) {
    for diag in &catalog.report().diagnostics {
        match diag.severity {
            ValidationSeverity::Error => tracing::warn!("skipped catalog entry: {diag}"),
            ValidationSeverity::Warning => tracing::debug!("catalog warning: {diag}"),
        }
    }
    tracing::info!(
        source = %catalog.source().path,
        weapons = catalog.len(),
        "catalog loaded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_splits_on_last_equals() {
        let selection = parse_selection("Odd=Name = MK2_Lv3").expect("parses");
        assert_eq!(selection.name, "Odd=Name");
        assert_eq!(selection.level, "MK2_Lv3");
        assert!(parse_selection("NoLevel").is_none());
        assert!(parse_selection("=Lv1").is_none());
    }

    #[test]
    fn clap_accepts_simulate_arguments() {
        let cli = Cli::try_parse_from([
            "ttksim",
            "simulate",
            "--health",
            "5000",
            "Pin=Lv1",
            "Orkan=Lv2",
            "--table",
        ])
        .expect("parses");
        match cli.command {
            Command::Simulate(args) => {
                assert_eq!(args.health, 5000.0);
                assert_eq!(args.weapons, vec!["Pin=Lv1", "Orkan=Lv2"]);
                assert!(args.table);
                assert!(!args.trace);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn usage_errors_exit_with_two() {
        assert_eq!(run_with_args(["ttksim", "simulate", "Pin=Lv1"]), 2);
        assert_eq!(run_with_args(["ttksim", "frobnicate"]), 2);
    }
}
