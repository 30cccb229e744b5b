//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and environment settings
//! - sets up logging
//! - dispatches to the track / summary / simulate / show / dash handlers

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Cli, Command, DashArgs, ShowArgs, SimulateArgs, SourceArgs, SummaryArgs, TrackArgs};
use crate::config::Settings;
use crate::domain::TrackConfig;
use crate::error::AppError;
use crate::logging::{self, LogTarget};

pub mod pipeline;
pub mod simulate;

const LOG_DIR: &str = "logs";
const MAX_REPORTED_ROW_ERRORS: usize = 5;

/// Entry point for the `goals` binary.
pub fn run() -> Result<(), AppError> {
    // `goals` and `goals --poll 5` behave like `goals dash ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    let settings = Settings::from_env()?;

    // The dashboard owns the terminal, so its logs go to a file.
    let target = match cli.command {
        Command::Dash(_) => LogTarget::File(std::path::Path::new(LOG_DIR)),
        _ => LogTarget::Stderr,
    };
    let _log_guard = logging::init(target, cli.verbose)?;

    match cli.command {
        Command::Track(args) => handle_track(args, &settings),
        Command::Summary(args) => handle_summary(args, &settings),
        Command::Simulate(args) => handle_simulate(args, &settings),
        Command::Show(args) => handle_show(args),
        Command::Dash(args) => handle_dash(args, settings),
    }
}

fn handle_track(args: TrackArgs, settings: &Settings) -> Result<(), AppError> {
    let config = track_config_from_args(&args, settings);
    let run = pipeline::run_track(&config, settings)?;
    let file = run.tracker_file();

    if config.json {
        let json = serde_json::to_string_pretty(&run.outcome)
            .map_err(|e| AppError::new(4, format!("Failed to serialize tracker outcome: {e}")))?;
        println!("{json}");
    } else {
        if let Some(report) = run.data.ingest.as_ref().filter(|r| !r.row_errors.is_empty()) {
            eprint!("{}", crate::report::format_ingest_report(report, MAX_REPORTED_ROW_ERRORS));
        }
        println!("{}", crate::report::format_track_report(&file));
    }

    if config.plot {
        let points = crate::plot::intensity_points(&run.data.snapshot.intensity);
        let plot = crate::plot::render_ascii_series(&points, config.plot_width, config.plot_height, "day", "g/kWh");
        println!("{plot}");
    }

    if let Some(path) = &config.export {
        crate::io::write_tracker_json(path, &file)?;
        tracing::info!(path = %path.display(), "exported tracker JSON");
    }

    if let Some(err) = run.outcome.error() {
        let snap = &run.data.snapshot;
        let code = if snap.intensity.is_empty() || snap.mix.is_empty() { 3 } else { 4 };
        return Err(AppError::new(code, format!("Goal tracker failed: {err}")));
    }
    Ok(())
}

fn handle_summary(args: SummaryArgs, settings: &Settings) -> Result<(), AppError> {
    let source = pipeline::resolve_source(args.source.source, settings);
    let data = pipeline::load_data(source, &data_dir(&args.source, settings), args.source.limits(), settings)?;
    let snap = &data.snapshot;

    if snap.intensity.is_empty() && snap.mix.is_empty() && snap.targets.is_empty() {
        return Err(AppError::new(3, format!("No data found in {}", source.display_name())));
    }

    println!("=== goals - Dataset summary ({}) ===", source.display_name());
    if let Some(report) = &data.ingest {
        print!("{}", crate::report::format_ingest_report(report, MAX_REPORTED_ROW_ERRORS));
        println!();
    }
    print!(
        "{}",
        crate::report::format_summary(
            crate::report::summarize_intensity(&snap.intensity).as_ref(),
            crate::report::summarize_mix(&snap.mix).as_ref(),
            crate::report::summarize_targets(&snap.targets).as_ref(),
        )
    );
    println!();
    print!(
        "{}",
        crate::report::format_renewables_vs_intensity(
            crate::report::renewables_vs_intensity(&snap.mix, &snap.intensity).as_ref()
        )
    );
    println!();
    print!(
        "{}",
        crate::report::format_kpis(&crate::report::kpis(&snap.intensity, &snap.mix, &snap.targets))
    );
    Ok(())
}

fn handle_simulate(args: SimulateArgs, settings: &Settings) -> Result<(), AppError> {
    let config = sim_config_from_args(&args, settings)?;
    let written = simulate::run(&config, settings)?;
    tracing::info!(steps = written, "simulator finished");
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = crate::io::read_tracker_json(&args.file)?;

    if args.json {
        let json = serde_json::to_string_pretty(&file.outcome)
            .map_err(|e| AppError::new(4, format!("Failed to serialize tracker outcome: {e}")))?;
        println!("{json}");
    } else {
        println!("{}", crate::report::format_track_report(&file));
    }

    if args.plot {
        match file.outcome.indicators().and_then(|t| t.pathway.as_ref()) {
            Some(pathway) => {
                let points = crate::plot::target_points(&pathway.series);
                println!(
                    "{}",
                    crate::plot::render_ascii_series(&points, args.width, args.height, "year", "Mt")
                );
            }
            None => println!("No pathway to plot."),
        }
    }
    Ok(())
}

fn handle_dash(args: DashArgs, settings: Settings) -> Result<(), AppError> {
    crate::tui::run(args, settings)
}

fn data_dir(args: &SourceArgs, settings: &Settings) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| settings.csv_dir.clone())
}

pub fn track_config_from_args(args: &TrackArgs, settings: &Settings) -> TrackConfig {
    TrackConfig {
        source: pipeline::resolve_source(args.source.source, settings),
        data_dir: data_dir(&args.source, settings),
        limits: args.source.limits(),
        at: args.at,
        json: args.json,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export: args.export.clone(),
    }
}

pub fn sim_config_from_args(args: &SimulateArgs, settings: &Settings) -> Result<simulate::SimConfig, AppError> {
    let step_minutes = args.step.unwrap_or(settings.sim.step_minutes);
    if step_minutes == 0 {
        return Err(AppError::new(2, "--step must be at least 1 minute"));
    }
    Ok(simulate::SimConfig {
        mode: args.mode,
        seed: args.seed.or(settings.sim.seed),
        output: args.output.unwrap_or(settings.sim.output),
        wall_interval_secs: args.wall.unwrap_or(settings.sim.wall_interval_secs),
        step_minutes,
        count: args.count,
        csv_dir: args.data_dir.clone().unwrap_or_else(|| settings.csv_dir.clone()),
    })
}

/// Rewrite argv so `goals` defaults to `goals dash`.
///
/// Rules:
/// - `goals`                      -> `goals dash`
/// - `goals --poll 5 ...`         -> `goals dash --poll 5 ...`
/// - `goals --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dash".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "track" | "summary" | "simulate" | "show" | "dash");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "dash".to_string());
        return argv;
    }

    argv
}
