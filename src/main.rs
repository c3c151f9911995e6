//! symca-patterns - Entry point
//!
//! Control coefficient and control pattern diagnostics.
//!
//! CLI Usage:
//!   cargo run                                  # Built-in linear pathway demo
//!   cargo run -- --config analysis.json        # Custom analysis definition
//!   cargo run -- -p k1 -n 20 --mode value --csv --json

use anyhow::{bail, Context, Result};
use symca_patterns::{
    config::{Analysis, AnalysisDefinition, AnalysisParameters},
    export::{export_scan_json, ScanCsvExporter},
    Node, ParameterScanner, ScanMode,
};

const DEMO_ANALYSIS: &str = include_str!("../data/models/linear_pathway.json");

/// Parsed command line
struct CliOptions {
    config: Option<String>,
    parameter: Option<String>,
    points: Option<usize>,
    mode: Option<ScanMode>,
    csv: bool,
    json: bool,
}

/// Parse CLI arguments
fn parse_args() -> Result<CliOptions> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = CliOptions {
        config: None,
        parameter: None,
        points: None,
        mode: None,
        csv: false,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                i += 1;
                options.config = Some(value_of(&args, i, "--config")?.to_string());
            }
            "-p" | "--parameter" => {
                i += 1;
                options.parameter = Some(value_of(&args, i, "--parameter")?.to_string());
            }
            "-n" | "--points" => {
                i += 1;
                let points = value_of(&args, i, "--points")?
                    .parse()
                    .context("--points expects a positive integer")?;
                options.points = Some(points);
            }
            "-m" | "--mode" => {
                i += 1;
                options.mode = Some(value_of(&args, i, "--mode")?.parse()?);
            }
            "--csv" => options.csv = true,
            "--json" => options.json = true,
            "--help" | "-h" => {
                println!("symca-patterns");
                println!();
                println!("Usage: symca-patterns [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config FILE     Analysis definition JSON (default: built-in demo)");
                println!("  -p, --parameter NAME  Parameter to scan (default: from definition)");
                println!("  -n, --points N        Number of scan points (default: 50)");
                println!("  -m, --mode MODE       percentage | value (default: percentage)");
                println!("  --csv                 Export scans to exports/*.csv");
                println!("  --json                Export scans to exports/*.json");
                println!("  --help, -h            Show this help");
                std::process::exit(0);
            }
            other => bail!("Unknown argument `{}` (see --help)", other),
        }
        i += 1;
    }

    Ok(options)
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    match args.get(i) {
        Some(value) => Ok(value),
        None => bail!("{} expects a value", flag),
    }
}

/// Print every coefficient with its patterns and percentage contributions
fn print_analysis(analysis: &Analysis) -> Result<()> {
    println!(
        "{} = {:.6}\n",
        analysis.sigma.name(),
        analysis.sigma.value()?
    );

    for cc in &analysis.coefficients {
        println!("{}", cc);
        println!("  value = {:.6}", cc.value()?);
        for (pattern, percentage) in cc.control_patterns().iter().zip(cc.percentages()?) {
            println!(
                "  {:>4} = {:>12.6}  ({:>8.2}%)  {}",
                pattern.name(),
                pattern.value()?,
                percentage,
                pattern.numerator()
            );
        }
        if cc.control_patterns().len() > 1 && !cc.all_patterns_same_sign()? {
            println!("  note: control patterns have mixed signs");
        }
        println!();
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args()?;

    let definition = match &options.config {
        Some(path) => AnalysisDefinition::load(path)?,
        None => AnalysisDefinition::from_json_str(DEMO_ANALYSIS)?,
    };
    let analysis = definition.build()?;

    println!("=== symca-patterns: {} ===\n", definition.model.name);
    print_analysis(&analysis)?;

    let params = AnalysisParameters::load_or_default();
    let mut scan = params.scan;
    if let Some(points) = options.points {
        scan.points = points;
    }
    if let Some(mode) = options.mode {
        scan.mode = mode;
    }

    let parameter = match options.parameter.or_else(|| analysis.scan_parameter.clone()) {
        Some(parameter) => parameter,
        None => {
            log::info!("No scan parameter given, skipping scan");
            return Ok(());
        }
    };

    let range = scan.scan_range();
    println!(
        "--- Scanning {} from {} to {} ({} points, {}) ---\n",
        parameter, scan.start, scan.end, range.len(), scan.mode
    );

    for cc in &analysis.coefficients {
        let figure = ParameterScanner::new(parameter.as_str(), range.clone(), scan.mode)
            .restore_initial_value(scan.restore_initial_value)
            .run(cc)?;

        println!("{}: x, {}", cc.name(), figure.names().join(", "));
        let rows = figure.rows();
        if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
            println!("  {:?}", first);
            println!("  {:?}", last);
        }

        if options.csv {
            let path = ScanCsvExporter::new(cc.name())?.export(&figure)?;
            println!("  CSV: {}", path.display());
        }
        if options.json {
            let path = export_scan_json(&figure)?;
            println!("  JSON: {}", path.display());
        }
    }

    Ok(())
}
