//! toygen CLI

mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tg_hist::{Grid2D, JsonHistogramStore, PolynomialForm, read_histogram_file, write_histogram_file};
use tg_toys::{PseudoDataGenerator, PseudoDataReport, RegionRole, read_ledger};

#[derive(Parser)]
#[command(name = "toygen")]
#[command(about = "toygen - ABCD / transfer-function pseudo-data generation")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one pseudo-data toy per region from postfit transfer functions
    Generate {
        /// Run config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Override the config seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Override the toy histogram output file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Summary output (pretty JSON). Defaults to stdout.
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Threads (0 = auto).
        #[arg(long, default_value = "0")]
        threads: usize,
    },

    /// Evaluate a polynomial transfer function on a template binning
    TransferShapes {
        /// Histogram file providing the binning
        #[arg(long)]
        template: PathBuf,

        /// Name of the template histogram inside `--template`
        #[arg(long)]
        histogram: String,

        /// Polynomial form, e.g. `2x1` (x order, y order)
        #[arg(long)]
        form: String,

        /// Comma-separated coefficients, x-major
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        params: Vec<f64>,

        /// Output histogram name. Defaults to the form, e.g. `2x1`.
        #[arg(long)]
        name: Option<String>,

        /// Output histogram file. Defaults to pretty JSON on stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Generate { config, seed, output, summary, threads } => {
            cmd_generate(&config, seed, output, summary.as_ref(), threads)
        }
        Commands::TransferShapes { template, histogram, form, params, name, output } => {
            cmd_transfer_shapes(&template, &histogram, &form, &params, name, output.as_ref())
        }
        Commands::Version => {
            println!("toygen {}", tg_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_generate(
    config: &Path,
    seed: Option<u64>,
    output: Option<PathBuf>,
    summary: Option<&PathBuf>,
    threads: usize,
) -> Result<()> {
    if threads > 0 {
        // Best-effort; if a global pool already exists, keep going.
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
    }

    tracing::info!(path = %config.display(), "loading run config");
    let mut cfg = run::read_run_config(config)
        .with_context(|| format!("failed to read run config {}", config.display()))?;
    if let Some(seed) = seed {
        cfg.toys.seed = seed;
    }
    let output = output.unwrap_or_else(|| cfg.output_or_default(&run::config_dir(config)));

    let ledger = read_ledger(&cfg.ledger)?;
    tracing::info!(rows = ledger.len(), path = %cfg.ledger.display(), "ledger loaded");
    let store = JsonHistogramStore::new(run::config_dir(&cfg.ledger));

    let transfers = load_transfers(&cfg.transfer_file, &cfg.transfer_names())?;
    let generator = PseudoDataGenerator::new(cfg.toys.clone());
    let report = generator.generate(&ledger, &store, transfers)?;

    if !report.toys.is_empty() {
        write_histogram_file(&output, &report.toy_grids())?;
        tracing::info!(toys = report.toys.len(), path = %output.display(), "toys written");
    }
    write_json(summary, summary_json(&report, cfg.toys.seed, &output))?;

    if !report.is_complete() {
        let failed: Vec<&str> = report.failures.iter().map(|f| f.region.as_str()).collect();
        anyhow::bail!("toy generation failed in {} region(s): {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn load_transfers(path: &Path, names: &[String]) -> Result<Vec<Grid2D>> {
    let file = read_histogram_file(path)?;
    names
        .iter()
        .map(|name| {
            file.get(name).cloned().with_context(|| {
                format!(
                    "transfer function '{name}' not found in {} (available: {})",
                    path.display(),
                    file.names().join(", ")
                )
            })
        })
        .collect()
}

fn summary_json(report: &PseudoDataReport, seed: u64, output: &Path) -> serde_json::Value {
    let regions: Vec<serde_json::Value> = report
        .estimates
        .iter()
        .map(|e| {
            let toy = report.toys.iter().find(|t| t.region == e.region);
            let role = match e.role {
                RegionRole::Fail => "fail".to_string(),
                RegionRole::Transferred(depth) => format!("transferred({depth})"),
            };
            serde_json::json!({
                "region": e.region,
                "role": role,
                "asimov": e.asimov().name(),
                "observed": e.observed,
                "asimov_integral": tg_hist::algebra::integral(e.asimov()),
                "n_events": toy.map(|t| t.n_events),
            })
        })
        .collect();
    let failures: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|f| serde_json::json!({ "region": f.region, "error": f.error.to_string() }))
        .collect();

    serde_json::json!({
        "seed": seed,
        "output": output.display().to_string(),
        "regions": regions,
        "failures": failures,
    })
}

fn cmd_transfer_shapes(
    template: &Path,
    histogram: &str,
    form: &str,
    params: &[f64],
    name: Option<String>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let form: PolynomialForm = form.parse()?;
    let file = read_histogram_file(template)?;
    let grid = file
        .get(histogram)
        .with_context(|| format!("histogram '{histogram}' not found in {}", template.display()))?;
    let name = name.unwrap_or_else(|| form.to_string());
    let shape = form.shape(grid, params, name)?;
    tracing::info!(form = %form, params = params.len(), "transfer shape evaluated");

    match output {
        Some(path) => Ok(write_histogram_file(path, std::slice::from_ref(&shape))?),
        None => write_json(None, serde_json::to_value(&shape)?),
    }
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
