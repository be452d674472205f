//! apicontract CLI - declarative HTTP contract tests for reqres.in-style services

mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use apicontract_core::generator::request_to_http;
use apicontract_core::{Config, Outcome, generate_schema, to_http_file};
use apicontract_runner::{ContractClient, Suite, TracingObserver, scenarios};

#[derive(Parser)]
#[command(name = "apicontract")]
#[command(about = "Declarative HTTP contract tests with typed models and reusable specs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug-level exchange logs)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run contract scenarios
    Run {
        /// Scenario names to run (default: all)
        #[arg(short, long = "scenario")]
        scenarios: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = ".apicontract")]
        output_dir: String,

        /// Config file (default: .apicontract.toml)
        #[arg(short, long)]
        config: Option<String>,

        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Run scenarios on parallel threads
        #[arg(long)]
        parallel: bool,

        /// Dump all request/response pairs to JSONL files
        #[arg(long)]
        dump: bool,

        /// Directory for dump files (default: .apicontract/dumps)
        #[arg(long)]
        dump_dir: Option<String>,
    },

    /// List available scenarios
    List,

    /// Initialize config file
    Init,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json, cli.output);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug, silent mode only warnings.
fn init_tracing(verbose: bool, json: bool, output: OutputFormat) {
    let default = match (verbose, output) {
        (true, _) => "apicontract=debug,apicontract_runner=debug",
        (false, OutputFormat::Silent) => "warn",
        (false, _) => "apicontract=info,apicontract_runner=info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            scenarios,
            output_dir,
            config,
            base_url,
            parallel,
            dump,
            dump_dir,
        } => {
            // Load config
            let mut cfg = if let Some(path) = config {
                Config::load(Path::new(&path))?
            } else {
                Config::load_default()?
            };
            if let Some(url) = base_url {
                cfg.base_url = url;
            }
            tracing::debug!(base_url = %cfg.base_url, timeout_secs = cfg.timeout_secs, "config loaded");

            let suite = if scenarios.is_empty() {
                Suite::all()
            } else {
                Suite::select(scenarios.as_slice()).map_err(|name| {
                    anyhow::anyhow!("unknown scenario: {name} (see `apicontract list`)")
                })?
            }
            .with_parallel(parallel || cfg.parallel);

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url:  {}", cfg.base_url);
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:   {} configured", cfg.headers.len());
                }
                eprintln!("  timeout:   {}s", cfg.timeout_secs);
                eprintln!("  scenarios: {}", suite.len());
                eprintln!();
            }

            let client = ContractClient::from_config(&cfg)
                .context("building HTTP client")?
                .with_observer(Arc::new(TracingObserver));

            let start = Instant::now();
            let run = suite.run(&client);
            let duration_secs = start.elapsed().as_secs_f64();

            let report = &run.report;
            let verdict = report.verdict();
            let output_dir = PathBuf::from(output_dir);

            match cli.output {
                OutputFormat::Terminal => {
                    for scenario in &report.scenarios {
                        match &scenario.outcome {
                            Outcome::Pass => {
                                println!("  ok    {} ({} ms)", scenario.name, scenario.elapsed_ms);
                            }
                            Outcome::Fail { kind, message, .. } => {
                                println!("  FAIL  {} [{kind}]", scenario.name);
                                for line in message.lines() {
                                    println!("        {line}");
                                }
                                if cli.verbose {
                                    if let Some(request) = &scenario.last_request {
                                        for line in request_to_http(request, None).lines() {
                                            println!("        | {line}");
                                        }
                                    }
                                }
                            }
                        }
                    }

                    println!("\n{}: {}", verdict.status, verdict.reason);
                    println!(
                        "  Scenarios: {} total, {} passed, {} failed",
                        report.total, report.passed, report.failed
                    );
                    println!("  Exit code: {}", verdict.exit_code);

                    // Generate .http reproduction file
                    if report.failed > 0 {
                        let http_path = output_dir.join("reproductions.http");
                        let http_content =
                            to_http_file(&report.scenarios, &cfg.base_url, "base_url");
                        let written = std::fs::create_dir_all(&output_dir)
                            .and_then(|()| std::fs::write(&http_path, &http_content));
                        if let Err(e) = written {
                            eprintln!("Warning: failed to write .http file: {e}");
                        } else {
                            println!("Reproductions: {}", http_path.display());
                        }
                    }
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "verdict": {
                            "status": verdict.status.to_string(),
                            "exit_code": verdict.exit_code,
                            "reason": verdict.reason,
                        },
                        "report": report,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            // Dump all exchanges if requested (CLI flag or config)
            if dump || cfg.dump {
                let dump_path = dump_dir.map_or_else(|| cfg.dump_path(), PathBuf::from);
                match apicontract_core::dump::write_dump(&run.exchanges, &dump_path, true) {
                    Ok(index) => {
                        if cli.output != OutputFormat::Silent {
                            eprintln!(
                                "Dump: {} exchanges → {} ({})",
                                index.total,
                                dump_path.display(),
                                index
                                    .operations
                                    .iter()
                                    .map(|e| e.file.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", "),
                            );
                        }
                    }
                    Err(e) => {
                        eprintln!("Warning: failed to write dump: {e}");
                    }
                }
            }

            let report_data = storage::ReportData {
                config: &cfg,
                report,
                verdict: &verdict,
                duration_secs,
            };
            match storage::save_report(&output_dir, &report_data) {
                Ok(path) => {
                    if cli.output != OutputFormat::Silent {
                        eprintln!("Report saved: {}", path.display());
                    }
                }
                Err(e) => eprintln!("Warning: failed to save report: {e}"),
            }

            Ok(verdict.exit_code)
        }

        Commands::List => {
            match cli.output {
                OutputFormat::Json => {
                    let list: Vec<_> = scenarios::all()
                        .iter()
                        .map(|s| serde_json::json!({"name": s.name, "description": s.description}))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&list)?);
                }
                OutputFormat::Terminal => {
                    let width = scenarios::all()
                        .iter()
                        .map(|s| s.name.len())
                        .max()
                        .unwrap_or(0);
                    for s in scenarios::all() {
                        println!("{:width$}  {}", s.name, s.description);
                    }
                }
                OutputFormat::Silent => {}
            }
            Ok(0)
        }

        Commands::Init => {
            let config_path = ".apicontract.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: service to test");
            println!("  - headers: API keys sent with every request");
            println!("  - timestamp_tolerance_secs: allowed clock skew for updatedAt");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", generate_schema());
            Ok(0)
        }
    }
}
