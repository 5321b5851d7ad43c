use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use hil::config::DEFAULT_BAUD_RATE;
use hil::transport::PORT_READ_TIMEOUT;
use hil::{
    GoldenReference, HarnessConfig, LineTransport, RunConfig, TransportConfig, TrialOutcome,
    TrialRunner,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hil_cli", about = "Hardware-in-the-loop validation harness", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the golden reference against a device and report PASS/FAIL.
    Run {
        #[command(flatten)]
        link: LinkArgs,
        #[command(flatten)]
        scoring: ScoringArgs,
    },
    /// Record raw device responses to a file without scoring them.
    Capture {
        #[command(flatten)]
        link: LinkArgs,
        /// File the response lines are written to.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List available serial ports.
    Ports,
}

#[derive(Args)]
struct LinkArgs {
    /// Serial port the device is attached to (e.g. /dev/ttyUSB0 or COM8).
    #[arg(short, long)]
    port: String,
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,
    /// Number of trials the device will run.
    #[arg(short, long)]
    trials: usize,
    /// Golden reference file.
    #[arg(short, long, default_value = "goldenReference.dat")]
    reference: PathBuf,
    /// Give up when no response line arrives for this long (0 waits forever).
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
    /// Sleep between polls of an idle line.
    #[arg(long, default_value_t = 200)]
    poll_ms: u64,
    /// Pause after each value sent to the device.
    #[arg(long, default_value_t = 10)]
    send_delay_ms: u64,
}

#[derive(Args)]
struct ScoringArgs {
    /// MSE above which a trial fails.
    #[arg(long, default_value_t = 0.1)]
    threshold: f64,
    /// Stop once more than this many trials have failed.
    #[arg(long, default_value_t = 50)]
    failure_cap: usize,
    /// Device clock cycles per millisecond.
    #[arg(long, default_value_t = 325e3)]
    cycles_per_ms: f64,
    /// Reject responses whose labels are not exactly elapsed/u/x.
    #[arg(long)]
    strict_labels: bool,
}

impl LinkArgs {
    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            inter_element_delay: Duration::from_millis(self.send_delay_ms),
            poll_interval: Duration::from_millis(self.poll_ms),
            response_timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
        }
    }
}

impl ScoringArgs {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            threshold: self.threshold,
            failure_cap: self.failure_cap,
            cycles_per_ms: self.cycles_per_ms,
            strict_labels: self.strict_labels,
        }
    }
}

// The main entry point for the harness command-line application.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Cmd::Run { link, scoring } => cmd_run(&link, &scoring),
        Cmd::Capture { link, output } => cmd_capture(&link, &output),
        Cmd::Ports => cmd_ports(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[ERROR] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn cmd_run(link: &LinkArgs, scoring: &ScoringArgs) -> Result<ExitCode> {
    let config = HarnessConfig {
        transport: link.transport_config(),
        run: scoring.run_config(),
    };

    // The reference is checked before the device is touched.
    let reference = GoldenReference::load(&link.reference, link.trials)
        .with_context(|| format!("loading {}", link.reference.display()))?;

    let port = hil::open_serial(&link.port, link.baud, PORT_READ_TIMEOUT)
        .with_context(|| format!("opening {}", link.port))?;
    let mut runner = TrialRunner::new(LineTransport::new(port, config.transport), config.run);

    println!("Listening on {} at {} baud...", link.port, link.baud);
    let report = runner.run_with(&reference, print_trial)?;
    drop(runner.into_transport());

    if report.stopped_early {
        println!(
            "Stopped after {} of {} trials: too many failures.",
            report.trials_run, report.total_trials
        );
    }
    if let (Some(mean), Some(max)) = (report.mean_elapsed_ms(), report.max_elapsed_ms()) {
        println!("Time: mean {:.3} ms, max {:.3} ms", mean, max);
    }
    println!(
        "Mean U_MSE: {:.3}  Mean X_MSE: {:.3}",
        report.mean_scalar_error, report.mean_vector_error
    );

    print_banner(report.passed());
    println!("{}", report.failures);

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_capture(link: &LinkArgs, output: &Path) -> Result<ExitCode> {
    // Only the initial conditions are needed; expected outputs are ignored.
    let reference = GoldenReference::load(&link.reference, 0)
        .with_context(|| format!("loading {}", link.reference.display()))?;

    let port = hil::open_serial(&link.port, link.baud, PORT_READ_TIMEOUT)
        .with_context(|| format!("opening {}", link.port))?;
    let mut transport = LineTransport::new(port, link.transport_config());

    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    println!("Listening on {} at {} baud...", link.port, link.baud);
    let lines = hil::capture_responses(
        &mut transport,
        reference.initial_conditions(),
        link.trials,
        &mut writer,
    )?;
    println!("Wrote {} lines to {}", lines, output.display());

    Ok(ExitCode::SUCCESS)
}

fn cmd_ports() -> Result<ExitCode> {
    let ports = hil::list_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        eprintln!("[ERROR] No serial ports found.");
        return Ok(ExitCode::FAILURE);
    }

    println!("Available serial ports:");
    for (i, port) in ports.iter().enumerate() {
        println!("  {}: {}", i, port);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_trial(outcome: &TrialOutcome<'_>) {
    let score = &outcome.score;
    println!(
        "T: {}\t U_MSE: {:.3} \tX_MSE: {:.3} \tTime: {:.3} ms",
        outcome.index, score.scalar_error, score.vector_error, outcome.elapsed_ms
    );
    println!(
        "\tu: {:.3} \t Expected: {:.3}",
        outcome.result.scalar, outcome.expected.scalar
    );
    println!(
        "\tx: {} \t Expected: {}",
        format_vector(&outcome.result.vector),
        format_vector(&outcome.expected.vector)
    );
    if !score.passed {
        println!("{}", format!("TRIAL: {} FAILED!!", outcome.index).red());
    }
}

fn format_vector(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{:.3}", v)).collect();
    format!("[{}]", parts.join(", "))
}

fn print_banner(passed: bool) {
    let border = "*".repeat(50);
    let (word, styled) = if passed {
        ("PASS", "PASS".green().bold())
    } else {
        ("FAIL", "FAIL".red().bold())
    };
    let pad = (48 - word.len()) / 2;
    println!("{}", border);
    println!("*{}{}{}*", " ".repeat(pad), styled, " ".repeat(48 - word.len() - pad));
    println!("{}", border);
}
