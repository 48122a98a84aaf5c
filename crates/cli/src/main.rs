// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mmiosim_config::ScenarioConfig;
use mmiosim_core::hardware::HardwareModel;
use mmiosim_core::interrupt::{InterruptHandler, TimerHandler};
use mmiosim_core::system::{SimulationReport, Simulator};
use mmiosim_core::walkthrough;
use mmiosim_core::{Devices, PollOutcome, SharedFlags};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Memory-mapped register and interrupt simulation",
    long_about = None
)]
struct Cli {
    /// Enable debug-level tracing (register writes, poll iterations)
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interrupt-driven main loop (default).
    Run(RunArgs),

    /// Fresh versus cached polling of a register that changes mid-wait.
    Polling(PollingArgs),

    /// GPIO set/toggle/clear sequence.
    Gpio,

    /// UART transmit then receive over a loopback.
    Uart(UartArgs),

    /// Wait for a timer overflow.
    Timer(TimerArgs),

    /// Cost of register accesses versus plain locals.
    Cost(CostArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Scenario configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the main loop iteration cap
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Override the interrupt interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PollingArgs {
    /// Iteration after which the simulated hardware writes the register
    #[arg(long, default_value = "2")]
    change_after: u32,

    /// Poll timeout in iterations
    #[arg(long, default_value = "1000")]
    timeout: u32,
}

#[derive(Args, Debug)]
struct UartArgs {
    /// Byte to send
    #[arg(long, default_value = "A")]
    byte: char,

    /// Disable the loopback so the receive side times out
    #[arg(long)]
    no_loopback: bool,

    #[arg(long, default_value = "100000")]
    timeout: u32,
}

#[derive(Args, Debug)]
struct TimerArgs {
    #[arg(long, default_value = "1000")]
    reload: u32,

    /// Counter increments per poll iteration
    #[arg(long, default_value = "1")]
    ticks: u32,

    /// Service overflows with the timer interrupt handler while waiting
    #[arg(long)]
    irq: bool,

    #[arg(long, default_value = "100000")]
    timeout: u32,
}

#[derive(Args, Debug)]
struct CostArgs {
    #[arg(long, default_value = "1000000")]
    iterations: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays machine-readable.
    let level = if cli.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run_scenario(args),
        Commands::Polling(args) => run_polling(args),
        Commands::Gpio => run_gpio(),
        Commands::Uart(args) => run_uart(args),
        Commands::Timer(args) => run_timer(args),
        Commands::Cost(args) => run_cost(args),
    }
}

fn load_scenario(args: &RunArgs) -> anyhow::Result<ScenarioConfig> {
    let mut config = match &args.config {
        Some(path) => ScenarioConfig::from_file(path)
            .with_context(|| format!("Failed to load scenario {:?}", path))?,
        None => ScenarioConfig::default(),
    };
    if let Some(cap) = args.max_iterations {
        config.control.iteration_cap = cap;
    }
    if let Some(interval) = args.interval_ms {
        config.trigger.interval_ms = interval;
    }
    config.validate()?;
    Ok(config)
}

#[derive(Debug)]
enum RunFailure {
    Config(anyhow::Error),
    /// The interrupt trigger thread could not be started.
    Runtime(std::io::Error),
}

impl RunFailure {
    fn exit_code(&self) -> u8 {
        match self {
            RunFailure::Config(_) => EXIT_CONFIG_ERROR,
            RunFailure::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }
}

fn simulate(args: &RunArgs) -> Result<SimulationReport, RunFailure> {
    let config = load_scenario(args).map_err(RunFailure::Config)?;
    info!("Waiting for interrupts (simulated by a background trigger)...");
    Simulator::new(config).run().map_err(RunFailure::Runtime)
}

fn run_scenario(args: RunArgs) -> ExitCode {
    let report = match simulate(&args) {
        Ok(report) => report,
        Err(failure) => {
            match &failure {
                RunFailure::Config(e) => error!("{:#}", e),
                RunFailure::Runtime(e) => error!("Failed to start interrupt trigger: {}", e),
            }
            return ExitCode::from(failure.exit_code());
        }
    };

    if args.json {
        print_json(&report);
    } else {
        print_summary(&report);
    }
    ExitCode::from(EXIT_PASS)
}

fn print_summary(report: &SimulationReport) {
    let run = &report.run;
    println!("=== Simulation complete: {} ===", report.scenario);
    println!("Exit reason:        {}", run.status());
    println!("Loop iterations:    {}", run.cycles);
    println!("Interrupts fired:   {}", report.interrupts_fired);
    println!("Timer overflows:    {}", run.overflow_count);
    println!("UART errors:        {}", run.uart_errors);
    println!("Poll timeouts:      {}", run.timeouts);
    println!(
        "Bytes received:     {} ({:?})",
        run.bytes_received.len(),
        run.received_text()
    );
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(e) => error!("Failed to serialize report: {}", e),
    }
}

fn describe(outcome: &PollOutcome) -> String {
    match outcome {
        PollOutcome::Satisfied { iterations, value } => {
            format!("detected {:#010x} after {} iterations", value, iterations)
        }
        PollOutcome::TimedOut { iterations } => {
            format!("TIMEOUT after {} iterations, change never observed", iterations)
        }
    }
}

fn run_polling(args: PollingArgs) -> ExitCode {
    let contrast =
        walkthrough::polling_contrast(args.change_after, args.timeout, 0xDEAD_BEEF);
    println!(
        "Register changes after {} iterations (timeout {})",
        contrast.change_after, contrast.timeout
    );
    println!("  fresh reads:  {}", describe(&contrast.fresh));
    println!("  cached read:  {}", describe(&contrast.cached));
    if contrast.diverged() {
        println!("The cached poll missed a change the fresh poll saw.");
    }
    ExitCode::from(EXIT_PASS)
}

fn run_gpio() -> ExitCode {
    let devices = Devices::new();
    let walk = walkthrough::gpio_walkthrough(&devices.gpio);
    println!(
        "Configured GPIO pin {} as output (DIRECTION = {:#010x})",
        walkthrough::LED_PIN,
        walk.direction
    );
    println!(
        "Set pin {} HIGH    (OUTPUT = {:#010x})",
        walkthrough::LED_PIN,
        walk.output_after_set
    );
    println!(
        "GPIO pin {} is {}",
        walkthrough::BUTTON_PIN,
        if walk.button_high { "HIGH" } else { "LOW" }
    );
    println!(
        "Toggled pin {}     (OUTPUT = {:#010x})",
        walkthrough::LED_PIN,
        walk.output_after_toggle
    );
    println!(
        "Set pin {} LOW     (OUTPUT = {:#010x})",
        walkthrough::LED_PIN,
        walk.output_after_clear
    );
    ExitCode::from(EXIT_PASS)
}

fn run_uart(args: UartArgs) -> ExitCode {
    if !args.byte.is_ascii() {
        error!("--byte must be an ASCII character");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let devices = Arc::new(Devices::new());
    let hardware = HardwareModel::new(devices.clone()).with_loopback(!args.no_loopback);
    let exchange =
        walkthrough::uart_exchange(&devices, &hardware, args.byte as u8, args.timeout);

    println!("TX ready: {}", describe(&exchange.tx_wait));
    println!("Sent byte {:?} via UART", exchange.sent as char);
    match exchange.received {
        Some(byte) => println!("Received byte: {:#04x} ({:?})", byte, byte as char),
        None => println!("UART receive timeout: {}", describe(&exchange.rx_wait)),
    }
    ExitCode::from(EXIT_PASS)
}

fn run_timer(args: TimerArgs) -> ExitCode {
    if args.reload == 0 {
        error!("--reload must be greater than zero");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let devices = Arc::new(Devices::new());
    devices.timer.reload.write(args.reload);
    devices.timer.enable();
    let flags = SharedFlags::new();
    let hardware = HardwareModel::new(devices.clone()).with_timer_ticks(args.ticks);
    let handler = TimerHandler;

    println!(
        "Timer configured (reload {}), waiting for overflow...",
        args.reload
    );
    let wait = walkthrough::timer_wait(&devices, &flags, &hardware, args.timeout, |_| {
        if args.irq {
            handler.service(&devices, &flags);
        }
    });
    if wait.serviced > 0 {
        println!(
            "Timer overflow serviced by interrupt: {}",
            describe(&wait.outcome)
        );
    } else if wait.outcome.is_satisfied() {
        println!("Timer overflow detected: {}", describe(&wait.outcome));
    } else {
        println!("No overflow: {}", describe(&wait.outcome));
    }
    println!("Counter now {} of {}", wait.counter, wait.reload);
    ExitCode::from(EXIT_PASS)
}

fn run_cost(args: CostArgs) -> ExitCode {
    let cost = walkthrough::access_cost(args.iterations);
    println!("Plain local time:    {:.6} seconds", cost.plain_secs);
    println!("Register time:       {:.6} seconds", cost.register_secs);
    match cost.overhead() {
        Some(ratio) => println!("Access overhead:     {:.2}x", ratio),
        None => println!("Access overhead:     n/a (local loop too fast to time)"),
    }
    println!("Plain final value:    {}", cost.plain_value);
    println!("Register final value: {}", cost.register_value);
    ExitCode::from(EXIT_PASS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes_map_to_distinct_exit_codes() {
        let config = RunFailure::Config(anyhow::anyhow!("bad interval"));
        let runtime = RunFailure::Runtime(std::io::Error::new(
            std::io::ErrorKind::Other,
            "spawn failed",
        ));
        assert_eq!(config.exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(runtime.exit_code(), EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_invalid_override_is_config_failure() {
        let args = RunArgs {
            max_iterations: Some(0),
            ..RunArgs::default()
        };
        match simulate(&args) {
            Err(failure @ RunFailure::Config(_)) => {
                assert_eq!(failure.exit_code(), EXIT_CONFIG_ERROR)
            }
            other => panic!("expected config failure, got {:?}", other.map(|_| ())),
        }
    }
}
