// CPHAGG v1.0.0 -- MULTI-PROCESS LOAD FLEET AGGREGATOR
// SPREADS A THREAD BUDGET OVER N WORKER PROCESSES, WATCHES THEIR OUTPUT,
// PRINTS A FLEET-WIDE RATE EVERY INTERVAL AND A JOB SUMMARY AT THE END.

mod cli;

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use cphagg::config::{DEFAULT_ID_FLAG, DEFAULT_THREAD_FLAG};
use cphagg::FleetConfig;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "cphagg")]
#[command(about = "CPHAGG -- RUN LOAD WORKERS ACROSS PROCESSES AND AGGREGATE THEIR RATES")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    // LAUNCH THE FLEET AND AGGREGATE UNTIL EVERY WORKER EXITS
    Run(RunArgs),
    // SHOW THE THREAD DISTRIBUTION (AND WORKER COMMANDS) WITHOUT LAUNCHING
    Plan(PlanArgs),
    // VERIFY THE WORKER COMMAND TOKENIZES AND ITS PROGRAM EXISTS
    Check(CheckArgs),
}

#[derive(Args)]
struct FlagArgs {
    // FLAG CARRYING EACH WORKER'S THREAD COUNT (INJECTED OR OVERWRITTEN)
    #[arg(long, default_value = DEFAULT_THREAD_FLAG, allow_hyphen_values = true)]
    thread_flag: String,

    // FLAG CARRYING EACH WORKER'S ID (INJECTED OR OVERWRITTEN)
    #[arg(long, default_value = DEFAULT_ID_FLAG, allow_hyphen_values = true)]
    id_flag: String,
}

#[derive(Args)]
struct RunArgs {
    // WORKER COMMAND LINE INCLUDING PATH. EXISTING THREAD/ID FLAGS ARE OVERRIDDEN.
    #[arg(short, long, allow_hyphen_values = true)]
    command: String,

    // TOTAL WORKER THREADS ACROSS THE FLEET
    #[arg(short, long)]
    threads: u32,

    // NUMBER OF PROCESSES TO SPREAD THE THREADS OVER
    #[arg(short, long)]
    processes: u32,

    // 0 = MINIMAL, 1 = PREFIX PIDS, 2 = PIDS + EVERY INTERVAL SAMPLE
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    verbose: u8,

    #[command(flatten)]
    flags: FlagArgs,

    // REGEX FOR INTERVAL LINES, NAMED GROUPS id AND rate
    #[arg(long)]
    interval_pattern: Option<String>,

    // REGEX FOR SUMMARY LINES, NAMED GROUPS iterations, seconds AND rate
    #[arg(long)]
    summary_pattern: Option<String>,
}

#[derive(Args)]
struct PlanArgs {
    #[arg(short, long)]
    threads: u32,

    #[arg(short, long)]
    processes: u32,

    // OPTIONAL: ALSO PRINT EACH WORKER'S FINAL COMMAND LINE
    #[arg(short, long, allow_hyphen_values = true)]
    command: Option<String>,

    #[command(flatten)]
    flags: FlagArgs,
}

#[derive(Args)]
struct CheckArgs {
    #[arg(short, long, allow_hyphen_values = true)]
    command: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cphagg::logging::init_logging();

    match cli.command {
        Command::Run(args) => {
            // ADVISORY ONLY: KEEP CTRL+C FROM KILLING US BEFORE THE WORKERS
            // FINISH AND THE SUMMARY PRINTS
            ctrlc::set_handler(move || {
                INTERRUPTED.store(true, Ordering::Relaxed);
                tracing::info!("interrupt received; waiting for workers to exit");
            })?;

            let config = FleetConfig::new(args.command, args.threads, args.processes)
                .with_verbosity(args.verbose)
                .with_flags(args.flags.thread_flag, args.flags.id_flag)
                .with_patterns(args.interval_pattern, args.summary_pattern);
            cli::run::run_fleet(config, &INTERRUPTED)
        }
        Command::Plan(args) => {
            let show_commands = args.command.is_some();
            let command = args.command.unwrap_or_default();
            let config = FleetConfig::new(command, args.threads, args.processes)
                .with_flags(args.flags.thread_flag, args.flags.id_flag);
            cli::plan::run_plan(&config, show_commands)
        }
        Command::Check(args) => cli::check::run_check(&args.command),
    }
}
