// DRY RUN: SHOW HOW THREADS WOULD BE SPREAD AND WHAT EACH WORKER WOULD RUN.
// NOTHING IS LAUNCHED.

use anyhow::Result;

use cphagg::FleetConfig;

pub fn run_plan(config: &FleetConfig, show_commands: bool) -> Result<()> {
    let dist = config.distribution()?;

    println!("CPHAGG THREAD PLAN");
    println!();
    println!("  THREADS:         {}", dist.threads);
    println!("  PROCESSES:       {}", dist.processes);
    println!("  LOW / HIGH:      {} / {} (remainder {})", dist.low, dist.high, dist.remainder);
    println!();
    for line in dist.breakdown() {
        println!("{}", line);
    }

    if show_commands {
        let template = config.template()?;
        println!();
        for (index, threads) in dist.per_process().into_iter().enumerate() {
            let argv = template.for_worker(index, threads);
            let joined = shlex::try_join(argv.iter().map(String::as_str))?;
            println!("  {:>4}  {}", index, joined);
        }
    }

    Ok(())
}
