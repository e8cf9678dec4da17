// Run command - load a plan, wire the reporters and execute it

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::config::Config;
use crate::execution::TestRunner;
use crate::extensions::{InMemoryTracker, TicketListener};
use crate::plan::TestPlan;
use crate::report::ResultPrinter;
use crate::state::TestResults;

/// Run the plan named in `args`, printing to stdout. Returns whether the run was successful.
pub fn run_tests(args: &RunArgs, config: &Config, verbose: bool) -> Result<bool> {
    if args.plan.is_none() {
        warn!("No test plan provided. Use 'unitrun --help' for usage.");
        return Ok(true);
    }

    let printer = ResultPrinter::stdout(args.printer_options(config, verbose));
    let results = execute(TestRunner::new(printer), args, config)?;

    Ok(results.was_successful())
}

/// Drive one run on an already built runner, syncing the ticket ledger if one was given
pub fn execute<W: Write + 'static>(
    mut runner: TestRunner<W>,
    args: &RunArgs,
    config: &Config,
) -> Result<TestResults> {
    let Some(plan_path) = &args.plan else {
        anyhow::bail!("No test plan provided");
    };
    let suite = TestPlan::load(plan_path)?
        .into_suite()
        .with_context(|| format!("Invalid test plan: {}", plan_path.display()))?;
    info!("Loaded plan '{}' from {}", suite.name(), plan_path.display());
    let options = args.run_options(config);

    let tickets = match &args.tickets {
        Some(path) => {
            let tracker = InMemoryTracker::load(path)?;
            let listener = Rc::new(RefCell::new(TicketListener::new(tracker)));
            runner.add_listener(Box::new(Rc::clone(&listener)));
            Some((path, listener))
        }
        None => None,
    };

    let results = runner.do_run(suite, &options)?;

    if let Some((path, listener)) = tickets {
        let listener = listener.borrow();
        let tracker = listener.tracker();
        tracker.save(path)?;
        info!(
            "Saved {} ticket update(s) to {}",
            tracker.updates().len(),
            path.display()
        );
    }

    Ok(results)
}
