/// Thread pool setup for parallel parsing and graph harvesting.
/// Half the machine is left to whatever invoked the tool.

use anyhow::Result;

/// Install the global rayon pool sized to half the available cores,
/// minimum one worker.
pub fn init_thread_pool() -> Result<()> {
    let cores = num_cpus::get();
    let workers = std::cmp::max(1, cores / 2);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    println!(
        "[callvault] Initialized thread pool: {} workers (system has {} cores)",
        workers, cores
    );

    Ok(())
}
