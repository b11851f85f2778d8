//! Worker pool sizing
//!
//! Maps a declared task profile to a worker count, bounded by host
//! concurrency and a memory budget. The computation itself is a pure
//! function over `(cores, total memory, task type, per-worker memory)` so
//! it can be unit tested without touching the host; [`HostResources::detect`]
//! supplies the live inputs.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Broad workload shape of a pass, used to size its worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Workers spend most time waiting on I/O; oversubscribe cores
    IoIntensive,
    /// Workers saturate a core; cap near the core count
    CpuIntensive,
}

/// Caller-declared resource profile for a pool of workers
#[derive(Debug, Clone, Copy)]
pub struct TaskProfile {
    pub task_type: TaskType,
    /// Expected peak memory per worker (MB); 0 means "negligible"
    pub memory_per_worker_mb: u64,
}

/// Host capacity inputs for the sizing function
#[derive(Debug, Clone, Copy)]
pub struct HostResources {
    pub cores: usize,
    pub total_memory_mb: u64,
}

impl HostResources {
    /// Detect logical core count and total memory from the running host
    pub fn detect() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);

        let mut system = System::new_all();
        system.refresh_all();
        let total_memory_mb = system.total_memory() / (1024 * 1024);

        Self {
            cores,
            total_memory_mb,
        }
    }
}

/// Compute a worker count for a task profile on a given host
///
/// I/O-intensive pools get `cores * io_multiplier` workers since waiting
/// workers hide latency; CPU-intensive pools are capped at the core count.
/// Either way the count is clamped so `count * memory_per_worker_mb` stays
/// within `min(memory_ceiling_mb, host total memory)`. The result is never
/// less than 1.
pub fn compute_worker_count(
    profile: TaskProfile,
    host: HostResources,
    memory_ceiling_mb: u64,
    io_multiplier: usize,
) -> usize {
    let cores = host.cores.max(1);
    let by_cores = match profile.task_type {
        TaskType::IoIntensive => cores * io_multiplier.max(1),
        TaskType::CpuIntensive => cores,
    };

    let ceiling_mb = memory_ceiling_mb.min(host.total_memory_mb);
    let by_memory = if profile.memory_per_worker_mb == 0 {
        by_cores
    } else {
        (ceiling_mb / profile.memory_per_worker_mb) as usize
    };

    by_cores.min(by_memory).max(1)
}
