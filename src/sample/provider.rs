use log::*;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::{error::ProviderError, sample::ProcessSample};

/// Source of per-process counter readings.
///
/// The returned samples need not be sorted; each call must complete or fail
/// within a bounded time.
pub trait MetricsProvider {
    fn fetch_snapshot(&mut self) -> Result<Vec<ProcessSample>, ProviderError>;
}

/// Reads every process on the host through `sysinfo`.
///
/// `sysinfo` reports accumulated CPU time (milliseconds) without a
/// kernel/user split, so all of it lands in the user time.
pub struct SysinfoProvider {
    sys: System,
}

impl std::fmt::Debug for SysinfoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProvider")
            .field("processes", &self.sys.processes().len())
            .finish()
    }
}

impl SysinfoProvider {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for SysinfoProvider {
    fn fetch_snapshot(&mut self) -> Result<Vec<ProcessSample>, ProviderError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProviderError::Unavailable(
                "platform not supported by sysinfo".to_string(),
            ));
        }
        let refreshed = self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_disk_usage(),
        );
        trace!(target: "Sampler", "Refreshed {} processes", refreshed);
        if refreshed == 0 {
            return Err(ProviderError::AccessDenied(
                "no process could be read".to_string(),
            ));
        }
        let samples = self
            .sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                let disk = process.disk_usage();
                ProcessSample::new(pid.as_u32(), process.name().to_string_lossy())
                    .with_cpu(0, process.accumulated_cpu_time())
                    .with_working_set(process.memory())
                    .with_io(disk.total_read_bytes, disk.total_written_bytes)
            })
            .collect();
        Ok(samples)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysinfo_snapshot_contains_this_process() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let mut provider = SysinfoProvider::new();
        let samples = provider.fetch_snapshot().unwrap();
        let me = std::process::id();
        assert!(
            samples.iter().any(|s| s.id().0 == me),
            "pid {} missing from {} samples",
            me,
            samples.len()
        );
    }
}
