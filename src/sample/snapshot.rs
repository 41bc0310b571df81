use std::fmt;

use crate::{error::RankError, sample::counter::CounterValue};

/// OS process identifier. Unique within one snapshot, reused by the OS over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        ProcessId(value)
    }
}

/// One process's counters at one snapshot instant.
///
/// CPU times and I/O bytes are cumulative since process start; the working
/// set is an instantaneous reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSample {
    id: ProcessId,
    name: String,
    kernel_time: CounterValue,
    user_time: CounterValue,
    working_set: CounterValue,
    read_bytes: CounterValue,
    write_bytes: CounterValue,
}

impl ProcessSample {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ProcessId(id),
            name: name.into(),
            kernel_time: CounterValue::ZERO,
            user_time: CounterValue::ZERO,
            working_set: CounterValue::ZERO,
            read_bytes: CounterValue::ZERO,
            write_bytes: CounterValue::ZERO,
        }
    }

    pub fn with_cpu(mut self, kernel: u64, user: u64) -> Self {
        self.kernel_time = kernel.into();
        self.user_time = user.into();
        self
    }

    pub fn with_working_set(mut self, bytes: u64) -> Self {
        self.working_set = bytes.into();
        self
    }

    pub fn with_io(mut self, read: u64, write: u64) -> Self {
        self.read_bytes = read.into();
        self.write_bytes = write.into();
        self
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name for display, falling back to the pid for nameless processes.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("<pid {}>", self.id)
        } else {
            self.name.clone()
        }
    }

    pub fn kernel_time(&self) -> CounterValue {
        self.kernel_time
    }

    pub fn user_time(&self) -> CounterValue {
        self.user_time
    }

    pub fn working_set(&self) -> CounterValue {
        self.working_set
    }

    pub fn read_bytes(&self) -> CounterValue {
        self.read_bytes
    }

    pub fn write_bytes(&self) -> CounterValue {
        self.write_bytes
    }

    pub fn total_time(&self) -> CounterValue {
        self.kernel_time + self.user_time
    }

    pub fn total_bytes(&self) -> CounterValue {
        self.read_bytes + self.write_bytes
    }
}

/// Process samples taken at one instant, ascending by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    samples: Vec<ProcessSample>,
}

impl Snapshot {
    /// Sort provider output by id. Two samples with the same id would make
    /// alignment ambiguous, so they are rejected.
    pub fn from_unsorted(mut samples: Vec<ProcessSample>) -> Result<Self, RankError> {
        samples.sort_by_key(ProcessSample::id);
        Self::from_sorted(samples)
    }

    /// Accept samples that are already strictly ascending by id.
    pub fn from_sorted(samples: Vec<ProcessSample>) -> Result<Self, RankError> {
        if let Some(index) = samples.windows(2).position(|w| w[0].id >= w[1].id) {
            return Err(RankError::AlignmentPrecondition {
                index: index + 1,
                previous: samples[index].id,
                current: samples[index + 1].id,
            });
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[ProcessSample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a ProcessSample;
    type IntoIter = std::slice::Iter<'a, ProcessSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
