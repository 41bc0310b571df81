//! Human readable values and the rows handed to the display.

use crate::sample::{
    CounterValue,
    rank::{RankValue, Ranking},
};

const KB: u128 = 1 << 10;
const MB: u128 = 1 << 20;
const GB: u128 = 1 << 30;
const TB: u128 = 1 << 40;

/// Byte count with a binary unit, rounded half up to a whole number.
///
/// Anything from one terabyte up is reported as "Too big".
pub fn format_bytes(bytes: CounterValue) -> String {
    let b = bytes.get();
    if b < KB {
        format!("{b}B")
    } else if b < MB {
        format!("{}KB", rounded_div(b, KB))
    } else if b < GB {
        format!("{}MB", rounded_div(b, MB))
    } else if b < TB {
        format!("{}GB", rounded_div(b, GB))
    } else {
        "Too big".to_string()
    }
}

/// Byte rate, formatted like [`format_bytes`] with a "/s" suffix.
pub fn format_throughput(bytes_per_second: CounterValue) -> String {
    format!("{}/s", format_bytes(bytes_per_second))
}

/// Percentage with exactly two decimals, independent of locale.
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.2}%")
}

fn rounded_div(value: u128, unit: u128) -> u128 {
    (value + unit / 2) / unit
}

/// Thresholds above which a row is flagged for highlighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotThresholds {
    pub cpu_percent: f64,
    pub memory_bytes: CounterValue,
    pub io_bytes_per_second: CounterValue,
}

impl Default for HotThresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 50.0,
            memory_bytes: CounterValue::new(GB),
            io_bytes_per_second: CounterValue::new(10 * MB),
        }
    }
}

impl HotThresholds {
    fn is_hot(&self, value: &RankValue) -> bool {
        match value {
            RankValue::Cpu { .. } => value.percent().is_some_and(|p| p > self.cpu_percent),
            RankValue::Memory(bytes) => *bytes > self.memory_bytes,
            RankValue::Io { per_second, .. } => *per_second > self.io_bytes_per_second,
        }
    }
}

/// One line of the ranked list as the display shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub display_name: String,
    pub display_value: String,
    pub is_hot: bool,
}

pub fn display_rows(ranking: &Ranking, hot: &HotThresholds) -> Vec<DisplayRow> {
    ranking
        .entries
        .iter()
        .map(|entry| DisplayRow {
            display_name: entry.sample.display_name(),
            display_value: display_value(&entry.value),
            is_hot: hot.is_hot(&entry.value),
        })
        .collect()
}

fn display_value(value: &RankValue) -> String {
    match value {
        RankValue::Cpu { .. } => format_percent(value.percent().unwrap_or_default()),
        RankValue::Memory(bytes) => format_bytes(*bytes),
        RankValue::Io { per_second, .. } => format_throughput(*per_second),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{ProcessSample, rank::{Metric, RankedEntry}};

    macro_rules! bytes_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (bytes, expected): (u64, &str) = $value;
                    assert_eq!(format_bytes(CounterValue::from(bytes)), expected, "{} bytes", bytes);
                }
            )*
        }
    }

    bytes_tests! {
        zero_bytes: (0, "0B"),
        largest_plain_bytes: (1023, "1023B"),
        one_kilobyte: (1024, "1KB"),
        kilobytes_round_down: (1535, "1KB"),
        kilobytes_round_half_up: (1536, "2KB"),
        just_under_a_megabyte: (1_048_575, "1024KB"),
        one_megabyte: (1_048_576, "1MB"),
        megabytes: (5 * 1_048_576 + 524_288, "6MB"),
        one_gigabyte: (1_073_741_824, "1GB"),
        largest_gigabytes: (1_099_511_627_775, "1024GB"),
        one_terabyte: (1_099_511_627_776, "Too big"),
        largest_counter: (u64::MAX, "Too big"),
    }

    #[test]
    fn percentages_have_two_decimals() {
        assert_eq!(format_percent(48.19), "48.19%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(100.0), "100.00%");
        assert_eq!(format_percent(3.5), "3.50%");
    }

    #[test]
    fn throughput_has_a_rate_suffix() {
        assert_eq!(format_throughput(CounterValue::from(2048u64)), "2KB/s");
        assert_eq!(format_throughput(CounterValue::ZERO), "0B/s");
    }

    fn entry(name: &str, value: RankValue) -> RankedEntry {
        RankedEntry {
            sample: ProcessSample::new(1, name),
            value,
        }
    }

    #[test]
    fn rows_are_rendered_and_flagged() {
        let ranking = Ranking {
            metric: Metric::Cpu,
            entries: vec![
                entry(
                    "busy",
                    RankValue::Cpu {
                        delta: CounterValue::from(60u64),
                        share: 6000,
                    },
                ),
                entry(
                    "half",
                    RankValue::Cpu {
                        delta: CounterValue::from(50u64),
                        share: 5000,
                    },
                ),
            ],
            system_total: Some(CounterValue::from(100u64)),
            underflows: vec![],
        };
        let rows = display_rows(&ranking, &HotThresholds::default());
        assert_eq!(
            rows,
            vec![
                DisplayRow {
                    display_name: "busy".to_string(),
                    display_value: "60.00%".to_string(),
                    is_hot: true,
                },
                DisplayRow {
                    display_name: "half".to_string(),
                    display_value: "50.00%".to_string(),
                    is_hot: false,
                },
            ]
        );
    }

    #[test]
    fn memory_and_io_rows() {
        let hot = HotThresholds {
            cpu_percent: 50.0,
            memory_bytes: CounterValue::from(1_048_576u64),
            io_bytes_per_second: CounterValue::from(1024u64),
        };
        let ranking = Ranking {
            metric: Metric::Memory,
            entries: vec![
                entry("big", RankValue::Memory(CounterValue::from(2 * 1_048_576u64))),
                entry(
                    "writer",
                    RankValue::Io {
                        delta: CounterValue::from(3072u64),
                        per_second: CounterValue::from(1024u64),
                    },
                ),
            ],
            system_total: None,
            underflows: vec![],
        };
        let rows = display_rows(&ranking, &hot);
        assert_eq!(rows[0].display_value, "2MB");
        assert!(rows[0].is_hot);
        assert_eq!(rows[1].display_value, "1KB/s");
        assert!(!rows[1].is_hot, "equal to the threshold is not above it");
    }
}
