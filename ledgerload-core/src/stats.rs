use std::fmt;

/// p50/p90/p95/p99 over a non-empty sample set, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PercentileReport {
    pub count: usize,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Renders the four percentile lines, rounded to two decimal places.
impl fmt::Display for PercentileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overall p50: {:.2} ms", self.p50)?;
        writeln!(f, "Overall p90: {:.2} ms", self.p90)?;
        writeln!(f, "Overall p95: {:.2} ms", self.p95)?;
        write!(f, "Overall p99: {:.2} ms", self.p99)
    }
}

/// Result of summarizing a sample set. An empty set is `NoData`, never a report full of zeros.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Summary {
    NoData,
    Report(PercentileReport),
}

impl Summary {
    pub fn report(&self) -> Option<&PercentileReport> {
        match self {
            Summary::Report(report) => Some(report),
            Summary::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Summary::NoData)
    }

    pub fn count(&self) -> usize {
        self.report().map_or(0, |report| report.count)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::NoData => write!(f, "No Duration data found."),
            Summary::Report(report) => write!(f, "Count: {}\n{report}", report.count),
        }
    }
}
