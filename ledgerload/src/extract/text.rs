use super::read_input;
use crate::error::ExtractError;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tracing::debug;

lazy_static! {
    static ref DURATION_LINE: Regex =
        Regex::new(r"Duration\s+\[total, attack, wait\]\s+([\d.]+)ms")
            .expect("duration pattern is a valid regex");
}

/// Every `Duration [total, attack, wait] <n>ms` value in `text`, in order of appearance.
///
/// Anything that does not match, including numbers that fail to parse, is ignored.
pub fn extract_durations(text: &str) -> Vec<f64> {
    DURATION_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let raw = &caps[1];
            match raw.parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    debug!("Ignoring malformed duration {raw:?}");
                    None
                }
            }
        })
        .collect()
}

pub fn extract_durations_from_file(path: impl AsRef<Path>) -> Result<Vec<f64>, ExtractError> {
    Ok(extract_durations(&read_input(path.as_ref())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order() {
        let report = "\
Requests      [total, rate, throughput]  100, 10.10, 10.09
Duration      [total, attack, wait]      12.5ms
Latencies     [min, mean, 50, 90, 95, 99, max]  1ms, 2ms
garbage line
Duration [total, attack, wait] 3ms
Duration [total, attack, wait] 7.25ms trailing text
";
        assert_eq!(extract_durations(report), vec![12.5, 3., 7.25]);
    }

    #[test]
    fn ignores_non_matching_content() {
        assert!(extract_durations("").is_empty());
        assert!(extract_durations("Duration [total, wait] 3ms").is_empty());
        assert!(extract_durations("duration [total, attack, wait] 3ms").is_empty());
        assert!(extract_durations("Duration [total, attack, wait] 3s").is_empty());
    }

    #[test]
    fn malformed_number_is_skipped() {
        let report = "Duration [total, attack, wait] 1.2.3ms\nDuration [total, attack, wait] 4ms";
        assert_eq!(extract_durations(report), vec![4.]);
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(matches!(
            extract_durations_from_file("/definitely/not/here.txt"),
            Err(ExtractError::Io { .. })
        ));
    }
}
