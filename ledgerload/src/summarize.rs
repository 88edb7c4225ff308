//! Percentile summaries over latency samples.
use ledgerload_core::{PercentileReport, Summary, REPORTED_PERCENTILES};

/// Compute p50/p90/p95/p99 with linear interpolation between closest ranks.
///
/// Returns [`Summary::NoData`] for an empty sample set. The input is not modified.
pub fn summarize(samples: &[f64]) -> Summary {
    if samples.is_empty() {
        return Summary::NoData;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let [p50, p90, p95, p99] = REPORTED_PERCENTILES.map(|q| percentile(&sorted, q));
    Summary::Report(PercentileReport {
        count: sorted.len(),
        p50,
        p90,
        p95,
        p99,
    })
}

/// Percentile `q` (0..=100) of an ascending, non-empty slice.
///
/// The rank `q/100 * (n-1)` falls between two order statistics; the result interpolates linearly
/// between them, interpolating from the nearer end so results match numpy's `percentile` bit for bit.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let last = sorted.len() - 1;
    let rank = (q / 100.).clamp(0., 1.) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi.min(last)]);
    if weight >= 0.5 {
        b - (b - a) * (1. - weight)
    } else {
        a + (b - a) * weight
    }
}

pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
    use rand_distr::{Distribution, SkewNormal};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn one_to_hundred() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        let report = *summarize(&samples).report().unwrap();

        assert_eq!(report.count, 100);
        assert!(close(report.p50, 50.5), "{}", report.p50);
        assert!(close(report.p90, 90.1), "{}", report.p90);
        assert!(close(report.p95, 95.05), "{}", report.p95);
        assert!(close(report.p99, 99.01), "{}", report.p99);
    }

    #[test]
    fn order_does_not_matter() {
        let mut samples: Vec<f64> = (1..=100).map(f64::from).collect();
        samples.shuffle(&mut SmallRng::seed_from_u64(4));
        let copy = samples.clone();

        let report = *summarize(&samples).report().unwrap();
        assert!(close(report.p50, 50.5));
        assert_eq!(samples, copy);
    }

    #[test]
    fn empty_is_no_data() {
        assert_eq!(summarize(&[]), Summary::NoData);
    }

    #[test]
    fn single_sample() {
        let report = *summarize(&[42.]).report().unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.p50, 42.);
        assert_eq!(report.p99, 42.);
    }

    #[test]
    fn interpolates_small_sets() {
        let sorted = [10., 20., 30., 40.];
        assert!(close(percentile(&sorted, 50.), 25.));
        assert!(close(percentile(&sorted, 90.), 37.));
        assert!(close(percentile(&sorted, 0.), 10.));
        assert!(close(percentile(&sorted, 100.), 40.));
    }

    #[test]
    fn upper_half_interpolates_from_the_upper_rank() {
        let report = *summarize(&[0.1, 0.5]).report().unwrap();
        assert_eq!(report.p50, 0.3);
        assert_eq!(percentile(&[0.1, 0.5], 25.), 0.2);
    }

    #[test]
    fn skewed_latencies_are_ordered() {
        let dist = SkewNormal::<f64>::new(120., 40., 8.).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let samples: Vec<f64> = (0..5_000).map(|_| dist.sample(&mut rng).max(0.)).collect();
        let report = *summarize(&samples).report().unwrap();

        let max = samples.iter().copied().fold(f64::MIN, f64::max);
        let min = samples.iter().copied().fold(f64::MAX, f64::min);
        assert!(min <= report.p50);
        assert!(report.p50 <= report.p90);
        assert!(report.p90 <= report.p95);
        assert!(report.p95 <= report.p99);
        assert!(report.p99 <= max);
    }

    #[test]
    fn mean_of_samples() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1., 2., 3.]), Some(2.));
    }
}
