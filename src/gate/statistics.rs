// Statistical significance testing for baseline vs candidate samples
//
// Non-parametric methods suited to safety metrics, which are frequently
// Bernoulli outcomes or bounded rates rather than normal data:
// - Percentile bootstrap confidence interval on the difference in means
// - Two-sided permutation test with add-one correction
// - Cohen's d effect size with pooled standard deviation
// - Normal-approximation power and required sample size (statrs)
//
// Reproducibility: every resampling iteration `i` draws from its own
// Xoshiro256++ generator seeded by `counter_rng_seed(seed ^ domain, i)`.
// Results therefore do not depend on rayon's work splitting, and a fixed
// seed gives bit-identical intervals and p-values on every call.

use crate::gate::direction::MetricDirection;
use crate::gate::error::{GateError, Result, SampleGroup};
use crate::gate::verdict::Verdict;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Stream separator for bootstrap iterations
const BOOTSTRAP_DOMAIN: u64 = 0xB007_5742_A11C_E5ED;

/// Stream separator for permutation iterations
const PERMUTATION_DOMAIN: u64 = 0x9E37_79B9_7F4A_7C15;

/// Absorbs summation-order noise when comparing permuted and observed statistics
const TIE_TOLERANCE: f64 = 1e-12;

/// Target power for the required-sample-size figure
pub const TARGET_POWER: f64 = 0.8;

/// Sample size needed per group to reach the target power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRequirement {
    Finite(u64),
    /// Zero effect size: no finite sample size can detect it
    Unbounded,
}

impl SampleRequirement {
    pub fn as_finite(&self) -> Option<u64> {
        match self {
            SampleRequirement::Finite(n) => Some(*n),
            SampleRequirement::Unbounded => None,
        }
    }
}

/// Result of statistical significance testing for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalResult {
    /// Observed `mean(candidate) - mean(baseline)`
    pub delta: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Two-sided permutation p-value
    pub p_value: f64,
    /// `p_value < alpha`
    pub is_significant: bool,
    /// Cohen's d (signed, candidate minus baseline)
    pub effect_size: f64,
    /// Estimated power to detect `|effect_size|` at the observed sample size
    pub power: f64,
    pub samples_needed_for_power_80: SampleRequirement,
}

impl StatisticalResult {
    /// Re-express this result in badness orientation (positive = worse)
    ///
    /// For lower-is-worse metrics the delta is negated and the interval
    /// bounds are negated and swapped, so `ci_lower <= delta <= ci_upper`
    /// still holds.
    pub fn oriented(&self, direction: MetricDirection) -> StatisticalResult {
        match direction {
            MetricDirection::HigherIsWorse => self.clone(),
            MetricDirection::LowerIsWorse => StatisticalResult {
                delta: -self.delta,
                ci_lower: -self.ci_upper,
                ci_upper: -self.ci_lower,
                effect_size: -self.effect_size,
                ..self.clone()
            },
        }
    }
}

/// Seeded analyzer for bootstrap intervals and permutation tests
///
/// # Example
/// ```
/// use safety_gate::gate::StatisticalAnalyzer;
///
/// let analyzer = StatisticalAnalyzer::new(42).with_iterations(2_000, 2_000);
/// let baseline = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
/// let candidate = vec![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0];
///
/// let result = analyzer.analyze(&baseline, &candidate, 0.05).unwrap();
/// assert!(result.ci_lower <= result.delta && result.delta <= result.ci_upper);
/// ```
#[derive(Debug, Clone)]
pub struct StatisticalAnalyzer {
    confidence_level: f64,
    n_bootstrap: usize,
    n_permutations: usize,
    min_sample_size: usize,
    seed: u64,
}

impl Default for StatisticalAnalyzer {
    fn default() -> Self {
        Self::new(42)
    }
}

impl StatisticalAnalyzer {
    /// Analyzer with 95% intervals and 10,000 iterations per test
    pub fn new(seed: u64) -> Self {
        Self {
            confidence_level: 0.95,
            n_bootstrap: 10_000,
            n_permutations: 10_000,
            min_sample_size: 2,
            seed,
        }
    }

    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    pub fn with_iterations(mut self, n_bootstrap: usize, n_permutations: usize) -> Self {
        self.n_bootstrap = n_bootstrap;
        self.n_permutations = n_permutations;
        self
    }

    /// Minimum samples per group; values below 2 are raised to 2
    pub fn with_min_sample_size(mut self, min_sample_size: usize) -> Self {
        self.min_sample_size = min_sample_size.max(2);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Percentile bootstrap interval for the difference in means
    ///
    /// Returns `(delta, ci_lower, ci_upper)`. The observed delta is computed
    /// once from the original samples; resamples only shape the interval.
    pub fn bootstrap_ci(&self, baseline: &[f64], candidate: &[f64]) -> Result<(f64, f64, f64)> {
        self.validate(baseline, candidate)?;
        if self.n_bootstrap == 0 {
            return Err(GateError::InvalidConfig(
                "n_bootstrap must be > 0".to_string(),
            ));
        }

        let observed = mean(candidate) - mean(baseline);
        let stream = self.seed ^ BOOTSTRAP_DOMAIN;

        let mut deltas: Vec<f64> = (0..self.n_bootstrap)
            .into_par_iter()
            .map(|i| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(stream, i as u64));
                let baseline_mean = resampled_mean(baseline, &mut rng);
                let candidate_mean = resampled_mean(candidate, &mut rng);
                candidate_mean - baseline_mean
            })
            .collect();
        deltas.sort_unstable_by(f64::total_cmp);

        let alpha = 1.0 - self.confidence_level;
        let ci_lower = percentile(&deltas, alpha / 2.0 * 100.0);
        let ci_upper = percentile(&deltas, (1.0 - alpha / 2.0) * 100.0);

        // Skewed resampling distributions can leave the point estimate just
        // outside the percentile interval
        Ok((observed, ci_lower.min(observed), ci_upper.max(observed)))
    }

    /// Two-sided permutation test on `|mean(candidate) - mean(baseline)|`
    ///
    /// `p = (extreme + 1) / (trials + 1)`, so the p-value is never zero.
    /// The pooled values are sorted before shuffling and the split always
    /// draws the smaller group size, which makes the p-value exactly
    /// symmetric under swapping the baseline and candidate labels.
    pub fn permutation_test(&self, baseline: &[f64], candidate: &[f64]) -> Result<f64> {
        self.validate(baseline, candidate)?;
        if self.n_permutations == 0 {
            return Err(GateError::InvalidConfig(
                "n_permutations must be > 0".to_string(),
            ));
        }

        let observed = (mean(candidate) - mean(baseline)).abs();

        let mut pooled: Vec<f64> = baseline.iter().chain(candidate).copied().collect();
        pooled.sort_unstable_by(f64::total_cmp);
        let draw = baseline.len().min(candidate.len());
        let stream = self.seed ^ PERMUTATION_DOMAIN;

        let extreme: usize = (0..self.n_permutations)
            .into_par_iter()
            .fold_with(
                (Vec::with_capacity(pooled.len()), 0usize),
                |(mut buffer, count), i| {
                    buffer.clear();
                    buffer.extend_from_slice(&pooled);
                    let mut rng =
                        Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(stream, i as u64));
                    let hit = {
                        let (drawn, rest) = buffer.partial_shuffle(&mut rng, draw);
                        (mean(drawn) - mean(rest)).abs() + TIE_TOLERANCE >= observed
                    };
                    (buffer, count + usize::from(hit))
                },
            )
            .map(|(_, count)| count)
            .sum();

        Ok((extreme as f64 + 1.0) / (self.n_permutations as f64 + 1.0))
    }

    /// Complete analysis: interval, p-value, effect size and power
    ///
    /// # Errors
    /// Returns a named invalid-input error for empty, too-short, non-finite
    /// or zero-variance input instead of producing NaN figures.
    pub fn analyze(
        &self,
        baseline: &[f64],
        candidate: &[f64],
        alpha: f64,
    ) -> Result<StatisticalResult> {
        validate_level("alpha", alpha)?;
        validate_level("confidence_level", self.confidence_level)?;

        let (delta, ci_lower, ci_upper) = self.bootstrap_ci(baseline, candidate)?;
        let p_value = self.permutation_test(baseline, candidate)?;
        let effect_size = cohens_d(baseline, candidate);

        let n = baseline.len().min(candidate.len());
        let power = power_analysis(effect_size.abs(), n, alpha)?;
        let samples_needed = samples_for_power(effect_size.abs(), TARGET_POWER, alpha)?;

        Ok(StatisticalResult {
            delta,
            ci_lower,
            ci_upper,
            p_value,
            is_significant: p_value < alpha,
            effect_size,
            power,
            samples_needed_for_power_80: samples_needed,
        })
    }

    fn validate(&self, baseline: &[f64], candidate: &[f64]) -> Result<()> {
        for (group, samples) in [
            (SampleGroup::Baseline, baseline),
            (SampleGroup::Candidate, candidate),
        ] {
            if samples.is_empty() {
                return Err(GateError::EmptySamples { group });
            }
            if samples.iter().any(|v| !v.is_finite()) {
                return Err(GateError::NonFiniteSample { group });
            }
            // Finite values can still overflow the sum
            if !mean(samples).is_finite() || !sample_variance(samples).is_finite() {
                return Err(GateError::NonFiniteSample { group });
            }
        }

        let smallest = baseline.len().min(candidate.len());
        if smallest < self.min_sample_size {
            return Err(GateError::InsufficientSamples {
                required: self.min_sample_size,
                actual: smallest,
            });
        }

        if sample_variance(baseline) == 0.0 && sample_variance(candidate) == 0.0 {
            return Err(GateError::ZeroVariance);
        }

        Ok(())
    }
}

/// Cohen's d with pooled sample standard deviation (ddof = 1)
///
/// Returns 0.0 when the pooled standard deviation is zero or when there are
/// too few samples to estimate it.
pub fn cohens_d(baseline: &[f64], candidate: &[f64]) -> f64 {
    let (n1, n2) = (baseline.len(), candidate.len());
    if n1 + n2 <= 2 {
        return 0.0;
    }

    let pooled_var = ((n1 as f64 - 1.0) * sample_variance(baseline)
        + (n2 as f64 - 1.0) * sample_variance(candidate))
        / (n1 + n2 - 2) as f64;
    let pooled_std = pooled_var.sqrt();

    if pooled_std == 0.0 || !pooled_std.is_finite() {
        return 0.0;
    }

    (mean(candidate) - mean(baseline)) / pooled_std
}

/// Power to detect `effect_size` with `n_samples` per group (two-sided)
pub fn power_analysis(effect_size: f64, n_samples: usize, alpha: f64) -> Result<f64> {
    validate_level("alpha", alpha)?;
    let normal = standard_normal()?;

    let ncp = effect_size * (n_samples as f64 / 2.0).sqrt();
    let critical = normal.inverse_cdf(1.0 - alpha / 2.0);

    Ok(1.0 - normal.cdf(critical - ncp) + normal.cdf(-critical - ncp))
}

/// Per-group sample size for `target_power` at `alpha` (ceiling)
pub fn samples_for_power(
    effect_size: f64,
    target_power: f64,
    alpha: f64,
) -> Result<SampleRequirement> {
    validate_level("alpha", alpha)?;
    validate_level("target_power", target_power)?;

    if effect_size == 0.0 || !effect_size.is_finite() {
        return Ok(SampleRequirement::Unbounded);
    }

    let normal = standard_normal()?;
    let z_alpha = normal.inverse_cdf(1.0 - alpha / 2.0);
    let z_beta = normal.inverse_cdf(target_power);

    let n = 2.0 * ((z_alpha + z_beta) / effect_size).powi(2);
    if !n.is_finite() || n >= u64::MAX as f64 {
        return Ok(SampleRequirement::Unbounded);
    }
    Ok(SampleRequirement::Finite(n.ceil() as u64))
}

/// Gating decision that accounts for significance and interval width
///
/// - Not a regression → OK
/// - Regression, not significant → WARN (trend without evidence)
/// - Significant and the near interval bound clears `threshold` → BLOCK
/// - Significant and only the point estimate clears `threshold` → WARN
/// - Otherwise → OK
///
/// Never returns BLOCK for a non-significant result.
pub fn gate_with_significance(
    result: &StatisticalResult,
    threshold: f64,
    direction: MetricDirection,
) -> Verdict {
    let oriented = result.oriented(direction);

    if oriented.delta <= 0.0 {
        return Verdict::Ok;
    }
    if !oriented.is_significant {
        return Verdict::Warn;
    }

    if oriented.ci_lower > threshold {
        Verdict::Block
    } else if oriented.delta.abs() > threshold {
        Verdict::Warn
    } else {
        Verdict::Ok
    }
}

/// Linear-interpolation percentile of pre-sorted data (`q` in 0..=100)
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// SplitMix64 finalizer over `seed + counter`
///
/// Gives each resampling iteration an independent, well-mixed seed so that
/// iteration `i` sees the same stream on any thread.
pub fn counter_rng_seed(seed: u64, counter: u64) -> u64 {
    let mut z = seed.wrapping_add(counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (ddof = 1); zero for fewer than two values
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

fn resampled_mean<R: Rng>(values: &[f64], rng: &mut R) -> f64 {
    let n = values.len();
    (0..n).map(|_| values[rng.gen_range(0..n)]).sum::<f64>() / n as f64
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| GateError::Distribution(e.to_string()))
}

fn validate_level(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(GateError::InvalidConfig(format!(
            "{name} must be in (0, 1), got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> StatisticalAnalyzer {
        StatisticalAnalyzer::new(7).with_iterations(2_000, 2_000)
    }

    fn bernoulli(ones: usize, total: usize) -> Vec<f64> {
        (0..total)
            .map(|i| if i < ones { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 100.0), 4.0);
        assert!((percentile(&data, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(percentile(&[9.0], 37.0), 9.0);
    }

    #[test]
    fn test_counter_seed_is_deterministic_and_spread() {
        assert_eq!(counter_rng_seed(42, 3), counter_rng_seed(42, 3));
        assert_ne!(counter_rng_seed(42, 3), counter_rng_seed(42, 4));
        assert_ne!(counter_rng_seed(42, 3), counter_rng_seed(43, 3));
    }

    #[test]
    fn test_cohens_d_known_value() {
        // means 2 and 4, both sample variances 1 → d = 2
        let baseline = [1.0, 2.0, 3.0];
        let candidate = [3.0, 4.0, 5.0];
        assert!((cohens_d(&baseline, &candidate) - 2.0).abs() < 1e-12);
        assert!((cohens_d(&candidate, &baseline) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cohens_d_zero_pooled_std() {
        assert_eq!(cohens_d(&[1.0, 1.0], &[3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_power_increases_with_samples() {
        let small = power_analysis(0.5, 10, 0.05).unwrap();
        let large = power_analysis(0.5, 200, 0.05).unwrap();
        assert!(small < large);
        assert!(large > 0.9);
    }

    #[test]
    fn test_power_of_zero_effect_is_alpha() {
        let power = power_analysis(0.0, 50, 0.05).unwrap();
        assert!((power - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_samples_for_power_medium_effect() {
        // Classic figure: d = 0.5, alpha = 0.05, power 0.8 → 63 per group
        // under the normal approximation
        let needed = samples_for_power(0.5, 0.8, 0.05).unwrap();
        assert_eq!(needed, SampleRequirement::Finite(63));
    }

    #[test]
    fn test_samples_for_zero_effect_is_unbounded() {
        let needed = samples_for_power(0.0, 0.8, 0.05).unwrap();
        assert_eq!(needed, SampleRequirement::Unbounded);
        assert_eq!(needed.as_finite(), None);
    }

    #[test]
    fn test_bootstrap_contains_delta() {
        let baseline = bernoulli(8, 100);
        let candidate = bernoulli(12, 100);
        let (delta, lower, upper) = fast().bootstrap_ci(&baseline, &candidate).unwrap();
        assert!((delta - 0.04).abs() < 1e-12);
        assert!(lower <= delta && delta <= upper);
    }

    #[test]
    fn test_permutation_detects_large_shift() {
        let baseline = vec![10.0, 12.0, 11.0, 13.0, 10.0, 11.0, 12.0, 10.0];
        let candidate = vec![25.0, 27.0, 26.0, 28.0, 25.0, 26.0, 27.0, 25.0];
        let p = fast().permutation_test(&baseline, &candidate).unwrap();
        assert!(p < 0.01, "p-value {} should be < 0.01", p);
    }

    #[test]
    fn test_permutation_p_value_never_zero() {
        let baseline = vec![0.0, 0.1, 0.0, 0.1];
        let candidate = vec![5.0, 5.1, 5.0, 5.1];
        let analyzer = fast();
        let p = analyzer.permutation_test(&baseline, &candidate).unwrap();
        assert!(p > 0.0);
        assert!(p >= 1.0 / 2_001.0);
    }

    #[test]
    fn test_identical_samples_not_significant() {
        let samples = bernoulli(10, 100);
        let result = fast().analyze(&samples, &samples, 0.05).unwrap();
        assert_eq!(result.delta, 0.0);
        assert!(result.ci_lower <= 0.0 && result.ci_upper >= 0.0);
        assert!(!result.is_significant);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.effect_size, 0.0);
        assert_eq!(result.samples_needed_for_power_80, SampleRequirement::Unbounded);
    }

    #[test]
    fn test_empty_samples_rejected() {
        let err = fast().analyze(&[], &[1.0, 2.0], 0.05).unwrap_err();
        assert_eq!(
            err,
            GateError::EmptySamples {
                group: SampleGroup::Baseline
            }
        );
    }

    #[test]
    fn test_single_sample_rejected() {
        let err = fast().analyze(&[1.0, 2.0], &[3.0], 0.05).unwrap_err();
        assert!(matches!(err, GateError::InsufficientSamples { actual: 1, .. }));
    }

    #[test]
    fn test_zero_variance_rejected() {
        let err = fast()
            .analyze(&[0.5, 0.5, 0.5], &[0.5, 0.5, 0.5], 0.05)
            .unwrap_err();
        assert_eq!(err, GateError::ZeroVariance);
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = fast()
            .analyze(&[1.0, 2.0], &[1.0, f64::NAN], 0.05)
            .unwrap_err();
        assert_eq!(
            err,
            GateError::NonFiniteSample {
                group: SampleGroup::Candidate
            }
        );
    }

    #[test]
    fn test_overflowing_moments_rejected() {
        let err = fast()
            .analyze(&[1e308, 1.5e308, 1.2e308], &[1.0, 2.0, 3.0], 0.05)
            .unwrap_err();
        assert_eq!(
            err,
            GateError::NonFiniteSample {
                group: SampleGroup::Baseline
            }
        );

        // Finite mean but the squared deviations overflow
        let err = fast()
            .analyze(&[1.0, 2.0, 3.0], &[-1e200, 1e200, 0.0], 0.05)
            .unwrap_err();
        assert_eq!(
            err,
            GateError::NonFiniteSample {
                group: SampleGroup::Candidate
            }
        );
    }

    #[test]
    fn test_min_sample_size_enforced() {
        let analyzer = fast().with_min_sample_size(5);
        let err = analyzer
            .analyze(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0, 5.0], 0.05)
            .unwrap_err();
        assert_eq!(
            err,
            GateError::InsufficientSamples {
                required: 5,
                actual: 3
            }
        );
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let err = fast().analyze(&[1.0, 2.0], &[2.0, 3.0], 1.5).unwrap_err();
        assert!(matches!(err, GateError::InvalidConfig(_)));
    }

    #[test]
    fn test_oriented_lower_is_worse() {
        let result = StatisticalResult {
            delta: -0.4,
            ci_lower: -0.6,
            ci_upper: -0.2,
            p_value: 0.01,
            is_significant: true,
            effect_size: -1.0,
            power: 0.9,
            samples_needed_for_power_80: SampleRequirement::Finite(16),
        };
        let oriented = result.oriented(MetricDirection::LowerIsWorse);
        assert_eq!(oriented.delta, 0.4);
        assert_eq!(oriented.ci_lower, 0.2);
        assert_eq!(oriented.ci_upper, 0.6);
        assert_eq!(oriented.effect_size, 1.0);
        assert_eq!(result.oriented(MetricDirection::HigherIsWorse), result);
    }

    fn result(delta: f64, ci: (f64, f64), significant: bool) -> StatisticalResult {
        StatisticalResult {
            delta,
            ci_lower: ci.0,
            ci_upper: ci.1,
            p_value: if significant { 0.01 } else { 0.3 },
            is_significant: significant,
            effect_size: 0.5,
            power: 0.8,
            samples_needed_for_power_80: SampleRequirement::Finite(63),
        }
    }

    #[test]
    fn test_gate_with_significance_paths() {
        let up = MetricDirection::HigherIsWorse;
        assert_eq!(
            gate_with_significance(&result(-0.02, (-0.04, 0.0), true), 0.05, up),
            Verdict::Ok
        );
        assert_eq!(
            gate_with_significance(&result(0.08, (-0.01, 0.15), false), 0.05, up),
            Verdict::Warn
        );
        assert_eq!(
            gate_with_significance(&result(0.09, (0.06, 0.12), true), 0.05, up),
            Verdict::Block
        );
        assert_eq!(
            gate_with_significance(&result(0.07, (0.02, 0.12), true), 0.05, up),
            Verdict::Warn
        );
        assert_eq!(
            gate_with_significance(&result(0.03, (0.01, 0.05), true), 0.05, up),
            Verdict::Ok
        );
    }

    #[test]
    fn test_gate_with_significance_lower_is_worse() {
        let down = MetricDirection::LowerIsWorse;
        // Candidate dropped by 0.8 turns with a tight interval
        let r = result(-0.8, (-1.0, -0.6), true);
        assert_eq!(gate_with_significance(&r, 0.5, down), Verdict::Block);
        // An increase is an improvement
        let r = result(0.8, (0.6, 1.0), true);
        assert_eq!(gate_with_significance(&r, 0.5, down), Verdict::Ok);
    }
}
