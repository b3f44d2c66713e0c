//! Per-state emission distributions.
//!
//! The inference engines consume emissions through the narrow [`Emission`]
//! contract: a total log-density, an observation-shape check, and two
//! optional capabilities (sampling for the generator, a mode for the
//! predictor). Dispatch is static — models are generic over their emission
//! type, so the log-density call compiles down to a direct call in the
//! lattice inner loops.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::HmmError;

/// Log of 2π, used by the Gaussian densities.
const LN_2PI: f64 = 1.837_877_066_409_345_6;

/// Capability contract for a single state's emission distribution.
pub trait Emission {
    /// Observation type this distribution emits.
    type Obs: Clone;

    /// Log-density (continuous) or log-mass (discrete) of an observation.
    ///
    /// Total over the observation space; impossible observations yield
    /// `NEG_INFINITY`, never an error.
    fn log_pdf(&self, obs: &Self::Obs) -> f64;

    /// Dimensionality of the observation space (1 for univariate or
    /// symbolic observations).
    fn dimension(&self) -> usize {
        1
    }

    /// Validate an observation's shape against this distribution.
    ///
    /// The default accepts everything; discrete and multivariate emissions
    /// override it to reject out-of-range symbols and mis-sized vectors.
    fn check(&self, obs: &Self::Obs) -> Result<(), HmmError> {
        let _ = obs;
        Ok(())
    }

    /// Draw an observation, if this distribution supports sampling.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Self::Obs> {
        let _ = rng;
        None
    }

    /// Mode of the distribution, if one is defined.
    fn mode(&self) -> Option<Self::Obs> {
        None
    }
}

/// Discrete emission over the alphabet `{0..K-1}`, stored as log-masses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteEmission {
    log_mass: Vec<f64>,
}

impl DiscreteEmission {
    /// Build from probability-domain masses.
    pub fn from_probabilities(mass: &[f64]) -> Result<Self, HmmError> {
        if mass.is_empty() {
            return Err(HmmError::InvalidModel(
                "discrete emission needs a non-empty alphabet".into(),
            ));
        }
        Ok(Self {
            log_mass: seq_math::ln_vec(mass),
        })
    }

    /// Build directly from log-masses.
    pub fn from_logs(log_mass: Vec<f64>) -> Result<Self, HmmError> {
        if log_mass.is_empty() {
            return Err(HmmError::InvalidModel(
                "discrete emission needs a non-empty alphabet".into(),
            ));
        }
        Ok(Self { log_mass })
    }

    /// Alphabet size K.
    pub fn alphabet_size(&self) -> usize {
        self.log_mass.len()
    }
}

impl Emission for DiscreteEmission {
    type Obs = usize;

    fn log_pdf(&self, obs: &usize) -> f64 {
        self.log_mass
            .get(*obs)
            .copied()
            .unwrap_or(f64::NEG_INFINITY)
    }

    fn check(&self, obs: &usize) -> Result<(), HmmError> {
        if *obs >= self.log_mass.len() {
            return Err(HmmError::InvalidSymbol {
                symbol: *obs,
                alphabet_size: self.log_mass.len(),
            });
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let u: f64 = rng.random();
        let mut acc = 0.0;
        for (symbol, lm) in self.log_mass.iter().enumerate() {
            acc += lm.exp();
            if u < acc {
                return Some(symbol);
            }
        }
        // Rounding in the cumulative sum can leave u just above the total.
        Some(self.log_mass.len() - 1)
    }

    fn mode(&self) -> Option<usize> {
        let mut best = 0;
        for (symbol, lm) in self.log_mass.iter().enumerate().skip(1) {
            if *lm > self.log_mass[best] {
                best = symbol;
            }
        }
        Some(best)
    }
}

/// Univariate Gaussian emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianEmission {
    mean: f64,
    variance: f64,
}

impl GaussianEmission {
    pub fn new(mean: f64, variance: f64) -> Result<Self, HmmError> {
        if !(variance > 0.0) || !variance.is_finite() || !mean.is_finite() {
            return Err(HmmError::InvalidModel(format!(
                "gaussian emission needs finite mean and positive variance, got N({mean}, {variance})"
            )));
        }
        Ok(Self { mean, variance })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }
}

impl Emission for GaussianEmission {
    type Obs = f64;

    fn log_pdf(&self, obs: &f64) -> f64 {
        let diff = obs - self.mean;
        -0.5 * (diff * diff / self.variance + self.variance.ln() + LN_2PI)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        // Variance is validated positive at construction.
        let normal = Normal::new(self.mean, self.variance.sqrt()).ok()?;
        Some(normal.sample(rng))
    }

    fn mode(&self) -> Option<f64> {
        Some(self.mean)
    }
}

/// Multivariate Gaussian emission with diagonal covariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagonalGaussianEmission {
    means: Vec<f64>,
    variances: Vec<f64>,
}

impl DiagonalGaussianEmission {
    pub fn new(means: Vec<f64>, variances: Vec<f64>) -> Result<Self, HmmError> {
        if means.is_empty() {
            return Err(HmmError::InvalidModel(
                "diagonal gaussian emission needs at least one dimension".into(),
            ));
        }
        if means.len() != variances.len() {
            return Err(HmmError::ShapeMismatch {
                expected: means.len(),
                got: variances.len(),
            });
        }
        if variances.iter().any(|v| !(*v > 0.0) || !v.is_finite()) {
            return Err(HmmError::InvalidModel(
                "diagonal gaussian emission needs positive finite variances".into(),
            ));
        }
        Ok(Self { means, variances })
    }
}

impl Emission for DiagonalGaussianEmission {
    type Obs = Vec<f64>;

    fn log_pdf(&self, obs: &Vec<f64>) -> f64 {
        if obs.len() != self.means.len() {
            return f64::NEG_INFINITY;
        }
        let mut log_prob = 0.0;
        for ((x, mean), var) in obs.iter().zip(&self.means).zip(&self.variances) {
            let diff = x - mean;
            log_prob += -0.5 * (diff * diff / var + var.ln() + LN_2PI);
        }
        log_prob
    }

    fn dimension(&self) -> usize {
        self.means.len()
    }

    fn check(&self, obs: &Vec<f64>) -> Result<(), HmmError> {
        if obs.len() != self.means.len() {
            return Err(HmmError::ShapeMismatch {
                expected: self.means.len(),
                got: obs.len(),
            });
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec<f64>> {
        let mut out = Vec::with_capacity(self.means.len());
        for (mean, var) in self.means.iter().zip(&self.variances) {
            let normal = Normal::new(*mean, var.sqrt()).ok()?;
            out.push(normal.sample(rng));
        }
        Some(out)
    }

    fn mode(&self) -> Option<Vec<f64>> {
        Some(self.means.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn discrete_log_pdf_and_mode() {
        let e = DiscreteEmission::from_probabilities(&[0.1, 0.4, 0.5]).unwrap();
        assert!(approx_eq(e.log_pdf(&1), 0.4f64.ln(), 1e-12));
        assert_eq!(e.mode(), Some(2));
        assert_eq!(e.alphabet_size(), 3);
    }

    #[test]
    fn discrete_check_rejects_out_of_range() {
        let e = DiscreteEmission::from_probabilities(&[0.5, 0.5]).unwrap();
        assert_eq!(
            e.check(&2),
            Err(HmmError::InvalidSymbol {
                symbol: 2,
                alphabet_size: 2
            })
        );
        // log_pdf stays total: out-of-range symbols carry zero mass.
        assert!(e.log_pdf(&7).is_infinite());
    }

    #[test]
    fn discrete_sampling_follows_mass() {
        let e = DiscreteEmission::from_probabilities(&[0.0, 1.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            assert_eq!(e.sample(&mut rng), Some(1));
        }
    }

    #[test]
    fn gaussian_log_pdf_at_mean() {
        let e = GaussianEmission::new(2.0, 1.0).unwrap();
        // N(x=mean) density is 1/sqrt(2*pi).
        assert!(approx_eq(e.log_pdf(&2.0), -0.5 * LN_2PI, 1e-12));
        assert_eq!(e.mode(), Some(2.0));
    }

    #[test]
    fn gaussian_rejects_bad_variance() {
        assert!(GaussianEmission::new(0.0, 0.0).is_err());
        assert!(GaussianEmission::new(0.0, -1.0).is_err());
        assert!(GaussianEmission::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn diagonal_gaussian_shape_check() {
        let e = DiagonalGaussianEmission::new(vec![0.0, 1.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(e.dimension(), 2);
        assert!(e.check(&vec![0.0, 0.0]).is_ok());
        assert_eq!(
            e.check(&vec![0.0]),
            Err(HmmError::ShapeMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn diagonal_gaussian_factorizes() {
        let e = DiagonalGaussianEmission::new(vec![0.0, 3.0], vec![1.0, 4.0]).unwrap();
        let a = GaussianEmission::new(0.0, 1.0).unwrap();
        let b = GaussianEmission::new(3.0, 4.0).unwrap();
        let x = vec![0.5, 2.0];
        assert!(approx_eq(
            e.log_pdf(&x),
            a.log_pdf(&0.5) + b.log_pdf(&2.0),
            1e-12
        ));
    }

    #[test]
    fn seeded_sampling_is_deterministic() {
        let e = GaussianEmission::new(1.0, 2.0).unwrap();
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        assert_eq!(e.sample(&mut rng1), e.sample(&mut rng2));
    }
}
