//! Strategies producing the initial values of inducing patches.
//!
//! An [`Initializer`] is asked for an array of a given shape and must return
//! exactly that shape; layer builders reject anything else.

use std::path::PathBuf;

use ndarray::*;
use ndarray_npy::{read_npy, ReadableElement};
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use num_traits::Float;

use crate::errors::GpLayerError;

pub trait Initializer<F: Float> {
    fn initialize(&self, shape: &[usize]) -> Result<ArrayD<F>, GpLayerError>;
}

impl<F: Float, I: Initializer<F> + ?Sized> Initializer<F> for Box<I> {
    fn initialize(&self, shape: &[usize]) -> Result<ArrayD<F>, GpLayerError> {
        (**self).initialize(shape)
    }
}

/// I.i.d. draws from a normal distribution. Without a seed every call draws
/// fresh values from an entropy-seeded generator.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct NormalInitializer {
    pub mean: f64,
    pub std_dev: f64,
    pub seed: Option<u64>,
}

impl Default for NormalInitializer {
    fn default() -> Self {
        NormalInitializer {
            mean: 0.0,
            std_dev: 1.0,
            seed: None,
        }
    }
}

impl NormalInitializer {
    /// Standard normal draws from a generator seeded with `seed`.
    pub fn seeded(seed: u64) -> NormalInitializer {
        NormalInitializer {
            seed: Some(seed),
            ..NormalInitializer::default()
        }
    }
}

impl<F: Float> Initializer<F> for NormalInitializer {
    fn initialize(&self, shape: &[usize]) -> Result<ArrayD<F>, GpLayerError> {
        if !self.mean.is_finite() || !(self.std_dev >= 0.0 && self.std_dev.is_finite()) {
            return Err(GpLayerError::InvalidDistribution(format!(
                "normal distribution needs a finite mean and a finite, non-negative std_dev, got mean {} and std_dev {}",
                self.mean, self.std_dev
            )));
        }
        let normal = Normal::new(self.mean, self.std_dev)
            .map_err(|e| GpLayerError::InvalidDistribution(e.to_string()))?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let draws: ArrayD<f64> = Array::random_using(IxDyn(shape), normal, &mut rng);
        let values = draws
            .iter()
            .map(|&v| F::from(v).ok_or(GpLayerError::NumericCast(v)))
            .collect::<Result<Vec<F>, _>>()?;
        Ok(Array::from_shape_vec(IxDyn(shape), values)?)
    }
}

#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct ZerosInitializer;

impl<F: Float> Initializer<F> for ZerosInitializer {
    fn initialize(&self, shape: &[usize]) -> Result<ArrayD<F>, GpLayerError> {
        Ok(Array::zeros(IxDyn(shape)))
    }
}

/// Hands out a copy of a precomputed array, e.g. patches picked from data.
#[derive(Debug, Clone)]
pub struct ArrayInitializer<F: Float> {
    values: ArrayD<F>,
}

impl<F: Float> ArrayInitializer<F> {
    pub fn new<D: Dimension>(values: Array<F, D>) -> ArrayInitializer<F> {
        ArrayInitializer {
            values: values.into_dyn(),
        }
    }
}

impl<F: Float> Initializer<F> for ArrayInitializer<F> {
    fn initialize(&self, _shape: &[usize]) -> Result<ArrayD<F>, GpLayerError> {
        Ok(self.values.clone())
    }
}

/// Loads the array from a `.npy` file each time it is asked for values.
#[derive(PartialEq, Debug, Clone)]
pub struct NpyInitializer {
    path: PathBuf,
}

impl NpyInitializer {
    pub fn new<P: Into<PathBuf>>(path: P) -> NpyInitializer {
        NpyInitializer { path: path.into() }
    }
}

impl<F: Float + ReadableElement> Initializer<F> for NpyInitializer {
    fn initialize(&self, _shape: &[usize]) -> Result<ArrayD<F>, GpLayerError> {
        log::debug!("Loading inducing patches from {}", self.path.display());
        let values: ArrayD<F> = read_npy(&self.path)?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::write_npy;

    #[test]
    fn normal_initializer_produces_requested_shape() {
        let values: ArrayD<f64> = NormalInitializer::default().initialize(&[4, 3, 3]).unwrap();
        assert_eq!(values.shape(), &[4, 3, 3]);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn seeded_normal_initializer_is_reproducible() {
        let init = NormalInitializer::seeded(42);
        let a: ArrayD<f32> = init.initialize(&[10, 2, 2]).unwrap();
        let b: ArrayD<f32> = init.initialize(&[10, 2, 2]).unwrap();
        assert_eq!(a, b);
        let c: ArrayD<f32> = NormalInitializer::seeded(43).initialize(&[10, 2, 2]).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn normal_initializer_respects_mean() {
        let init = NormalInitializer {
            mean: 5.0,
            std_dev: 0.1,
            seed: Some(7),
        };
        let values: ArrayD<f64> = init.initialize(&[1000]).unwrap();
        let mean = values.sum() / 1000.0;
        assert!((mean - 5.0).abs() < 0.05);
    }

    #[test]
    fn negative_std_dev_is_rejected() {
        let init = NormalInitializer {
            mean: 0.0,
            std_dev: -1.0,
            seed: None,
        };
        let result: Result<ArrayD<f64>, _> = init.initialize(&[2]);
        assert!(matches!(result, Err(GpLayerError::InvalidDistribution(_))));
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        for (mean, std_dev) in &[(f64::NAN, 1.0), (0.0, f64::INFINITY), (0.0, f64::NAN)] {
            let init = NormalInitializer {
                mean: *mean,
                std_dev: *std_dev,
                seed: Some(0),
            };
            let result: Result<ArrayD<f32>, _> = init.initialize(&[3]);
            assert!(matches!(result, Err(GpLayerError::InvalidDistribution(_))));
        }
    }

    #[test]
    fn zero_std_dev_draws_the_mean() {
        let init = NormalInitializer {
            mean: 2.0,
            std_dev: 0.0,
            seed: Some(0),
        };
        let values: ArrayD<f64> = init.initialize(&[4]).unwrap();
        assert!(values.iter().all(|v| *v == 2.0));
    }

    #[test]
    fn zeros_and_array_initializers() {
        let zeros: ArrayD<f64> = ZerosInitializer.initialize(&[2, 3]).unwrap();
        assert_eq!(zeros, ArrayD::<f64>::zeros(IxDyn(&[2, 3])));

        let init = ArrayInitializer::new(array![[1.0_f64, 2.0], [3.0, 4.0]]);
        let values = init.initialize(&[2, 2]).unwrap();
        assert_eq!(values.shape(), &[2, 2]);
        assert_eq!(values[[1, 0]], 3.0);
    }

    #[test]
    fn npy_initializer_loads_saved_patches() {
        let path = std::env::temp_dir().join(format!(
            "deep_gp_layers_inducing_{}.npy",
            std::process::id()
        ));
        let saved = Array::from_shape_fn((3, 2, 2), |(m, i, j)| (m * 4 + i * 2 + j) as f64);
        write_npy(&path, &saved).unwrap();

        let loaded: ArrayD<f64> = NpyInitializer::new(&path).initialize(&[3, 2, 2]).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, saved.into_dyn());
    }

    #[test]
    fn missing_npy_file_is_an_error() {
        let init = NpyInitializer::new("/nonexistent/inducing_patches.npy");
        let result: Result<ArrayD<f64>, _> = init.initialize(&[1]);
        assert!(matches!(result, Err(GpLayerError::Npy(_))));
    }
}
