//! Generic sparse variational GP layer.

use std::fmt;

use ndarray::*;
use num_traits::Float;

use crate::errors::GpLayerError;
use crate::inducing::InducingVariables;
use crate::kernels::Kernel;
use crate::mean_functions::{MeanFunction, Zero};
use crate::runtime_checks::verify_compatibility;

/// A layer of a deep GP: a multi-output kernel, its inducing variables, the
/// variational parameters over them and a mean function.
///
/// Variational parameters are laid out as
/// - q_mu: (M, L)
/// - q_sqrt: (L, M, M), one lower triangular factor per latent GP
pub struct GpLayer<F: Float, K, Z> {
    kernel: K,
    inducing_variable: Z,
    num_inducing: usize,
    num_latent_gps: usize,
    q_mu: Array2<F>,
    q_sqrt: Array3<F>,
    mean_function: Box<dyn MeanFunction<F>>,
}

/// A layer whose components are only known through their capabilities.
pub type DynGpLayer<F> = GpLayer<F, Box<dyn Kernel<F>>, Box<dyn InducingVariables<F>>>;

fn check_shape<F: Float, D: Dimension>(
    parameter: &'static str,
    value: &Array<F, D>,
    expected: &[usize],
) -> Result<(), GpLayerError> {
    if value.shape() != expected {
        return Err(GpLayerError::VariationalShape {
            parameter,
            expected: expected.to_vec(),
            actual: value.shape().to_vec(),
        });
    }
    Ok(())
}

impl<F, K, Z> GpLayer<F, K, Z>
where
    F: 'static + Float,
    K: Kernel<F>,
    Z: InducingVariables<F>,
{
    /// Builds a layer with `num_latents` latent GPs.
    ///
    /// `q_mu` defaults to zeros and `q_sqrt` to identity matrices, the mean
    /// function to [`Zero`]. The components are verified with
    /// [`verify_compatibility`] before anything else is checked.
    pub fn new(
        kernel: K,
        inducing_variable: Z,
        num_latents: usize,
        q_mu: Option<Array2<F>>,
        q_sqrt: Option<Array3<F>>,
        mean_function: Option<Box<dyn MeanFunction<F>>>,
    ) -> Result<GpLayer<F, K, Z>, GpLayerError> {
        let mean_function: Box<dyn MeanFunction<F>> = match mean_function {
            Some(mean_function) => mean_function,
            None => Box::new(Zero::new(num_latents)),
        };
        let (num_inducing, num_latent_gps) =
            verify_compatibility(&kernel, mean_function.as_ref(), &inducing_variable)?;

        if num_latents != num_latent_gps {
            return Err(GpLayerError::LatentCountMismatch {
                requested: num_latents,
                num_latent_gps,
            });
        }

        let q_mu = match q_mu {
            Some(q_mu) => {
                check_shape("q_mu", &q_mu, &[num_inducing, num_latent_gps])?;
                q_mu
            }
            None => Array::zeros((num_inducing, num_latent_gps)),
        };
        let q_sqrt = match q_sqrt {
            Some(q_sqrt) => {
                check_shape(
                    "q_sqrt",
                    &q_sqrt,
                    &[num_latent_gps, num_inducing, num_inducing],
                )?;
                q_sqrt
            }
            None => Array::from_shape_fn(
                (num_latent_gps, num_inducing, num_inducing),
                |(_, i, j)| if i == j { F::one() } else { F::zero() },
            ),
        };

        log::debug!(
            "Built GP layer with kernel {}, {} inducing variables, {} latent GPs",
            kernel.name(),
            num_inducing,
            num_latent_gps
        );
        Ok(GpLayer {
            kernel,
            inducing_variable,
            num_inducing,
            num_latent_gps,
            q_mu,
            q_sqrt,
            mean_function,
        })
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn inducing_variable(&self) -> &Z {
        &self.inducing_variable
    }

    pub fn num_inducing(&self) -> usize {
        self.num_inducing
    }

    pub fn num_latent_gps(&self) -> usize {
        self.num_latent_gps
    }

    pub fn q_mu(&self) -> ArrayView2<F> {
        self.q_mu.view()
    }

    pub fn q_sqrt(&self) -> ArrayView3<F> {
        self.q_sqrt.view()
    }

    pub fn mean_function(&self) -> &dyn MeanFunction<F> {
        self.mean_function.as_ref()
    }
}

impl<F, K, Z> fmt::Display for GpLayer<F, K, Z>
where
    F: 'static + Float,
    K: Kernel<F>,
    Z: InducingVariables<F>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GPLayer\n\t+ kernel: {}\n\t+ inducing variables: {}\n\t+ latent GPs: {}\n\t+ mean function: {}",
            self.kernel.name(),
            self.num_inducing,
            self.num_latent_gps,
            self.mean_function.name()
        )
    }
}
