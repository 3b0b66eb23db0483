//! Covariance functions.
//!
//! Every kernel implements [`Kernel`]. Kernels that describe several latent
//! GPs additionally expose the [`MultioutputKernel`] capability, which layer
//! constructors query through [`Kernel::as_multioutput`].

use std::fmt;

use ndarray::*;
use num_traits::Float;

pub mod convolutional;
pub mod multioutput;

pub use convolutional::ConvKernel;
pub use multioutput::{MultioutputKernel, SeparateIndependent, SharedIndependent};

/// A covariance function between rows of two input matrices.
pub trait Kernel<F: Float> {
    /// Name of the kernel family, used when describing layers.
    fn name(&self) -> &'static str;

    /// Number of columns the inputs must have.
    fn input_dim(&self) -> usize;

    /// Covariance matrix between the rows of `x` (N, D) and `x2` (N2, D).
    fn k(&self, x: ArrayView2<F>, x2: ArrayView2<F>) -> Array2<F>;

    /// Diagonal of `k(x, x)`.
    fn k_diag(&self, x: ArrayView2<F>) -> Array1<F>;

    /// Returns the multi-output view of this kernel if it has one.
    fn as_multioutput(&self) -> Option<&dyn MultioutputKernel<F>> {
        None
    }
}

impl<F: Float, K: Kernel<F> + ?Sized> Kernel<F> for Box<K> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn input_dim(&self) -> usize {
        (**self).input_dim()
    }

    fn k(&self, x: ArrayView2<F>, x2: ArrayView2<F>) -> Array2<F> {
        (**self).k(x, x2)
    }

    fn k_diag(&self, x: ArrayView2<F>) -> Array1<F> {
        (**self).k_diag(x)
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputKernel<F>> {
        (**self).as_multioutput()
    }
}

/// Family of stationary base kernels a layer can be configured with.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum KernelFamily {
    /// Exponentiated quadratic, a.k.a. RBF.
    SquaredExponential,
    Matern12,
    Matern32,
    Matern52,
}

impl Default for KernelFamily {
    fn default() -> Self {
        KernelFamily::SquaredExponential
    }
}

impl KernelFamily {
    pub fn name(&self) -> &'static str {
        match self {
            KernelFamily::SquaredExponential => "SquaredExponential",
            KernelFamily::Matern12 => "Matern12",
            KernelFamily::Matern32 => "Matern32",
            KernelFamily::Matern52 => "Matern52",
        }
    }

    /// Builds a kernel of this family over `input_dim` dimensions with the
    /// default hyperparameters (unit variance, unit lengthscales).
    pub fn instantiate<F: 'static + Float>(&self, input_dim: usize) -> Box<dyn Kernel<F>> {
        Box::new(StationaryKernel::new(*self, input_dim))
    }
}

impl fmt::Display for KernelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stationary kernel with a variance and one lengthscale per input dimension
/// (automatic relevance determination).
#[derive(Debug, Clone)]
pub struct StationaryKernel<F: Float> {
    family: KernelFamily,
    variance: F,
    lengthscales: Array1<F>,
}

impl<F: Float> StationaryKernel<F> {
    pub fn new(family: KernelFamily, input_dim: usize) -> StationaryKernel<F> {
        StationaryKernel {
            family,
            variance: F::one(),
            lengthscales: Array::from_elem(input_dim, F::one()),
        }
    }

    pub fn with_hyperparameters(
        family: KernelFamily,
        variance: F,
        lengthscales: Array1<F>,
    ) -> StationaryKernel<F> {
        assert!(variance > F::zero(), "Kernel variance must be positive");
        assert!(
            lengthscales.iter().all(|l| *l > F::zero()),
            "Kernel lengthscales must be positive"
        );
        StationaryKernel {
            family,
            variance,
            lengthscales,
        }
    }

    pub fn family(&self) -> KernelFamily {
        self.family
    }

    pub fn variance(&self) -> F {
        self.variance
    }

    pub fn lengthscales(&self) -> ArrayView1<F> {
        self.lengthscales.view()
    }

    fn scaled_squared_distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        Zip::from(&a)
            .and(&b)
            .and(&self.lengthscales)
            .fold(F::zero(), |acc, &xa, &xb, &l| {
                let d = (xa - xb) / l;
                acc + d * d
            })
    }

    /// Kernel value as a function of the scaled squared distance.
    fn profile(&self, r2: F) -> F {
        let one = F::one();
        let three = one + one + one;
        let five = three + one + one;
        let value = match self.family {
            KernelFamily::SquaredExponential => (-r2 / (one + one)).exp(),
            KernelFamily::Matern12 => (-r2.sqrt()).exp(),
            KernelFamily::Matern32 => {
                let s = three.sqrt() * r2.sqrt();
                (one + s) * (-s).exp()
            }
            KernelFamily::Matern52 => {
                let s = five.sqrt() * r2.sqrt();
                (one + s + s * s / three) * (-s).exp()
            }
        };
        self.variance * value
    }
}

impl<F: Float> Kernel<F> for StationaryKernel<F> {
    fn name(&self) -> &'static str {
        self.family.name()
    }

    fn input_dim(&self) -> usize {
        self.lengthscales.len()
    }

    fn k(&self, x: ArrayView2<F>, x2: ArrayView2<F>) -> Array2<F> {
        assert!(
            x.ncols() == self.input_dim() && x2.ncols() == self.input_dim(),
            "Inputs with {} and {} columns passed to a kernel over {} dimensions",
            x.ncols(),
            x2.ncols(),
            self.input_dim()
        );
        Array::from_shape_fn((x.nrows(), x2.nrows()), |(i, j)| {
            self.profile(self.scaled_squared_distance(x.row(i), x2.row(j)))
        })
    }

    fn k_diag(&self, x: ArrayView2<F>) -> Array1<F> {
        Array::from_elem(x.nrows(), self.variance)
    }
}
