//! Multi-output kernels made of independent latent GPs.
//!
//! The covariance of a multi-output kernel stacks its latent GPs: for L latent
//! GPs and inputs of N and N2 rows `k` returns an (L*N, L*N2) block diagonal
//! matrix, latent-major, since distinct latent GPs are uncorrelated.

use ndarray::*;
use num_traits::Float;

use super::Kernel;

/// Capability of kernels that describe several latent GPs.
pub trait MultioutputKernel<F: Float>: Kernel<F> {
    /// Number of latent GPs the kernel describes.
    fn num_latent_gps(&self) -> usize;

    /// Covariance function of each latent GP, in order.
    fn latent_kernels(&self) -> Vec<&dyn Kernel<F>>;
}

fn block_diagonal<F: Float>(blocks: &[Array2<F>]) -> Array2<F> {
    let rows = blocks.iter().map(|b| b.nrows()).sum();
    let cols = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = Array::zeros((rows, cols));
    let (mut r, mut c) = (0, 0);
    for block in blocks {
        out.slice_mut(s![r..r + block.nrows(), c..c + block.ncols()])
            .assign(block);
        r += block.nrows();
        c += block.ncols();
    }
    out
}

fn stacked_k<F: Float>(
    latents: &[&dyn Kernel<F>],
    x: ArrayView2<F>,
    x2: ArrayView2<F>,
) -> Array2<F> {
    let blocks: Vec<Array2<F>> = latents.iter().map(|k| k.k(x, x2)).collect();
    block_diagonal(&blocks)
}

fn stacked_k_diag<F: Float>(latents: &[&dyn Kernel<F>], x: ArrayView2<F>) -> Array1<F> {
    latents
        .iter()
        .flat_map(|k| k.k_diag(x).to_vec())
        .collect::<Vec<F>>()
        .into()
}

/// The same kernel shared by `output_dim` independent latent GPs.
pub struct SharedIndependent<F: Float> {
    kernel: Box<dyn Kernel<F>>,
    output_dim: usize,
}

impl<F: Float> SharedIndependent<F> {
    pub fn new(kernel: Box<dyn Kernel<F>>, output_dim: usize) -> SharedIndependent<F> {
        SharedIndependent { kernel, output_dim }
    }
}

impl<F: Float> Kernel<F> for SharedIndependent<F> {
    fn name(&self) -> &'static str {
        "SharedIndependent"
    }

    fn input_dim(&self) -> usize {
        self.kernel.input_dim()
    }

    fn k(&self, x: ArrayView2<F>, x2: ArrayView2<F>) -> Array2<F> {
        stacked_k(&self.latent_kernels(), x, x2)
    }

    fn k_diag(&self, x: ArrayView2<F>) -> Array1<F> {
        stacked_k_diag(&self.latent_kernels(), x)
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputKernel<F>> {
        Some(self)
    }
}

impl<F: Float> MultioutputKernel<F> for SharedIndependent<F> {
    fn num_latent_gps(&self) -> usize {
        self.output_dim
    }

    fn latent_kernels(&self) -> Vec<&dyn Kernel<F>> {
        vec![self.kernel.as_ref(); self.output_dim]
    }
}

/// One kernel per independent latent GP.
pub struct SeparateIndependent<F: Float> {
    kernels: Vec<Box<dyn Kernel<F>>>,
}

impl<F: Float> SeparateIndependent<F> {
    pub fn new(kernels: Vec<Box<dyn Kernel<F>>>) -> SeparateIndependent<F> {
        SeparateIndependent { kernels }
    }
}

impl<F: Float> Kernel<F> for SeparateIndependent<F> {
    fn name(&self) -> &'static str {
        "SeparateIndependent"
    }

    fn input_dim(&self) -> usize {
        self.kernels.first().map_or(0, |k| k.input_dim())
    }

    fn k(&self, x: ArrayView2<F>, x2: ArrayView2<F>) -> Array2<F> {
        stacked_k(&self.latent_kernels(), x, x2)
    }

    fn k_diag(&self, x: ArrayView2<F>) -> Array1<F> {
        stacked_k_diag(&self.latent_kernels(), x)
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputKernel<F>> {
        Some(self)
    }
}

impl<F: Float> MultioutputKernel<F> for SeparateIndependent<F> {
    fn num_latent_gps(&self) -> usize {
        self.kernels.len()
    }

    fn latent_kernels(&self) -> Vec<&dyn Kernel<F>> {
        self.kernels.iter().map(|k| k.as_ref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{KernelFamily, StationaryKernel};

    #[test]
    fn shared_independent_repeats_its_kernel() {
        let kernel = SharedIndependent::new(KernelFamily::SquaredExponential.instantiate(2), 3);
        let mo = kernel.as_multioutput().unwrap();
        assert_eq!(mo.num_latent_gps(), 3);
        assert_eq!(mo.latent_kernels().len(), 3);

        let x = array![[0.0_f64, 0.0], [1.0, 1.0]];
        let k = kernel.k(x.view(), x.view());
        assert_eq!(k.shape(), &[6, 6]);
        assert_eq!(k.slice(s![0..2, 0..2]), k.slice(s![4..6, 4..6]));
        assert!(k.slice(s![0..2, 2..6]).iter().all(|v| *v == 0.0));
        assert_eq!(kernel.k_diag(x.view()).len(), 6);
    }

    #[test]
    fn separate_independent_keeps_latent_order() {
        let kernels: Vec<Box<dyn Kernel<f64>>> = vec![
            Box::new(StationaryKernel::with_hyperparameters(
                KernelFamily::Matern12,
                1.0,
                array![1.0],
            )),
            Box::new(StationaryKernel::with_hyperparameters(
                KernelFamily::Matern12,
                3.0,
                array![1.0],
            )),
        ];
        let kernel = SeparateIndependent::new(kernels);
        assert_eq!(kernel.as_multioutput().unwrap().num_latent_gps(), 2);
        assert_eq!(kernel.input_dim(), 1);

        let x = array![[0.5_f64]];
        assert_eq!(kernel.k_diag(x.view()), array![1.0, 3.0]);
        let k = kernel.k(x.view(), x.view());
        assert_eq!(k, array![[1.0, 0.0], [0.0, 3.0]]);
    }

    #[test]
    fn empty_separate_independent_has_no_latents() {
        let kernel = SeparateIndependent::<f64>::new(Vec::new());
        assert_eq!(kernel.num_latent_gps(), 0);
        assert_eq!(kernel.input_dim(), 0);
    }
}
