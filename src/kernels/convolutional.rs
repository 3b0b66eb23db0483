//! Convolutional kernel: a base kernel evaluated on image patches.
//!
//! More can be read here:
//! - <https://arxiv.org/abs/1709.01894>
//!
//! The covariance between two images is the average base covariance over all
//! pairs of their patches. The inducing variables of the kernel live in patch
//! space, so `kuu` and `kuf` compare inducing patches with patches directly.

use ndarray::*;
use num_traits::Float;

use super::{Kernel, MultioutputKernel};
use crate::errors::GpLayerError;
use crate::geometry::{extract_patches, valid_output_shape};
use crate::inducing::InducingPatches;
use crate::Shape2;

/// Base kernel averaged over all patch pairs of two images.
pub struct ConvKernel<F: Float> {
    base_kernel: Box<dyn Kernel<F>>,
    image_shape: Shape2,
    patch_size: Shape2,
    colour_channels: usize,
    num_patches: usize,
}

impl<F: 'static + Float> ConvKernel<F> {
    /// Wraps `base_kernel` for images of `image_shape` with `colour_channels`
    /// channels. The base kernel has to work on flattened patches, i.e. its
    /// input dimension must be `patch width * patch height * colour_channels`.
    ///
    /// Inducing patches carry no channel axis, so only a single colour
    /// channel is accepted.
    pub fn new(
        base_kernel: Box<dyn Kernel<F>>,
        image_shape: Shape2,
        patch_size: Shape2,
        colour_channels: usize,
    ) -> Result<ConvKernel<F>, GpLayerError> {
        // TODO: a channel axis on InducingPatches to lift this
        if colour_channels != 1 {
            return Err(GpLayerError::UnsupportedColourChannels(colour_channels));
        }
        let expected = patch_size.area() * colour_channels;
        if base_kernel.input_dim() != expected {
            return Err(GpLayerError::KernelInputDimension {
                expected,
                actual: base_kernel.input_dim(),
            });
        }
        let output_shape = valid_output_shape(image_shape, patch_size).ok_or(
            GpLayerError::PatchExceedsImage {
                image_shape,
                patch_size,
            },
        )?;
        Ok(ConvKernel {
            base_kernel,
            image_shape,
            patch_size,
            colour_channels,
            num_patches: output_shape.area(),
        })
    }

    pub fn base_kernel(&self) -> &dyn Kernel<F> {
        self.base_kernel.as_ref()
    }

    pub fn image_shape(&self) -> Shape2 {
        self.image_shape
    }

    pub fn patch_size(&self) -> Shape2 {
        self.patch_size
    }

    pub fn colour_channels(&self) -> usize {
        self.colour_channels
    }

    pub fn num_patches(&self) -> usize {
        self.num_patches
    }

    /// Patches of every image, flattened to (N * P, patch_len).
    fn flat_patches(&self, x: ArrayView2<F>) -> Array2<F> {
        let patches = extract_patches(x, self.image_shape, self.patch_size, self.colour_channels);
        let (n, p, d) = patches.dim();
        patches
            .into_shape((n * p, d))
            .expect("freshly allocated patches are contiguous")
    }

    /// Sums consecutive groups of `rows` rows and `cols` columns of `k`.
    fn block_sums(k: &Array2<F>, rows: usize, cols: usize) -> Array2<F> {
        let n = k.nrows() / rows;
        let n2 = k.ncols() / cols;
        Array::from_shape_fn((n, n2), |(i, j)| {
            k.slice(s![i * rows..(i + 1) * rows, j * cols..(j + 1) * cols])
                .sum()
        })
    }

    fn patch_count(&self) -> F {
        F::from(self.num_patches).unwrap_or_else(F::infinity)
    }

    /// Covariance between inducing patches, (M, M).
    pub fn kuu(&self, inducing_patches: &InducingPatches<F>) -> Array2<F> {
        let z = inducing_patches.flattened();
        self.base_kernel.k(z.view(), z.view())
    }

    /// Covariance between inducing patches and images, (M, N).
    pub fn kuf(&self, inducing_patches: &InducingPatches<F>, x: ArrayView2<F>) -> Array2<F> {
        let z = inducing_patches.flattened();
        let patches = self.flat_patches(x);
        let k = self.base_kernel.k(z.view(), patches.view());
        let p = self.patch_count();
        Self::block_sums(&k, 1, self.num_patches).mapv(|v| v / p)
    }
}

impl<F: 'static + Float> Kernel<F> for ConvKernel<F> {
    fn name(&self) -> &'static str {
        "ConvKernel"
    }

    fn input_dim(&self) -> usize {
        self.image_shape.area() * self.colour_channels
    }

    fn k(&self, x: ArrayView2<F>, x2: ArrayView2<F>) -> Array2<F> {
        let patches = self.flat_patches(x);
        let patches2 = self.flat_patches(x2);
        let k = self.base_kernel.k(patches.view(), patches2.view());
        let p = self.patch_count();
        Self::block_sums(&k, self.num_patches, self.num_patches).mapv(|v| v / (p * p))
    }

    fn k_diag(&self, x: ArrayView2<F>) -> Array1<F> {
        let p = self.patch_count();
        x.outer_iter()
            .map(|image| {
                let patches = self.flat_patches(image.insert_axis(Axis(0)));
                self.base_kernel.k(patches.view(), patches.view()).sum() / (p * p)
            })
            .collect::<Vec<F>>()
            .into()
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputKernel<F>> {
        Some(self)
    }
}

/// A single filter, hence a single latent GP.
impl<F: 'static + Float> MultioutputKernel<F> for ConvKernel<F> {
    fn num_latent_gps(&self) -> usize {
        1
    }

    fn latent_kernels(&self) -> Vec<&dyn Kernel<F>> {
        vec![self as &dyn Kernel<F>]
    }
}
