//! This package builds the layers of deep Gaussian-process models, with a focus on
//! convolutional GP layers. A convolutional layer compares images through their
//! patches (local receptive fields): a base kernel is evaluated between patches and
//! the inducing variables of the sparse approximation are patches themselves.
//!
//! Building a layer checks that the image, patch and output geometry agree and that
//! the kernel, mean function and inducing variables are compatible, so that layers
//! compose correctly in a deep GP stack. Training and inference are not part of this
//! crate.
//!
//! Convolutional GPs are described here:
//! - <https://arxiv.org/abs/1709.01894>
//!
//! Example:
//! ```
//! use deep_gp_layers::layers::{ConvLayer, ConvLayerOptions};
//! use deep_gp_layers::init::NormalInitializer;
//! use deep_gp_layers::kernels::KernelFamily;
//!
//! // 5x5 images, 3x3 patches, 4 inducing patches
//! let options = ConvLayerOptions {
//!     base_kernel: KernelFamily::Matern32,
//!     inducing_patches_initializer: Box::new(NormalInitializer::seeded(0)),
//!     ..ConvLayerOptions::default()
//! };
//! let layer = ConvLayer::<f64>::new((5, 5), (3, 3), 4, (3, 3), options).unwrap();
//! assert_eq!(layer.inducing_patches().patches().shape(), &[4, 3, 3]);
//!
//! // The output shape has to be input - patch_size + 1
//! let inconsistent = ConvLayer::<f64>::new((5, 5), (4, 4), 4, (3, 3), ConvLayerOptions::default());
//! assert!(inconsistent.is_err());
//!
//! println!("{}", layer);
//! ```

use std::fmt;

pub mod errors;
pub mod geometry;
pub mod inducing;
pub mod init;
pub mod kernels;
pub mod layers;
pub mod mean_functions;
pub mod runtime_checks;

pub use errors::GpLayerError;
pub use runtime_checks::verify_compatibility;

/// Width and height of a 2D plane. Channels are handled separately.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub struct Shape2 {
    pub width: usize,
    pub height: usize,
}

impl Shape2 {
    pub fn new(width: usize, height: usize) -> Shape2 {
        Shape2 { width, height }
    }

    /// Number of elements in the plane.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl From<(usize, usize)> for Shape2 {
    fn from((width, height): (usize, usize)) -> Self {
        Shape2::new(width, height)
    }
}

impl From<[usize; 2]> for Shape2 {
    fn from([width, height]: [usize; 2]) -> Self {
        Shape2::new(width, height)
    }
}

impl fmt::Display for Shape2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.width, self.height)
    }
}

/// Shape of the input images, W x H.
pub type ImageShape = Shape2;
/// Shape of the patches (a.k.a. kernel size or filter size).
pub type PatchSize = Shape2;
/// Shape of the feature map produced by a valid convolution.
pub type OutputShape = Shape2;
