//! Error type shared by every construction-time operation of the crate.

use std::fmt;

use thiserror::Error;

use crate::Shape2;

/// Capability an argument of a layer constructor is required to have.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Capability {
    MultioutputInducingVariables,
    MultioutputKernel,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::MultioutputInducingVariables => write!(f, "MultioutputInducingVariables"),
            Capability::MultioutputKernel => write!(f, "MultioutputKernel"),
        }
    }
}

/// Errors raised while building a GP layer. None of them is retried or
/// swallowed internally; the caller is expected to fix its arguments.
#[derive(Error, Debug)]
pub enum GpLayerError {
    #[error(
        "The input, output and patch size are inconsistent in the ConvLayer \
         (input_shape: {input_shape}, output_shape: {output_shape}, patch_size: {patch_size}). \
         The correct dimension should be: output = input - patch_size + 1."
    )]
    ShapeMismatch {
        input_shape: Shape2,
        output_shape: Shape2,
        patch_size: Shape2,
    },

    #[error("`{argument}` must be a `{capability}`")]
    MissingCapability {
        argument: &'static str,
        capability: Capability,
    },

    #[error(
        "The number of latent GPs ({num_latent_gps}) does not match \
         the number of separate independent inducing_variables ({latent_inducing_points})"
    )]
    ShapeIncompatibility {
        num_latent_gps: usize,
        latent_inducing_points: usize,
    },

    #[error("layer was asked for {requested} latent GPs but the kernel declares {num_latent_gps}")]
    LatentCountMismatch {
        requested: usize,
        num_latent_gps: usize,
    },

    #[error("patch size {patch_size} does not fit into image shape {image_shape}")]
    PatchExceedsImage {
        image_shape: Shape2,
        patch_size: Shape2,
    },

    #[error("only a single colour channel is supported, got {0}")]
    UnsupportedColourChannels(usize),

    #[error("base kernel has input dimension {actual}, expected patch dimension {expected}")]
    KernelInputDimension { expected: usize, actual: usize },

    #[error("initializer returned an array of shape {actual:?}, expected {expected:?}")]
    InitializerShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("`{parameter}` has shape {actual:?}, expected {expected:?}")]
    VariationalShape {
        parameter: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("invalid initializer distribution: {0}")]
    InvalidDistribution(String),

    #[error("value {0} cannot be represented in the layer's float type")]
    NumericCast(f64),

    #[error("failed to load inducing patches: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),
}
