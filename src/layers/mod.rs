//! GP layers of a deep GP.

pub mod convolution_layer;
pub mod gp_layer;

pub use convolution_layer::{ConvLayer, ConvLayerOptions};
pub use gp_layer::{DynGpLayer, GpLayer};
