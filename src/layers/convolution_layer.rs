//! Convolutional GP layer.
//!
//! The layer compares images through their patches: a base kernel over
//! flattened patches is wrapped into a [`ConvKernel`], and the inducing
//! variables are patches themselves.
//!
//! Only a single filter, a single colour channel and stride 1 are supported.

use std::fmt;

use ndarray::*;
use num_traits::Float;

use super::GpLayer;
use crate::errors::GpLayerError;
use crate::geometry::{check_input_output_shape, valid_output_shape};
use crate::inducing::InducingPatches;
use crate::init::{Initializer, NormalInitializer};
use crate::kernels::{ConvKernel, KernelFamily};
use crate::mean_functions::MeanFunction;
use crate::Shape2;

/// Optional settings of a [`ConvLayer`].
pub struct ConvLayerOptions<F: Float> {
    /// Strides of the convolution along width and height. Must be 1.
    pub stride: usize,
    /// Number of filters in the convolution. Must be 1.
    pub num_filters: usize,
    /// Variational mean, (M, 1).
    pub q_mu: Option<Array2<F>>,
    /// Variational covariance factor, (1, M, M).
    pub q_sqrt: Option<Array3<F>>,
    pub mean_function: Option<Box<dyn MeanFunction<F>>>,
    /// Family of the kernel evaluated on patches.
    pub base_kernel: KernelFamily,
    pub inducing_patches_initializer: Box<dyn Initializer<F>>,
}

impl<F: 'static + Float> Default for ConvLayerOptions<F> {
    fn default() -> Self {
        ConvLayerOptions {
            stride: 1,
            num_filters: 1,
            q_mu: None,
            q_sqrt: None,
            mean_function: None,
            base_kernel: KernelFamily::default(),
            inducing_patches_initializer: Box::new(NormalInitializer::default()),
        }
    }
}

/// A GP layer with a convolutional kernel and inducing patches.
pub struct ConvLayer<F: 'static + Float> {
    layer: GpLayer<F, ConvKernel<F>, InducingPatches<F>>,
    output_shape: Shape2,
    patch_size: Shape2,
    base_kernel: KernelFamily,
}

impl<F: 'static + Float> ConvLayer<F> {
    /// Constructs a convolutional GP layer.
    ///
    /// - input_shape: shape of the input images, W x H
    /// - output_shape: shape of the output feature map, has to equal
    ///   `input_shape - patch_size + 1`
    /// - number_inducing: number of inducing patches, M
    /// - patch_size: shape of the patches (a.k.a. kernel size or filter size)
    ///
    /// Panics if `options` asks for more than one filter or a stride other
    /// than 1.
    pub fn new<I, O, P>(
        input_shape: I,
        output_shape: O,
        number_inducing: usize,
        patch_size: P,
        options: ConvLayerOptions<F>,
    ) -> Result<ConvLayer<F>, GpLayerError>
    where
        I: Into<Shape2>,
        O: Into<Shape2>,
        P: Into<Shape2>,
    {
        let input_shape = input_shape.into();
        let output_shape = output_shape.into();
        let patch_size = patch_size.into();
        // TODO: support several filters and strides other than 1
        assert!(
            options.num_filters == 1 && options.stride == 1,
            "ConvLayer only supports num_filters == 1 and stride == 1, got num_filters = {} and stride = {}",
            options.num_filters,
            options.stride
        );

        if !check_input_output_shape(input_shape, output_shape, patch_size) {
            log::warn!(
                "Inconsistent ConvLayer geometry: input_shape {}, output_shape {}, patch_size {}",
                input_shape,
                output_shape,
                patch_size
            );
            return Err(GpLayerError::ShapeMismatch {
                input_shape,
                output_shape,
                patch_size,
            });
        }

        // M x w x h
        let inducing_patch_shape = [number_inducing, patch_size.width, patch_size.height];
        let init_patches = options
            .inducing_patches_initializer
            .initialize(&inducing_patch_shape)?;
        if init_patches.shape() != &inducing_patch_shape[..] {
            return Err(GpLayerError::InitializerShape {
                expected: inducing_patch_shape.to_vec(),
                actual: init_patches.shape().to_vec(),
            });
        }
        let inducing_patches = InducingPatches::new(init_patches.into_dimensionality::<Ix3>()?);

        // TODO: colour channels other than 1
        let base_kernel = options.base_kernel.instantiate(patch_size.area());
        let conv_kernel = ConvKernel::new(base_kernel, input_shape, patch_size, 1)?;
        log::debug!(
            "ConvLayer: {} inducing patches of size {}, {} base kernel over {} dimensions",
            number_inducing,
            patch_size,
            options.base_kernel,
            patch_size.area()
        );

        let layer = GpLayer::new(
            conv_kernel,
            inducing_patches,
            1,
            options.q_mu,
            options.q_sqrt,
            options.mean_function,
        )?;
        Ok(ConvLayer {
            layer,
            output_shape,
            patch_size,
            base_kernel: options.base_kernel,
        })
    }

    /// Like [`ConvLayer::new`], with the output shape derived from the input
    /// shape and the patch size.
    pub fn with_valid_output<I, P>(
        input_shape: I,
        number_inducing: usize,
        patch_size: P,
        options: ConvLayerOptions<F>,
    ) -> Result<ConvLayer<F>, GpLayerError>
    where
        I: Into<Shape2>,
        P: Into<Shape2>,
    {
        let input_shape = input_shape.into();
        let patch_size = patch_size.into();
        let output_shape =
            valid_output_shape(input_shape, patch_size).ok_or(GpLayerError::PatchExceedsImage {
                image_shape: input_shape,
                patch_size,
            })?;
        ConvLayer::new(input_shape, output_shape, number_inducing, patch_size, options)
    }

    pub fn layer(&self) -> &GpLayer<F, ConvKernel<F>, InducingPatches<F>> {
        &self.layer
    }

    pub fn into_layer(self) -> GpLayer<F, ConvKernel<F>, InducingPatches<F>> {
        self.layer
    }

    pub fn kernel(&self) -> &ConvKernel<F> {
        self.layer.kernel()
    }

    pub fn inducing_patches(&self) -> &InducingPatches<F> {
        self.layer.inducing_variable()
    }

    pub fn input_shape(&self) -> Shape2 {
        self.kernel().image_shape()
    }

    pub fn output_shape(&self) -> Shape2 {
        self.output_shape
    }

    pub fn patch_size(&self) -> Shape2 {
        self.patch_size
    }

    pub fn base_kernel_family(&self) -> KernelFamily {
        self.base_kernel
    }
}

impl<F: 'static + Float> fmt::Display for ConvLayer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.layer)?;
        write!(
            f,
            "\n\t+ Conv: patch {} base_kern {}",
            self.patch_size, self.base_kernel
        )
    }
}
