//! Compatibility checks run by layer constructors before a layer is built.

use num_traits::Float;

use crate::errors::{Capability, GpLayerError};
use crate::inducing::InducingVariables;
use crate::kernels::Kernel;
use crate::mean_functions::MeanFunction;

/// Checks that a kernel, a mean function and inducing variables can form a
/// multi-output GP layer, and returns `(num_inducing_points, num_latent_gps)`.
///
/// The mean function is only constrained by its type. The number of inducing
/// points is assumed to be the same for every latent GP.
pub fn verify_compatibility<F: Float>(
    kernel: &dyn Kernel<F>,
    _mean_function: &dyn MeanFunction<F>,
    inducing_variable: &dyn InducingVariables<F>,
) -> Result<(usize, usize), GpLayerError> {
    let inducing_variable =
        inducing_variable
            .as_multioutput()
            .ok_or(GpLayerError::MissingCapability {
                argument: "inducing_variable",
                capability: Capability::MultioutputInducingVariables,
            })?;
    let kernel = kernel
        .as_multioutput()
        .ok_or(GpLayerError::MissingCapability {
            argument: "kernel",
            capability: Capability::MultioutputKernel,
        })?;

    let latent_inducing_points = inducing_variable.layout().latent_inducing_points();
    let num_latent_gps = kernel.num_latent_gps();

    if let Some(latent_inducing_points) = latent_inducing_points {
        if latent_inducing_points != num_latent_gps {
            return Err(GpLayerError::ShapeIncompatibility {
                num_latent_gps,
                latent_inducing_points,
            });
        }
    }

    let num_inducing_points = inducing_variable.num_inducing();
    log::trace!(
        "Verified layer components: {} inducing points, {} latent GPs",
        num_inducing_points,
        num_latent_gps
    );
    Ok((num_inducing_points, num_latent_gps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inducing::{
        InducingPoints, SeparateIndependentInducingVariables, SharedIndependentInducingVariables,
    };
    use crate::kernels::{KernelFamily, SeparateIndependent, SharedIndependent};
    use crate::mean_functions::Zero;
    use ndarray::Array;

    fn points(m: usize) -> InducingPoints<f64> {
        InducingPoints::new(Array::zeros((m, 2)))
    }

    fn separate(num: usize, m: usize) -> SeparateIndependentInducingVariables<f64> {
        SeparateIndependentInducingVariables::new((0..num).map(|_| points(m)).collect())
    }

    fn shared_kernel(num_latent_gps: usize) -> SharedIndependent<f64> {
        SharedIndependent::new(KernelFamily::SquaredExponential.instantiate(2), num_latent_gps)
    }

    #[test]
    fn single_output_kernel_is_rejected() {
        let kernel = KernelFamily::SquaredExponential.instantiate::<f64>(2);
        let inducing = SharedIndependentInducingVariables::new(points(3));
        let result = verify_compatibility(kernel.as_ref(), &Zero::new(1), &inducing);
        match result {
            Err(GpLayerError::MissingCapability {
                argument,
                capability,
            }) => {
                assert_eq!(argument, "kernel");
                assert_eq!(capability, Capability::MultioutputKernel);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn plain_inducing_points_are_rejected() {
        let kernel = shared_kernel(2);
        let result = verify_compatibility(&kernel, &Zero::new(2), &points(3));
        match result {
            Err(err @ GpLayerError::MissingCapability { .. }) => {
                assert_eq!(
                    err.to_string(),
                    "`inducing_variable` must be a `MultioutputInducingVariables`"
                );
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn inducing_variable_is_checked_before_kernel() {
        let kernel = KernelFamily::SquaredExponential.instantiate::<f64>(2);
        let result = verify_compatibility(kernel.as_ref(), &Zero::new(1), &points(3));
        assert!(matches!(
            result,
            Err(GpLayerError::MissingCapability {
                capability: Capability::MultioutputInducingVariables,
                ..
            })
        ));
    }

    #[test]
    fn mismatched_separate_independent_count_is_rejected() {
        let result = verify_compatibility(&shared_kernel(2), &Zero::new(2), &separate(3, 5));
        match result {
            Err(err @ GpLayerError::ShapeIncompatibility { .. }) => {
                assert!(matches!(
                    err,
                    GpLayerError::ShapeIncompatibility {
                        num_latent_gps: 2,
                        latent_inducing_points: 3
                    }
                ));
                assert_eq!(
                    err.to_string(),
                    "The number of latent GPs (2) does not match \
                     the number of separate independent inducing_variables (3)"
                );
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn matching_separate_independent_count_is_accepted() {
        let kernels: Vec<Box<dyn Kernel<f64>>> = (0..3)
            .map(|_| KernelFamily::Matern52.instantiate(2))
            .collect();
        let kernel = SeparateIndependent::new(kernels);
        let result = verify_compatibility(&kernel, &Zero::new(3), &separate(3, 5)).unwrap();
        assert_eq!(result, (5, 3));
    }

    #[test]
    fn shared_inducing_points_take_latents_from_kernel() {
        let inducing = SharedIndependentInducingVariables::new(points(6));
        let result = verify_compatibility(&shared_kernel(4), &Zero::new(4), &inducing).unwrap();
        assert_eq!(result, (6, 4));
    }

    #[test]
    fn verification_is_idempotent() {
        let kernel = shared_kernel(3);
        let mean = Zero::new(3);
        let inducing = separate(3, 2);
        let first = verify_compatibility(&kernel, &mean, &inducing).unwrap();
        let second = verify_compatibility(&kernel, &mean, &inducing).unwrap();
        assert_eq!(first, second);
    }
}
