//! Inducing variables of sparse GP layers.
//!
//! Collections that can back a multi-output layer expose the
//! [`MultioutputInducingVariables`] capability through
//! [`InducingVariables::as_multioutput`]; plain inducing points do not.

use ndarray::*;
use num_traits::Float;

/// A collection of inducing variables.
pub trait InducingVariables<F: Float> {
    /// Number of inducing variables in the collection. For collections made of
    /// several sub-collections this is the size of one of them.
    fn num_inducing(&self) -> usize;

    /// Returns the multi-output view of this collection if it has one.
    fn as_multioutput(&self) -> Option<&dyn MultioutputInducingVariables<F>> {
        None
    }
}

impl<F: Float, Z: InducingVariables<F> + ?Sized> InducingVariables<F> for Box<Z> {
    fn num_inducing(&self) -> usize {
        (**self).num_inducing()
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputInducingVariables<F>> {
        (**self).as_multioutput()
    }
}

/// How the inducing variables of a multi-output collection relate to the
/// latent GPs of a layer.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum InducingLayout {
    /// One collection shared by every latent GP.
    Shared,
    /// One independent sub-collection per latent GP.
    SeparateIndependent { num_sub_collections: usize },
}

impl InducingLayout {
    /// Number of latent GPs the layout pins down, if any.
    pub fn latent_inducing_points(&self) -> Option<usize> {
        match self {
            InducingLayout::Shared => None,
            InducingLayout::SeparateIndependent {
                num_sub_collections,
            } => Some(*num_sub_collections),
        }
    }
}

/// Capability of inducing variables usable by multi-output layers.
pub trait MultioutputInducingVariables<F: Float>: InducingVariables<F> {
    fn layout(&self) -> InducingLayout;
}

/// Inducing inputs living in the same space as the data, (M, D).
#[derive(Debug, Clone)]
pub struct InducingPoints<F: Float> {
    z: Array2<F>,
}

impl<F: Float> InducingPoints<F> {
    pub fn new(z: Array2<F>) -> InducingPoints<F> {
        InducingPoints { z }
    }

    pub fn z(&self) -> ArrayView2<F> {
        self.z.view()
    }
}

impl<F: Float> InducingVariables<F> for InducingPoints<F> {
    fn num_inducing(&self) -> usize {
        self.z.nrows()
    }
}

/// The same inducing points for every latent GP.
#[derive(Debug, Clone)]
pub struct SharedIndependentInducingVariables<F: Float> {
    inducing_variable: InducingPoints<F>,
}

impl<F: Float> SharedIndependentInducingVariables<F> {
    pub fn new(inducing_variable: InducingPoints<F>) -> SharedIndependentInducingVariables<F> {
        SharedIndependentInducingVariables { inducing_variable }
    }

    pub fn inducing_variable(&self) -> &InducingPoints<F> {
        &self.inducing_variable
    }
}

impl<F: Float> InducingVariables<F> for SharedIndependentInducingVariables<F> {
    fn num_inducing(&self) -> usize {
        self.inducing_variable.num_inducing()
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputInducingVariables<F>> {
        Some(self)
    }
}

impl<F: Float> MultioutputInducingVariables<F> for SharedIndependentInducingVariables<F> {
    fn layout(&self) -> InducingLayout {
        InducingLayout::Shared
    }
}

/// Separate inducing points for each latent GP. All sub-collections are
/// expected to hold the same number of points.
#[derive(Debug, Clone)]
pub struct SeparateIndependentInducingVariables<F: Float> {
    inducing_variable_list: Vec<InducingPoints<F>>,
}

impl<F: Float> SeparateIndependentInducingVariables<F> {
    pub fn new(
        inducing_variable_list: Vec<InducingPoints<F>>,
    ) -> SeparateIndependentInducingVariables<F> {
        SeparateIndependentInducingVariables {
            inducing_variable_list,
        }
    }

    pub fn inducing_variable_list(&self) -> &[InducingPoints<F>] {
        &self.inducing_variable_list
    }
}

impl<F: Float> InducingVariables<F> for SeparateIndependentInducingVariables<F> {
    fn num_inducing(&self) -> usize {
        self.inducing_variable_list
            .first()
            .map_or(0, |z| z.num_inducing())
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputInducingVariables<F>> {
        Some(self)
    }
}

impl<F: Float> MultioutputInducingVariables<F> for SeparateIndependentInducingVariables<F> {
    fn layout(&self) -> InducingLayout {
        InducingLayout::SeparateIndependent {
            num_sub_collections: self.inducing_variable_list.len(),
        }
    }
}

/// Inducing patches of a convolutional kernel, (M, patch width, patch height).
#[derive(Debug, Clone)]
pub struct InducingPatches<F: Float> {
    patches: Array3<F>,
}

impl<F: Float> InducingPatches<F> {
    pub fn new(patches: Array3<F>) -> InducingPatches<F> {
        InducingPatches { patches }
    }

    pub fn patches(&self) -> ArrayView3<F> {
        self.patches.view()
    }

    /// Patches flattened to rows, (M, patch width * patch height).
    pub fn flattened(&self) -> Array2<F> {
        let (m, w, h) = self.patches.dim();
        Array::from_shape_vec((m, w * h), self.patches.iter().copied().collect())
            .expect("element count is m * w * h")
    }
}

impl<F: Float> InducingVariables<F> for InducingPatches<F> {
    fn num_inducing(&self) -> usize {
        self.patches.len_of(Axis(0))
    }

    fn as_multioutput(&self) -> Option<&dyn MultioutputInducingVariables<F>> {
        Some(self)
    }
}

impl<F: Float> MultioutputInducingVariables<F> for InducingPatches<F> {
    fn layout(&self) -> InducingLayout {
        InducingLayout::Shared
    }
}
