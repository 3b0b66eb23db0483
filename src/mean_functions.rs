//! Mean functions added to the output of a GP layer.

use ndarray::*;
use num_traits::Float;

pub trait MeanFunction<F: Float> {
    fn name(&self) -> &'static str;

    /// Evaluates the mean at the rows of `x`.
    fn apply(&self, x: ArrayView2<F>) -> Array2<F>;
}

impl<F: Float, M: MeanFunction<F> + ?Sized> MeanFunction<F> for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&self, x: ArrayView2<F>) -> Array2<F> {
        (**self).apply(x)
    }
}

/// Zero mean with `output_dim` columns.
#[derive(Debug, Clone, Copy)]
pub struct Zero {
    output_dim: usize,
}

impl Zero {
    pub fn new(output_dim: usize) -> Zero {
        Zero { output_dim }
    }
}

impl<F: Float> MeanFunction<F> for Zero {
    fn name(&self) -> &'static str {
        "Zero"
    }

    fn apply(&self, x: ArrayView2<F>) -> Array2<F> {
        Array::zeros((x.nrows(), self.output_dim))
    }
}

/// Passes the inputs through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<F: Float> MeanFunction<F> for Identity {
    fn name(&self) -> &'static str {
        "Identity"
    }

    fn apply(&self, x: ArrayView2<F>) -> Array2<F> {
        x.to_owned()
    }
}

/// The same value for every input row.
#[derive(Debug, Clone)]
pub struct Constant<F: Float> {
    c: Array1<F>,
}

impl<F: Float> Constant<F> {
    pub fn new(c: Array1<F>) -> Constant<F> {
        Constant { c }
    }
}

impl<F: Float> MeanFunction<F> for Constant<F> {
    fn name(&self) -> &'static str {
        "Constant"
    }

    fn apply(&self, x: ArrayView2<F>) -> Array2<F> {
        let mut out = Array::zeros((x.nrows(), self.c.len()));
        for mut row in out.outer_iter_mut() {
            row.assign(&self.c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_functions_evaluate_per_row() {
        let x = array![[1.0_f64, 2.0], [3.0, 4.0], [5.0, 6.0]];
        assert_eq!(Zero::new(1).apply(x.view()), Array2::<f64>::zeros((3, 1)));
        assert_eq!(Identity.apply(x.view()), x);
        let c = Constant::new(array![0.5, -1.0]);
        assert_eq!(
            c.apply(x.view()),
            array![[0.5, -1.0], [0.5, -1.0], [0.5, -1.0]]
        );
    }

    #[test]
    fn boxed_mean_functions_keep_their_name() {
        let mean: Box<dyn MeanFunction<f32>> = Box::new(Identity);
        assert_eq!(mean.name(), "Identity");
    }
}
