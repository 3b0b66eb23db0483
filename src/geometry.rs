//! Geometry of "valid" (unpadded, stride 1) convolutions over single images,
//! and the extraction of the patches a convolutional kernel compares.
//!
//! Conv arithmetic follows:
//! - <https://theano-pymc.readthedocs.io/en/latest/tutorial/conv_arithmetic.html>

use crate::Shape2;
use ndarray::*;
use num_traits::Float;

/// Checks that `output_shape` is the result of sliding a `patch_size` window
/// over `input_shape` with stride 1 and no padding, i.e. per axis
/// `output = input - patch_size + 1`.
///
/// A patch larger than the input never yields a valid output.
pub fn check_input_output_shape(
    input_shape: Shape2,
    output_shape: Shape2,
    patch_size: Shape2,
) -> bool {
    let width_check = valid_extent(input_shape.width, patch_size.width) == Some(output_shape.width);
    let height_check =
        valid_extent(input_shape.height, patch_size.height) == Some(output_shape.height);
    width_check && height_check
}

/// `input - patch + 1` along one axis, `None` on underflow or overflow.
fn valid_extent(input: usize, patch: usize) -> Option<usize> {
    input.checked_sub(patch)?.checked_add(1)
}

/// Output shape of a valid, stride 1 convolution, or `None` if the patch does
/// not fit into the input.
pub fn valid_output_shape(input_shape: Shape2, patch_size: Shape2) -> Option<Shape2> {
    if patch_size.width == 0 || patch_size.height == 0 {
        return None;
    }
    let width = valid_extent(input_shape.width, patch_size.width)?;
    let height = valid_extent(input_shape.height, patch_size.height)?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Shape2::new(width, height))
}

/// Turns one image of shape (C, W, H) into a (P, C*pw*ph) matrix, one row per
/// patch. Rows enumerate the patch offsets as (width offset, height offset)
/// pairs, with the height offset varying fastest.
pub(crate) fn im2col_ref<'a, T, F: 'a + Float>(im_arr: T, patch_size: Shape2) -> Array2<F>
where
    T: AsArray<'a, F, Ix3>,
{
    let im3d_arr: ArrayView3<F> = im_arr.into();
    let im_channel = im3d_arr.len_of(Axis(0));
    let new_w = im3d_arr.len_of(Axis(1)) - patch_size.width + 1;
    let new_h = im3d_arr.len_of(Axis(2)) - patch_size.height + 1;
    let mut cols_img: Array2<F> = Array::zeros((
        new_w * new_h,
        im_channel * patch_size.width * patch_size.height,
    ));
    let mut cont = 0_usize;
    for i in 0..new_w {
        for j in 0..new_h {
            let patch = im3d_arr.slice(s![
                ..,
                i..(i + patch_size.width),
                j..(j + patch_size.height),
            ]);
            let patchrow_unwrap: Array1<F> = Array::from_iter(patch.iter().copied());

            cols_img.row_mut(cont).assign(&patchrow_unwrap);
            cont += 1;
        }
    }
    cols_img
}

/// Extracts every patch of every image.
///
/// Input:
/// - images: (N, C*W*H), each row a flattened (C, W, H) image
///
/// Returns:
/// - patches: (N, P, C*pw*ph), P = (W - pw + 1) * (H - ph + 1)
///
/// Panics if the rows do not hold `channels * W * H` values or the patch does
/// not fit into the image.
pub fn extract_patches<'a, V, F: 'a + Float>(
    images: V,
    image_shape: Shape2,
    patch_size: Shape2,
    channels: usize,
) -> Array3<F>
where
    V: AsArray<'a, F, Ix2>,
{
    let images_arr: ArrayView2<F> = images.into();
    let output_shape = valid_output_shape(image_shape, patch_size).unwrap_or_else(|| {
        panic!(
            "Patch size {} does not fit into image shape {}",
            patch_size, image_shape
        )
    });
    assert_eq!(
        images_arr.ncols(),
        channels * image_shape.area(),
        "Images have {} columns, expected {} (channels * width * height)",
        images_arr.ncols(),
        channels * image_shape.area()
    );

    let num_patches = output_shape.area();
    let patch_dim = channels * patch_size.area();
    let mut patches: Array3<F> = Array::zeros((images_arr.nrows(), num_patches, patch_dim));
    for (image, mut out) in images_arr.outer_iter().zip(patches.outer_iter_mut()) {
        // Rows of a non-standard-layout view are not contiguous, so copy first
        let im3d: Array3<F> = Array::from_shape_vec(
            (channels, image_shape.width, image_shape.height),
            image.iter().copied().collect(),
        )
        .expect("row length checked above");
        out.assign(&im2col_ref(&im3d, patch_size));
    }
    patches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_shapes_pass_check() {
        for iw in 1..8 {
            for ih in 1..8 {
                for pw in 1..=iw {
                    for ph in 1..=ih {
                        let input = Shape2::new(iw, ih);
                        let patch = Shape2::new(pw, ph);
                        let output = Shape2::new(iw - pw + 1, ih - ph + 1);
                        assert!(check_input_output_shape(input, output, patch));
                        assert_eq!(valid_output_shape(input, patch), Some(output));
                    }
                }
            }
        }
    }

    #[test]
    fn other_output_shapes_fail_check() {
        let input = Shape2::new(5, 5);
        let patch = Shape2::new(3, 3);
        assert!(!check_input_output_shape(input, Shape2::new(4, 4), patch));
        assert!(!check_input_output_shape(input, Shape2::new(3, 4), patch));
        assert!(!check_input_output_shape(input, Shape2::new(4, 3), patch));
        assert!(!check_input_output_shape(input, Shape2::new(5, 5), patch));
    }

    #[test]
    fn oversized_patch_never_validates() {
        let input = Shape2::new(2, 2);
        let patch = Shape2::new(4, 2);
        assert!(!check_input_output_shape(input, Shape2::new(0, 1), patch));
        assert_eq!(valid_output_shape(input, patch), None);
    }

    #[test]
    fn huge_inputs_do_not_overflow() {
        let input = Shape2::new(usize::MAX, 3);
        let patch = Shape2::new(1, 2);
        assert!(check_input_output_shape(input, Shape2::new(usize::MAX, 2), patch));
        assert!(!check_input_output_shape(input, Shape2::new(0, 2), patch));
        assert_eq!(valid_output_shape(input, patch), Some(Shape2::new(usize::MAX, 2)));
        assert_eq!(
            valid_output_shape(Shape2::new(usize::MAX, usize::MAX), Shape2::new(usize::MAX, 1)),
            Some(Shape2::new(1, usize::MAX))
        );
    }

    #[test]
    fn patches_follow_width_then_height() {
        // one 3x3 image, values laid out (W, H)
        let images = Array::from_shape_vec((1, 9), (1..=9).map(|v| v as f64).collect()).unwrap();
        let patches = extract_patches(&images, Shape2::new(3, 3), Shape2::new(2, 2), 1);
        assert_eq!(patches.shape(), &[1, 4, 4]);
        assert_eq!(patches.slice(s![0, 0, ..]).to_vec(), vec![1., 2., 4., 5.]);
        assert_eq!(patches.slice(s![0, 1, ..]).to_vec(), vec![2., 3., 5., 6.]);
        assert_eq!(patches.slice(s![0, 2, ..]).to_vec(), vec![4., 5., 7., 8.]);
        assert_eq!(patches.slice(s![0, 3, ..]).to_vec(), vec![5., 6., 8., 9.]);
    }

    #[test]
    fn full_size_patch_is_the_image() {
        let images = Array::from_shape_vec((2, 6), (0..12).map(|v| v as f32).collect()).unwrap();
        let patches = extract_patches(&images, Shape2::new(2, 3), Shape2::new(2, 3), 1);
        assert_eq!(patches.shape(), &[2, 1, 6]);
        assert_eq!(patches.slice(s![1, 0, ..]).to_vec(), images.row(1).to_vec());
    }

    #[test]
    #[should_panic]
    fn wrong_image_width_panics() {
        let images: Array2<f64> = Array::zeros((1, 10));
        extract_patches(&images, Shape2::new(3, 3), Shape2::new(2, 2), 1);
    }
}
