// THEORY:
// The `Tensor` module is the numeric collaborator of the augmentation engine.
// It is a "dumb" data container: an n-dimensional `f32` array plus an optional
// human-readable name. The pipeline never inspects values; it only moves
// tensors between collections and transforms, and carries names across
// replacements.
//
// Key architectural principles:
// 1.  **Opaque Value**: Tensors are never compared for equality by the engine.
//     Two tensors with identical values are still two different slots, so the
//     type intentionally does not implement `PartialEq`.
// 2.  **Two Update Policies**: Transforms may build a brand new tensor (`flip`,
//     `mul_scalar`) or rewrite a sub-range in place (`map_range_inplace`) and
//     hand the same tensor back. Both are first-class here.
// 3.  **Thin Backend**: All numeric storage is delegated to `ndarray`. This
//     module only adds the name tag and the handful of operations transforms
//     need, keeping the backend swappable.

pub mod tensor {
    use crate::error::Result;
    use ndarray::{ArrayD, Axis, IxDyn, Slice};

    pub type Element = f32;

    /// An n-dimensional numeric array with an optional name.
    #[derive(Debug, Clone)]
    pub struct Tensor {
        /// The element storage. Layout is whatever the last operation produced.
        data: ArrayD<Element>,
        /// The name used to address this tensor inside a `KeyedCollection`.
        name: Option<String>,
    }

    impl Tensor {
        pub fn new(data: ArrayD<Element>) -> Self {
            Self { data, name: None }
        }

        pub fn from_shape_vec(shape: &[usize], values: Vec<Element>) -> Result<Self> {
            Ok(Self::new(ArrayD::from_shape_vec(IxDyn(shape), values)?))
        }

        pub fn zeros(shape: &[usize]) -> Self {
            Self::new(ArrayD::zeros(IxDyn(shape)))
        }

        pub fn with_name(mut self, name: impl Into<String>) -> Self {
            self.name = Some(name.into());
            self
        }

        pub fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }

        pub fn set_name(&mut self, name: Option<String>) {
            self.name = name;
        }

        pub fn shape(&self) -> &[usize] {
            self.data.shape()
        }

        pub fn ndim(&self) -> usize {
            self.data.ndim()
        }

        pub fn data(&self) -> &ArrayD<Element> {
            &self.data
        }

        pub fn data_mut(&mut self) -> &mut ArrayD<Element> {
            &mut self.data
        }

        pub fn into_data(self) -> ArrayD<Element> {
            self.data
        }

        /// Elements in logical (row-major) order.
        pub fn to_vec(&self) -> Vec<Element> {
            self.data.iter().copied().collect()
        }

        /// Returns a copy reversed along `axis`. The name is kept.
        ///
        /// # Panics
        /// If `axis >= self.ndim()`.
        pub fn flip(&self, axis: usize) -> Self {
            let mut view = self.data.view();
            view.invert_axis(Axis(axis));
            Self {
                data: view.as_standard_layout().into_owned(),
                name: self.name.clone(),
            }
        }

        /// Ranged slice-assignment: rewrites every element selected by `range`
        /// along `axis` with `f(element)`, in place.
        ///
        /// # Panics
        /// If `axis` is out of bounds or `range` starts past the end of the axis.
        pub fn map_range_inplace<F>(&mut self, axis: usize, range: Slice, f: F)
        where
            F: FnMut(Element) -> Element,
        {
            self.data.slice_axis_mut(Axis(axis), range).mapv_inplace(f);
        }

        pub fn mul_scalar(&self, factor: Element) -> Self {
            Self {
                data: &self.data * factor,
                name: self.name.clone(),
            }
        }

        pub fn add_scalar(&self, offset: Element) -> Self {
            Self {
                data: &self.data + offset,
                name: self.name.clone(),
            }
        }
    }

    impl Default for Tensor {
        /// An empty, unnamed 1-D tensor.
        fn default() -> Self {
            Self::zeros(&[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tensor::*;
    use ndarray::Slice;

    #[test]
    fn flip_reverses_rows_and_keeps_name() {
        let t = Tensor::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_name("image");
        let flipped = t.flip(0);
        assert_eq!(flipped.to_vec(), vec![3.0, 4.0, 1.0, 2.0]);
        assert_eq!(flipped.name(), Some("image"));
        // Source is untouched.
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn flip_columns() {
        let t = Tensor::from_shape_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(t.flip(1).to_vec(), vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);
    }

    #[test]
    fn strided_range_assignment() {
        let mut t = Tensor::from_shape_vec(&[1, 4], vec![0.2, 0.3, 0.8, 0.9]).unwrap();
        t.map_range_inplace(1, Slice::new(1, None, 2), |v| v * -1.0 + 1.0);
        let values = t.to_vec();
        assert!((values[0] - 0.2).abs() < 1e-6);
        assert!((values[1] - 0.7).abs() < 1e-6);
        assert!((values[2] - 0.8).abs() < 1e-6);
        assert!((values[3] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn scalar_arithmetic() {
        let t = Tensor::from_shape_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(t.mul_scalar(2.0).add_scalar(1.0).to_vec(), vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        assert!(Tensor::from_shape_vec(&[2, 2], vec![1.0]).is_err());
    }
}
