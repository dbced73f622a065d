/// A trait for vector-like types accepted by [`crate::rhs::RightHandSide`].
///
/// State and parameter vectors can be passed as plain `Vec<f64>`, fixed-size
/// arrays, and with the matching features `ndarray::Array1<f64>` or
/// `nalgebra::DVector<f64>`. Results are returned in the same type as the
/// inputs.
///
/// # Examples
///
/// ```rust
/// use kinetic_codegen::vector::Vector;
///
/// let state = vec![1.0, 2.0, 3.0];
/// assert_eq!(Vector::as_slice(&state), Some(&[1.0, 2.0, 3.0][..]));
///
/// let fixed = <[f64; 2]>::from_vec(vec![0.5, 1.5]).unwrap();
/// assert_eq!(fixed, [0.5, 1.5]);
/// assert!(<[f64; 2]>::from_vec(vec![0.5]).is_none());
/// ```
pub trait Vector: Sized {
    /// Returns the vector's data as a slice, or `None` when the storage is not
    /// contiguous.
    fn as_slice(&self) -> Option<&[f64]>;

    /// Creates a vector holding `values`, or `None` when the type cannot hold
    /// that many values.
    fn from_vec(values: Vec<f64>) -> Option<Self>;

    /// Returns the length of the vector.
    fn len(&self) -> usize;

    /// Checks if the vector is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Vector for Vec<f64> {
    fn as_slice(&self) -> Option<&[f64]> {
        Some(self.as_slice())
    }

    fn from_vec(values: Vec<f64>) -> Option<Self> {
        Some(values)
    }

    fn len(&self) -> usize {
        self.len()
    }
}

/// Fixed-size arrays only accept exactly `N` values.
impl<const N: usize> Vector for [f64; N] {
    fn as_slice(&self) -> Option<&[f64]> {
        Some(self.as_slice())
    }

    fn from_vec(values: Vec<f64>) -> Option<Self> {
        values.try_into().ok()
    }

    fn len(&self) -> usize {
        N
    }
}

/// Implementation of Vector trait for ndarray's Array1<f64>.
///
/// Arrays with a non-standard layout, such as reversed views turned owned,
/// are reported as non-contiguous.
///
/// # Examples
///
/// ```rust
/// use kinetic_codegen::vector::Vector;
/// use ndarray::Array1;
///
/// let vec = Array1::from_vec(vec![1.0, 2.0]);
/// assert_eq!(Vector::as_slice(&vec), Some(&[1.0, 2.0][..]));
/// ```
#[cfg(feature = "ndarray")]
impl Vector for ndarray::Array1<f64> {
    fn as_slice(&self) -> Option<&[f64]> {
        self.as_slice()
    }

    fn from_vec(values: Vec<f64>) -> Option<Self> {
        Some(ndarray::Array1::from_vec(values))
    }

    fn len(&self) -> usize {
        self.len()
    }
}

/// Implementation of Vector trait for nalgebra's DVector<f64>.
///
/// # Examples
///
/// ```rust
/// use kinetic_codegen::vector::Vector;
/// use nalgebra::DVector;
///
/// let vec = DVector::from_vec(vec![1.0, 2.0]);
/// assert_eq!(Vector::as_slice(&vec), Some(&[1.0, 2.0][..]));
/// ```
#[cfg(feature = "nalgebra")]
impl Vector for nalgebra::DVector<f64> {
    fn as_slice(&self) -> Option<&[f64]> {
        Some(self.as_slice())
    }

    fn from_vec(values: Vec<f64>) -> Option<Self> {
        Some(nalgebra::DVector::from_vec(values))
    }

    fn len(&self) -> usize {
        self.len()
    }
}
