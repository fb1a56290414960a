//! Tensor shape with row-major strides

/// Shape of a tensor: ordered dimension sizes plus row-major strides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorShape {
    /// Create tensor shape from dimensions, computing row-major strides
    pub fn from_dims(dims: &[usize]) -> Self {
        let mut strides = Vec::with_capacity(dims.len());

        if dims.is_empty() {
            return Self {
                dims: dims.to_vec(),
                strides: vec![],
            };
        }

        // Compute strides in row-major order (last dimension varies fastest)
        for i in (0..dims.len()).rev() {
            let stride = if i == dims.len() - 1 {
                1
            } else {
                // Use checked multiplication to prevent overflow
                dims[i + 1..]
                    .iter()
                    .copied()
                    .fold(1usize, |acc, x| acc.checked_mul(x).unwrap_or(usize::MAX))
            };
            strides.push(stride);
        }

        strides.reverse();

        Self {
            dims: dims.to_vec(),
            strides,
        }
    }

    /// Get the dimensions
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get the strides
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of one dimension
    pub fn dim(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    /// Compute total number of elements
    pub fn total_elements(&self) -> usize {
        self.dims
            .iter()
            .copied()
            .fold(1usize, |acc, x| acc.checked_mul(x).unwrap_or(usize::MAX))
    }

    /// Copy of this shape with one dimension replaced. Used to derive the
    /// output shape of a split (axis dimension divided by the split count).
    pub fn with_dim(&self, axis: usize, size: usize) -> Self {
        let mut dims = self.dims.clone();
        dims[axis] = size;
        TensorShape::from_dims(&dims)
    }
}
