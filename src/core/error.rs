use thiserror::Error;

/// Errors returned by the kernels when a caller breaks a shape contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("Matrix dimensions must be positive, got {rows}x{cols}.")]
    InvalidShape { rows: usize, cols: usize },

    #[error("Buffer holds {actual} elements but the shape needs {expected}.")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Shape mismatch in {op}: expected {expected:?}, got {actual:?}.")]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Length mismatch in {op}: expected {expected}, got {actual}.")]
    LengthMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Empty input given to {op}.")]
    EmptyInput { op: &'static str },

    #[error("Index ({row}, {col}) is out of bounds for a {rows}x{cols} matrix.")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Could not allocate a buffer of {elements} f32 elements.")]
    AllocationFailure { elements: usize },
}

/// Returns `LengthMismatch` unless `actual == expected`.
pub(crate) fn check_len(
    op: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), KernelError> {
    if expected != actual {
        return Err(KernelError::LengthMismatch { op, expected, actual });
    }
    Ok(())
}
