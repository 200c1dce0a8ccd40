// Safe softmax: subtract the running maximum before exponentiating so large
// scores cannot overflow exp().

use log::trace;

use crate::core::config::MaxInit;
use crate::core::error::KernelError;
use crate::core::types::Matrix;

/// In-place softmax over one vector, subtracting the true maximum
pub fn softmax_vector(input: &mut [f32]) -> Result<(), KernelError> {
    softmax_vector_with(input, MaxInit::FirstElement)
}

/// In-place softmax over one vector with an explicit max initialisation
///
/// 1. max = fold of `input` starting from `max_init`
/// 2. sum = Σ exp(x_i - max)
/// 3. x_i ← exp(x_i - max) / sum
///
/// `MaxInit::LegacyOne` also follows the legacy kernel's mixed f32/f64
/// arithmetic, so its output matches that kernel bit for bit.
///
/// # Errors
/// `EmptyInput` if `input` is empty
pub fn softmax_vector_with(input: &mut [f32], max_init: MaxInit) -> Result<(), KernelError> {
    if input.is_empty() {
        return Err(KernelError::EmptyInput { op: "softmax_vector" });
    }

    let init = match max_init {
        MaxInit::FirstElement => input[0],
        MaxInit::LegacyOne => 1.0,
    };
    let mut max_elem = init;
    for &x in input.iter() {
        if x > max_elem {
            max_elem = x;
        }
    }

    match max_init {
        MaxInit::FirstElement => {
            let mut sum = 0.0f32;
            for x in input.iter_mut() {
                *x = (*x - max_elem).exp();
                sum += *x;
            }
            for x in input.iter_mut() {
                *x /= sum;
            }
        }
        MaxInit::LegacyOne => legacy_exp_divide(input, max_elem),
    }
    Ok(())
}

// The legacy kernel calls the double-precision exp on an f32 difference. The
// running sum is rounded back to f32 after every add, and each quotient is
// taken in f64 before narrowing.
fn legacy_exp_divide(input: &mut [f32], max_elem: f32) {
    let mut sum = 0.0f32;
    for &x in input.iter() {
        sum = (sum as f64 + ((x - max_elem) as f64).exp()) as f32;
    }
    for x in input.iter_mut() {
        *x = (((*x - max_elem) as f64).exp() / sum as f64) as f32;
    }
}

/// Row-wise in-place softmax over a matrix, subtracting each row's true maximum
pub fn softmax_rows(input: &mut Matrix) -> Result<(), KernelError> {
    softmax_rows_with(input, MaxInit::FirstElement)
}

/// Row-wise in-place softmax with an explicit max initialisation
pub fn softmax_rows_with(input: &mut Matrix, max_init: MaxInit) -> Result<(), KernelError> {
    trace!("softmax over {:?} rows ({:?})", input.shape(), max_init);
    for row in input.rows_iter_mut() {
        softmax_vector_with(row, max_init)?;
    }
    Ok(())
}
