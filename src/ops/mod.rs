// Core compute kernel
pub mod matmul;

// Activation functions
pub mod softmax;
pub mod swiglu;

// Normalization operations
pub mod rmsnorm;
