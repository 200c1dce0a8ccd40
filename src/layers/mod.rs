// Layers composed from the ops kernels
pub mod attention;
