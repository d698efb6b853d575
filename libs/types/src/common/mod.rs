//! Core fixed-point arithmetic shared by every pool engine

pub mod errors;
pub mod fixed_point;
pub mod integer;
pub mod log_exp;
