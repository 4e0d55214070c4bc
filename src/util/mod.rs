pub mod fixed;
pub mod rng;
pub mod vec2;
