pub mod batch;
pub mod common;
pub mod image;

pub use batch::*;
pub use common::*;
pub use image::*;
