//! Row-partitioned parallel Gaussian blur.
//!
//! [`pipeline::blur_engine::BlurEngine`] splits an image into horizontal
//! bands, convolves each band on its own thread and repeats for the
//! requested number of iterations.

pub mod blurring;
pub mod pipeline;
pub mod shared;
