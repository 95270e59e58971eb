pub mod constants;
pub mod pixel_buffer;
