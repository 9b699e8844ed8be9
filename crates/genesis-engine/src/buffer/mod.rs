//! CPU-side vertex/index data and its upload to device buffers.

mod attribute;
mod typed;

pub use attribute::BufferAttribute;
pub use typed::{TypedBuffer, byte_stride};
