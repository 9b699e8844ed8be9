//! wgpu backend for the [`Device`](crate::device::Device) interface.

mod context;
mod device;
mod error;
mod frame;
mod init;
mod reflect;
mod surface;

pub use context::Gpu;
pub use device::WgpuDevice;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
