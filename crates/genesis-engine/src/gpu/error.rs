/// What the device does after failing to acquire a swapchain texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was reconfigured; the current frame is dropped.
    Reconfigured,
    /// Transient; the current frame is dropped.
    SkipFrame,
    /// The device cannot continue (usually out of memory).
    Fatal,
}
