/// Errors from wgpu device setup and resource uploads.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("texture {id}: expected {expected} bytes for {width}x{height} RGBA8, got {actual}")]
    TextureSize {
        id: String,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
