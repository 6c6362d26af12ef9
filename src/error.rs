//! Engine error type.

use std::error::Error;
use std::fmt;

/// Everything that can go wrong around the GPU boundary.
///
/// Device loss at construction is not surfaced through this type;
/// the engine reports it via [`crate::Event::DeviceUnavailable`] and
/// goes inert instead of failing to build.
#[derive(Debug)]
pub enum EngineError {
    /// No adapter or device could be acquired.
    DeviceUnavailable(String),
    /// The window surface could not be created.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// A frame could not be presented; simulation state is unaffected.
    Presentation(wgpu::SurfaceError),
    /// A GPU-to-CPU copy produced unusable data.
    Readback(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable(reason) => {
                write!(f, "no usable GPU device: {reason}")
            }
            Self::SurfaceCreation(e) => write!(f, "surface creation failed: {e}"),
            Self::Presentation(e) => write!(f, "presentation failed: {e}"),
            Self::Readback(reason) => write!(f, "readback failed: {reason}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SurfaceCreation(e) => Some(e),
            Self::Presentation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for EngineError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        Self::SurfaceCreation(e)
    }
}

impl From<wgpu::SurfaceError> for EngineError {
    fn from(e: wgpu::SurfaceError) -> Self {
        Self::Presentation(e)
    }
}

impl From<wgpu::RequestDeviceError> for EngineError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Self::DeviceUnavailable(format!("device request failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_the_reason() {
        let e = EngineError::DeviceUnavailable("no compatible adapter".into());
        assert_eq!(e.to_string(), "no usable GPU device: no compatible adapter");
        let e = EngineError::Readback("canvas byte length mismatch".into());
        assert_eq!(e.to_string(), "readback failed: canvas byte length mismatch");
    }
}
