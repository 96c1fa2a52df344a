//! Global pointer capture port

/// Claims the global pointer-move/release stream for the lifetime of a
/// guard. Dropping the guard must deregister the observation.
pub trait PointerCapture {
    /// Scoped claim on the pointer stream.
    type Guard;

    /// Starts observing global pointer movement and release.
    fn capture(&self) -> Self::Guard;
}
