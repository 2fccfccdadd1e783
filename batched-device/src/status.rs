use std::fmt;

/// Result code returned by device BLAS entry points and stored in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    /// A matrix or vector dimension is zero or inconsistent.
    InvalidDimension,
    /// A leading dimension or stride is smaller than the data it describes.
    InvalidLeadingDimension,
    /// Buffer of operand A (or x) is too small for its descriptor.
    InsufficientMemoryA,
    /// Buffer of operand B (or y) is too small for its descriptor.
    InsufficientMemoryB,
    /// Buffer of operand C is too small for its descriptor.
    InsufficientMemoryC,
    /// The queue no longer accepts commands.
    QueueClosed,
    /// The command failed while executing on the device.
    ExecutionFailed,
}

impl StatusCode {
    #[inline]
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Success => "success",
            StatusCode::InvalidDimension => "invalid dimension",
            StatusCode::InvalidLeadingDimension => "invalid leading dimension",
            StatusCode::InsufficientMemoryA => "insufficient memory for operand A",
            StatusCode::InsufficientMemoryB => "insufficient memory for operand B",
            StatusCode::InsufficientMemoryC => "insufficient memory for operand C",
            StatusCode::QueueClosed => "queue closed",
            StatusCode::ExecutionFailed => "execution failed",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
