use std::fmt;

/// Reply buffer a parameter or size refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    Global,
    Local,
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryRegion::Global => f.write_str("global"),
            MemoryRegion::Local => f.write_str("local"),
        }
    }
}

/// Errors that can occur while building command frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A reply buffer size or reply offset exceeds what the firmware allows.
    #[error("{region} memory budget exceeded ({requested} bytes, max {max})")]
    ParameterBudgetExceeded {
        region: MemoryRegion,
        requested: usize,
        max: usize,
    },

    /// A buffer size is within budget but cannot be carried by the packed
    /// 10-bit global / 6-bit local header field.
    #[error("{region} memory size {size} does not fit the frame header (max {max})")]
    MemorySizeUnencodable {
        region: MemoryRegion,
        size: usize,
        max: usize,
    },

    /// The encoded frame does not fit the 16-bit length field.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A string parameter contains an interior NUL byte.
    #[error("string parameter contains NUL: {0:?}")]
    InvalidString(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
