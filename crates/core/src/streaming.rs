//! Streaming modes for range reads
//!
//! Instruction streams carry streaming modes as integer codes; this module
//! maps them back onto the enumerated set.

use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// How a range read batches its results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamingMode {
    /// Transfer the whole range as early as possible
    WantAll,
    /// Ramp batch sizes up as the caller keeps iterating
    Iterator,
    /// Transfer exactly the requested limit in one batch
    Exact,
    /// Small batches
    Small,
    /// Medium batches
    Medium,
    /// Large batches
    Large,
    /// The whole range in a single batch
    Serial,
}

impl StreamingMode {
    /// Every streaming mode, in code order
    pub const ALL: [StreamingMode; 7] = [
        StreamingMode::WantAll,
        StreamingMode::Iterator,
        StreamingMode::Exact,
        StreamingMode::Small,
        StreamingMode::Medium,
        StreamingMode::Large,
        StreamingMode::Serial,
    ];

    /// Numeric code of this mode
    pub fn code(self) -> i64 {
        match self {
            StreamingMode::WantAll => -2,
            StreamingMode::Iterator => -1,
            StreamingMode::Exact => 0,
            StreamingMode::Small => 1,
            StreamingMode::Medium => 2,
            StreamingMode::Large => 3,
            StreamingMode::Serial => 4,
        }
    }

    /// Look up the mode with the given code
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no mode has this code.
    pub fn from_code(code: i64) -> Result<StreamingMode> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.code() == code)
            .ok_or_else(|| StackError::InvalidArgument(format!("Invalid code: {}", code)))
    }
}

impl TryFrom<i64> for StreamingMode {
    type Error = StackError;

    fn try_from(code: i64) -> Result<Self> {
        StreamingMode::from_code(code)
    }
}
