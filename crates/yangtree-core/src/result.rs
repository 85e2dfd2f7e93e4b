//! Result type alias for statement tree operations

use crate::error::YangError;

/// Standard Result type for statement tree operations
pub type Result<T> = std::result::Result<T, YangError>;
