//! # Input Validation
//!
//! Checks that run before any network interaction and never touch the
//! operation state.

use super::errors::{OperationError, OperationResult};
use shared_types::{CardId, CardStats};

/// Every attribute must lie in `[min, max]`.
pub fn validate_attributes(stats: &CardStats, min: u64, max: u64) -> OperationResult<()> {
    for (attribute, value) in stats.values() {
        if value < min || value > max {
            return Err(OperationError::InvalidAttributeRange {
                attribute,
                value,
                min,
                max,
            });
        }
    }
    Ok(())
}

/// A card cannot be fused with itself.
pub fn validate_fusion_pair(a: CardId, b: CardId) -> OperationResult<()> {
    if a == b {
        return Err(OperationError::InvalidFusionPair(a));
    }
    Ok(())
}
