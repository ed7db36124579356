//! Policy ceilings for decoding untrusted data
//!
//! These bound the resources a hostile encoding can claim before any of it
//! has been validated. They are policy limits, not platform limits: the
//! nesting cap in particular is a security boundary and holds even where the
//! host call stack could go deeper.

use serde::{Deserialize, Serialize};

/// Maximum nesting depth for constructed or encapsulated objects. Deeply
/// nested legitimate structures (complex attribute sets) stay well under
/// this while artificial bad data is cut off.
pub const MAX_NESTING_LEVEL: usize = 50;

/// Maximum size of an encoded OBJECT IDENTIFIER including tag and length,
/// since OIDs are handled as opaque blobs in encoded form.
pub const MAX_OID_SIZE: usize = 32;

/// Ceiling for ordinary object lengths. 32K covers all normal PKI data;
/// anything larger goes through the explicit long-object readers.
pub const MAX_SHORT_LENGTH: i64 = 32_767;

/// Ceiling for explicitly large but trusted objects such as bulk enveloped
/// data.
pub const MAX_LONG_LENGTH: i64 = i32::MAX as i64 - 16;

/// Configurable decoding ceilings
///
/// The defaults match the named constants above. Deserializable so that a
/// host application can tighten them from its own configuration; they should
/// not normally be raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum recursion depth for the structural validator
    pub max_nesting: usize,
    /// Maximum encoded OID size, including header
    pub max_oid_size: usize,
    /// Length ceiling for ordinary objects
    pub max_short_length: i64,
    /// Length ceiling for long-form object reads
    pub max_long_length: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_nesting: MAX_NESTING_LEVEL,
            max_oid_size: MAX_OID_SIZE,
            max_short_length: MAX_SHORT_LENGTH,
            max_long_length: MAX_LONG_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_constants() {
        let limits = Limits::default();
        assert_eq!(limits.max_nesting, MAX_NESTING_LEVEL);
        assert_eq!(limits.max_oid_size, MAX_OID_SIZE);
        assert_eq!(limits.max_short_length, MAX_SHORT_LENGTH);
        assert_eq!(limits.max_long_length, MAX_LONG_LENGTH);
    }
}
