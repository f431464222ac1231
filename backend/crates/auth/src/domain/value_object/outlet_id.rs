//! Outlet ID Value Object
//!
//! Tenant-scoping attribute embedded in issued access tokens so that
//! downstream authorization does not need an extra lookup. An identity
//! without an outlet carries the zero value.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Tenant scope id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct OutletId(i64);

impl OutletId {
    /// No outlet assigned yet
    pub const NONE: OutletId = OutletId(0);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlet_id() {
        let id = OutletId::new(7);
        assert_eq!(id.as_i64(), 7);
        assert!(!id.is_none());
        assert!(OutletId::NONE.is_none());
    }
}
