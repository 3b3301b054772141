//! Correlation string round-tripped through Paddle.
//!
//! Paddle stores the `passthrough` field of a pay link and echoes it back in
//! every webhook for the resulting subscription. We encode the owning
//! customer and the local subscription name as `"<owner key>,<name>"`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passthrough {
    pub owner_key: String,
    pub name: String,
}

impl Passthrough {
    pub fn new(owner_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner_key: owner_key.into(),
            name: name.into(),
        }
    }

    /// Split on the first comma. The name may itself contain commas; the
    /// owner key may not.
    pub fn parse(raw: &str) -> Option<Self> {
        let (owner_key, name) = raw.split_once(',')?;
        if owner_key.is_empty() {
            return None;
        }
        Some(Self::new(owner_key, name))
    }

    /// Owner key as a numeric customer id.
    pub fn owner_id(&self) -> Option<i64> {
        self.owner_key.trim().parse().ok()
    }
}

impl fmt::Display for Passthrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.owner_key, self.name)
    }
}
