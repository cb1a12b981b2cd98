//! CopyPolicy v1: switches for the two repair passes of the copier.

use serde::{Deserialize, Serialize};
use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_POLICY_VERSION;

/// Copy policy version 1.
///
/// ## Parameters
///
/// - `heal_cid_system_info`: replace corrupted `CIDSystemInfo` descriptors on CID fonts
/// - `detach_pages`: hoist inherited attributes onto page leaves and drop `/Parent`
/// - `max_inheritance_depth`: optional hop cap for the `/Parent` walk; cycles are
///   detected without it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Whether to heal `CIDSystemInfo` on CIDFontType0/CIDFontType2 fonts.
    pub heal_cid_system_info: bool,
    /// Whether page leaves are detached from their page tree.
    pub detach_pages: bool,
    /// Maximum `/Parent` hops followed when resolving inherited attributes.
    /// `None` walks to the root of the page tree.
    pub max_inheritance_depth: Option<usize>,
}

impl CopyPolicy {
    /// Create a new policy with custom parameters.
    pub fn new(heal_cid_system_info: bool, detach_pages: bool, max_inheritance_depth: Option<usize>) -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            heal_cid_system_info,
            detach_pages,
            max_inheritance_depth,
        }
    }

    /// Policy that copies every node as-is: no healing, no page detachment.
    pub fn verbatim() -> Self {
        Self::new(false, false, None)
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Compute a hash of the policy parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for CopyPolicy {
    fn default() -> Self {
        Self::new(true, true, None)
    }
}
