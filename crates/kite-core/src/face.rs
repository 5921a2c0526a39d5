//! Face identifiers and scope

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Identifier of a link (face) attached to the forwarder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u64);

impl Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face#{}", self.0)
    }
}

/// Whether a face reaches applications on this host or a remote node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FaceScope {
    /// Application face on the local host
    Local,
    /// Link to another forwarder
    #[default]
    NonLocal,
}

/// A face as seen by the strategy: identity plus scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face {
    pub id: FaceId,
    pub scope: FaceScope,
}

impl Face {
    /// Create a face
    pub fn new(id: FaceId, scope: FaceScope) -> Self {
        Self { id, scope }
    }

    /// Create a non-local face (link to another forwarder)
    pub fn remote(id: u64) -> Self {
        Self::new(FaceId(id), FaceScope::NonLocal)
    }

    /// Create a local application face
    pub fn local(id: u64) -> Self {
        Self::new(FaceId(id), FaceScope::Local)
    }

    /// Whether this face is local to the host
    pub fn is_local(&self) -> bool {
        self.scope == FaceScope::Local
    }
}
