//! Network-layer packets: Interest, Data and Nack

use std::fmt::{self, Display};
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::name::Name;

/// Reserved marker for the mobility acknowledgment
///
/// Used both as the Data content type of an ack and as the forwarding-hint
/// preference that flags the rendezvous delegation.
pub const KITE_ACK: u64 = 6;

/// Interest lifetime when the requester does not set one
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_secs(4);

/// One entry of a forwarding hint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delegation {
    pub preference: u64,
    pub name: Name,
}

impl Delegation {
    /// Create a delegation
    pub fn new(preference: u64, name: Name) -> Self {
        Self { preference, name }
    }

    /// Create the delegation that marks `rv_name` as the mobility rendezvous
    pub fn mobility(rv_name: Name) -> Self {
        Self::new(KITE_ACK, rv_name)
    }
}

/// Ordered delegation list carried by an Interest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingHint {
    delegations: Vec<Delegation>,
}

impl ForwardingHint {
    /// Create an empty hint
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delegation, keeping insertion order
    pub fn push(&mut self, delegation: Delegation) {
        self.delegations.push(delegation);
    }

    /// Iterate delegations in order
    pub fn iter(&self) -> impl Iterator<Item = &Delegation> {
        self.delegations.iter()
    }

    pub fn len(&self) -> usize {
        self.delegations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegations.is_empty()
    }

    /// First delegation whose preference equals `preference`
    pub fn find_preference(&self, preference: u64) -> Option<&Delegation> {
        self.delegations.iter().find(|d| d.preference == preference)
    }

    /// The mobility rendezvous hint, if present
    pub fn mobility_hint(&self) -> Option<&Delegation> {
        self.find_preference(KITE_ACK)
    }
}

impl From<Vec<Delegation>> for ForwardingHint {
    fn from(delegations: Vec<Delegation>) -> Self {
        Self { delegations }
    }
}

/// A named request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    pub forwarding_hint: ForwardingHint,
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
    pub hop_limit: Option<u8>,
    pub lifetime: Duration,
    pub nonce: u32,
    pub application_parameters: Option<Bytes>,
}

impl Interest {
    /// Create an Interest with a random nonce and default lifetime
    pub fn new(name: Name) -> Self {
        Self {
            name,
            forwarding_hint: ForwardingHint::new(),
            can_be_prefix: false,
            must_be_fresh: false,
            hop_limit: None,
            lifetime: DEFAULT_INTEREST_LIFETIME,
            nonce: rand::random(),
            application_parameters: None,
        }
    }

    pub fn with_forwarding_hint(mut self, hint: ForwardingHint) -> Self {
        self.forwarding_hint = hint;
        self
    }

    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    pub fn with_hop_limit(mut self, hop_limit: u8) -> Self {
        self.hop_limit = Some(hop_limit);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_application_parameters(mut self, parameters: Bytes) -> Self {
        self.application_parameters = Some(parameters);
        self
    }

    /// Whether `data` satisfies this Interest
    pub fn matches_data(&self, data: &Data) -> bool {
        if self.can_be_prefix {
            self.name.is_prefix_of(&data.name)
        } else {
            self.name == data.name
        }
    }
}

impl Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?Nonce={:08x}", self.name, self.nonce)
    }
}

/// Data content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Blob,
    Link,
    Key,
    Nack,
    PrefixAnn,
    KiteAck,
    Other(u64),
}

impl ContentType {
    /// Numeric TLV value
    pub fn code(self) -> u64 {
        match self {
            Self::Blob => 0,
            Self::Link => 1,
            Self::Key => 2,
            Self::Nack => 3,
            Self::PrefixAnn => 5,
            Self::KiteAck => KITE_ACK,
            Self::Other(code) => code,
        }
    }

    /// Map a numeric TLV value to a content type
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Blob,
            1 => Self::Link,
            2 => Self::Key,
            3 => Self::Nack,
            5 => Self::PrefixAnn,
            KITE_ACK => Self::KiteAck,
            other => Self::Other(other),
        }
    }
}

/// A named response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,
    pub content_type: ContentType,
    pub freshness: Duration,
    pub content: Bytes,
}

impl Data {
    /// Create a Blob data packet
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content_type: ContentType::Blob,
            freshness: Duration::ZERO,
            content: content.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }
}

/// Reason carried by a NACK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NackReason {
    /// No reason recorded yet
    #[default]
    None,
    Congestion,
    Duplicate,
    NoRoute,
}

impl NackReason {
    /// Numeric value on the wire
    pub fn code(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Congestion => 50,
            Self::Duplicate => 100,
            Self::NoRoute => 150,
        }
    }

    /// Whether `self` is less severe than `other`
    ///
    /// Severity grows Congestion < Duplicate < NoRoute. `None` is a
    /// placeholder that every real reason beats.
    pub fn is_less_severe(self, other: NackReason) -> bool {
        match (self, other) {
            (Self::None, _) => false,
            (_, Self::None) => true,
            (a, b) => a.code() < b.code(),
        }
    }
}

impl Display for NackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Congestion => write!(f, "Congestion"),
            Self::Duplicate => write!(f, "Duplicate"),
            Self::NoRoute => write!(f, "NoRoute"),
        }
    }
}

/// A negative acknowledgment for an Interest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nack {
    pub interest: Interest,
    pub reason: NackReason,
}

impl Nack {
    pub fn new(interest: Interest, reason: NackReason) -> Self {
        Self { interest, reason }
    }
}
