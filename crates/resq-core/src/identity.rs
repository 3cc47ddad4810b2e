//! Node and message identities

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a device in the mesh
///
/// Ordered lexicographically; routing and classification tie-breaks rely on
/// this ordering being stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique identifier for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::generate()
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form keeps log lines readable
        let simple = self.0.simple().to_string();
        write!(f, "msg-{}", &simple[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_ordering_is_lexicographic() {
        let mut ids = vec![NodeId::from("C"), NodeId::from("A"), NodeId::from("B")];
        ids.sort();
        assert_eq!(ids, vec![NodeId::from("A"), NodeId::from("B"), NodeId::from("C")]);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new("relay-7")), "relay-7");
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("msg-"));
        assert_eq!(a.to_string().len(), "msg-".len() + 8);
    }
}
