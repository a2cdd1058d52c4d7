//! Message identifier type

use std::fmt;

/// 16-bit correlation key linking a sent command to its eventual response.
///
/// Ids are assigned by the sender and echoed back by the server. Within one
/// session they are issued strictly increasing starting at
/// [`MessageId::FIRST`], wrapping past `u16::MAX` and never taking the
/// value 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u16);

impl MessageId {
    /// Create a new message ID
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// The first id assigned in a session (used by the login command)
    pub const FIRST: MessageId = MessageId(1);
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

impl From<u16> for MessageId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_display() {
        let id = MessageId::new(7);
        assert_eq!(format!("{}", id), "msg-7");
    }

    #[test]
    fn test_message_id_equality() {
        let id1 = MessageId::new(1);
        let id2 = MessageId::new(1);
        let id3 = MessageId::new(2);

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }
}
