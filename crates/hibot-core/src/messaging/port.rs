use async_trait::async_trait;

use crate::{
    domain::{MessageRef, UserId},
    messaging::types::OutboundMessage,
    Result,
};

/// Outbound messaging port.
///
/// Implementations must map "message/channel no longer exists" failures to
/// [`crate::Error::NotFound`] so callers can ignore stale-reference races.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a direct message to a user. Fails with a gateway error when the
    /// recipient has DMs disabled; callers treat that as transient.
    async fn send_dm(&self, user: UserId, message: &OutboundMessage) -> Result<MessageRef>;

    /// Send a message in `target`'s channel as an inline reply to it.
    async fn send_reply(&self, target: MessageRef, message: &OutboundMessage)
        -> Result<MessageRef>;

    async fn edit_message(&self, msg: MessageRef, message: &OutboundMessage) -> Result<()>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;
}
