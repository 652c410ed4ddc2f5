use bridge_types::events::GatewayEvent;
use bridge_types::models::AccountId;

/// Fire-and-forget push to a per-account logical channel.
///
/// Implementations must not block and must not fail: an event for an account
/// with no live subscription is dropped, and the caller learns that only
/// through the return value.
pub trait Publisher: Send + Sync {
    /// Returns true if a subscriber took the event.
    fn publish(&self, channel: AccountId, event: GatewayEvent) -> bool;
}
