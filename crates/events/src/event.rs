use chrono::{DateTime, Utc};

/// A document event.
///
/// Events are:
/// - **immutable** facts about a committed transition
/// - **versioned** (schema evolution)
/// - **append-only** within their document stream
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "purchasing.purchase.received").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the transition happened (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
