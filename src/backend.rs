use crate::error::Result;
use crate::types::{CalendarInfo, EventDraft};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Capability surface of the mirrored calendar service.
///
/// Command handlers only ever talk to the service through this trait, so
/// tests can swap in [`crate::testutils::FakeCalendar`] or the generated
/// mock instead of a live connection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Lists the calendars the connected credential can reach.
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>>;

    /// Creates an event and returns the provider's event id.
    async fn create_event(&self, calendar_id: &str, draft: &EventDraft) -> Result<String>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()>;
}
