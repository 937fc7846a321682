use crate::backend::CalendarBackend;
use crate::error::{ClinicError, Result};
use crate::types::{CalendarInfo, EventDraft};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub calendar_id: String,
    pub draft: EventDraft,
    pub event_id: String,
}

pub struct FakeCalendarInner {
    pub create_succeeds: AtomicBool,
    pub delete_succeeds: AtomicBool,
    pub list_succeeds: AtomicBool,
    pub calls_to_list_calendars: AtomicU64,
    pub calls_to_create_event: AtomicU64,
    pub calls_to_delete_event: AtomicU64,
    pub calendars: Mutex<Vec<CalendarInfo>>,
    pub created: Mutex<Vec<RecordedEvent>>,
    pub deleted: Mutex<Vec<(String, String)>>,
}

/// In-memory stand-in for the calendar service.
///
/// Records every call so tests can assert on the mirrored traffic, and can
/// be flipped into failure mode per operation.
#[derive(Clone)]
pub struct FakeCalendar(pub Arc<FakeCalendarInner>);

impl FakeCalendar {
    pub fn new() -> Self {
        Self(Arc::new(FakeCalendarInner {
            create_succeeds: AtomicBool::new(true),
            delete_succeeds: AtomicBool::new(true),
            list_succeeds: AtomicBool::new(true),
            calls_to_list_calendars: AtomicU64::default(),
            calls_to_create_event: AtomicU64::default(),
            calls_to_delete_event: AtomicU64::default(),
            calendars: Mutex::default(),
            created: Mutex::default(),
            deleted: Mutex::default(),
        }))
    }

    pub fn with_calendars(calendars: Vec<CalendarInfo>) -> Self {
        let fake = Self::new();
        *fake.0.calendars.lock().unwrap() = calendars;
        fake
    }

    pub fn created(&self) -> Vec<RecordedEvent> {
        self.0.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.0.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarBackend for FakeCalendar {
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>> {
        self.0.calls_to_list_calendars.fetch_add(1, Ordering::SeqCst);
        if !self.0.list_succeeds.load(Ordering::SeqCst) {
            return Err(ClinicError::Remote("calendar service unavailable".to_string()));
        }
        Ok(self.0.calendars.lock().unwrap().clone())
    }

    async fn create_event(&self, calendar_id: &str, draft: &EventDraft) -> Result<String> {
        self.0.calls_to_create_event.fetch_add(1, Ordering::SeqCst);
        if !self.0.create_succeeds.load(Ordering::SeqCst) {
            return Err(ClinicError::Remote("event creation refused".to_string()));
        }
        let event_id = Uuid::new_v4().to_string();
        self.0.created.lock().unwrap().push(RecordedEvent {
            calendar_id: calendar_id.to_string(),
            draft: draft.clone(),
            event_id: event_id.clone(),
        });
        Ok(event_id)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        self.0.calls_to_delete_event.fetch_add(1, Ordering::SeqCst);
        if !self.0.delete_succeeds.load(Ordering::SeqCst) {
            return Err(ClinicError::Remote("event deletion refused".to_string()));
        }
        self.0
            .deleted
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), event_id.to_string()));
        Ok(())
    }
}
