use crate::backend::CalendarBackend;
use crate::configuration::ClinicConfig;
use crate::error::{ClinicError, Result};
use crate::store::BookingStore;
use crate::types::{CalendarInfo, EventDraft, Slot, SlotStatus};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::path::PathBuf;
use tracing::{info, warn};

const SLOT_MINUTES: i64 = 30;

/// Command handlers tying the slot ledger to the mirrored calendar.
///
/// Mirror writes happen before the ledger is touched: a failed event
/// creation aborts the command and leaves the ledger as it was. Removing
/// a superseded event is best effort.
pub struct ClinicManager<C: CalendarBackend> {
    store: BookingStore,
    calendar: C,
    config: ClinicConfig,
    config_path: PathBuf,
}

impl<C: CalendarBackend> ClinicManager<C> {
    pub fn new(
        store: BookingStore,
        calendar: C,
        config: ClinicConfig,
        config_path: PathBuf,
    ) -> Self {
        Self {
            store,
            calendar,
            config,
            config_path,
        }
    }

    /// Validates both calendar identifiers against the credential's
    /// calendar list and saves them.
    pub async fn setup(&mut self, student_calendar: &str, clinic_calendar: &str) -> Result<()> {
        let calendars = self.calendar.list_calendars().await?;
        ensure_known_calendar("student", student_calendar, &calendars)?;
        ensure_known_calendar("clinic", clinic_calendar, &calendars)?;
        self.config.student_calendar = Some(student_calendar.to_string());
        self.config.clinic_calendar = Some(clinic_calendar.to_string());
        self.config.save(&self.config_path)?;
        info!("Calendar configuration saved to {}", self.config_path.display());
        Ok(())
    }

    pub async fn calendars(&self) -> Result<Vec<CalendarInfo>> {
        self.calendar.list_calendars().await
    }

    /// Offers a new slot and mirrors it as an availability event.
    pub async fn volunteer(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        name: &str,
        email: &str,
    ) -> Result<Slot> {
        if let Some(existing) = self.store.find(date, time)? {
            if existing.volunteer_email == email {
                return Err(ClinicError::DuplicateSlot(format!(
                    "you already volunteered for {} at {}",
                    date,
                    time.format("%H:%M")
                )));
            }
            return Err(ClinicError::DuplicateSlot(format!(
                "slot {} at {} already has volunteer {}",
                date,
                time.format("%H:%M"),
                existing.volunteer_name
            )));
        }
        let clinic_calendar = self.config.require_clinic_calendar()?;
        let draft = availability_draft(date, time, name, email);
        let event_id = self.calendar.create_event(clinic_calendar, &draft).await?;
        let slot = Slot {
            date,
            time,
            status: SlotStatus::Available,
            volunteer_name: name.to_string(),
            volunteer_email: email.to_string(),
            student_email: None,
            subject: None,
            description: None,
            booked_at: None,
            event_id: Some(event_id),
        };
        self.store.insert(slot.clone())?;
        info!("Volunteer slot stored for {} at {}", date, time.format("%H:%M"));
        Ok(slot)
    }

    /// Books an available slot. The availability event is replaced by a
    /// session event carrying both participants.
    pub async fn book(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        subject: &str,
        description: &str,
        student_email: &str,
    ) -> Result<Slot> {
        let slot = self
            .store
            .find(date, time)?
            .ok_or_else(|| no_bookable_slot(date, time))?;
        if slot.status == SlotStatus::Booked {
            return Err(ClinicError::Validation(format!(
                "slot {} at {} is already booked by {}",
                date,
                time.format("%H:%M"),
                slot.student_email.as_deref().unwrap_or("another student")
            )));
        }
        let clinic_calendar = self.config.require_clinic_calendar()?;
        self.discard_event(clinic_calendar, slot.event_id.as_deref()).await;
        let draft = session_draft(&slot, subject, description, student_email);
        let event_id = self.calendar.create_event(clinic_calendar, &draft).await?;
        let updated = self.store.update(date, time, |slot| {
            slot.status = SlotStatus::Booked;
            slot.student_email = Some(student_email.to_string());
            slot.subject = Some(subject.to_string());
            slot.description = Some(description.to_string());
            slot.booked_at = Some(Local::now().naive_local());
            slot.event_id = Some(event_id);
        })?;
        info!("Booked {} at {} for {}", date, time.format("%H:%M"), student_email);
        Ok(updated)
    }

    /// Cancels a booking and restores the slot's availability event.
    pub async fn cancel_booking(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        student_email: &str,
    ) -> Result<Slot> {
        let slot = self
            .store
            .find(date, time)?
            .ok_or_else(|| no_slot(date, time))?;
        if slot.status != SlotStatus::Booked {
            return Err(ClinicError::Validation(format!(
                "slot {} at {} is not booked",
                date,
                time.format("%H:%M")
            )));
        }
        if slot.student_email.as_deref() != Some(student_email) {
            return Err(ClinicError::Validation(format!(
                "only the student who booked {} at {} can cancel it",
                date,
                time.format("%H:%M")
            )));
        }
        let clinic_calendar = self.config.require_clinic_calendar()?;
        self.discard_event(clinic_calendar, slot.event_id.as_deref()).await;
        let draft = availability_draft(date, time, &slot.volunteer_name, &slot.volunteer_email);
        let event_id = self.calendar.create_event(clinic_calendar, &draft).await?;
        let updated = self.store.update(date, time, |slot| {
            slot.status = SlotStatus::Available;
            slot.student_email = None;
            slot.subject = None;
            slot.description = None;
            slot.booked_at = None;
            slot.event_id = Some(event_id);
        })?;
        info!("Cancelled booking for {} at {}", date, time.format("%H:%M"));
        Ok(updated)
    }

    /// Withdraws an available slot and removes its mirrored event.
    pub async fn cancel_volunteer(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        volunteer_email: &str,
    ) -> Result<Slot> {
        let slot = self
            .store
            .find(date, time)?
            .ok_or_else(|| no_slot(date, time))?;
        if slot.volunteer_email != volunteer_email {
            return Err(ClinicError::Validation(format!(
                "only the volunteer who offered {} at {} can withdraw it",
                date,
                time.format("%H:%M")
            )));
        }
        if slot.status == SlotStatus::Booked {
            return Err(ClinicError::Validation(format!(
                "slot {} at {} is booked by {}, ask them to cancel the booking first",
                date,
                time.format("%H:%M"),
                slot.student_email.as_deref().unwrap_or("a student")
            )));
        }
        let clinic_calendar = self.config.require_clinic_calendar()?;
        self.discard_event(clinic_calendar, slot.event_id.as_deref()).await;
        let removed = self.store.remove(date, time)?;
        info!("Withdrew volunteer slot {} at {}", date, time.format("%H:%M"));
        Ok(removed)
    }

    /// Best-effort removal of a superseded event.
    async fn discard_event(&self, calendar_id: &str, event_id: Option<&str>) {
        let Some(event_id) = event_id else {
            return;
        };
        if let Err(error) = self.calendar.delete_event(calendar_id, event_id).await {
            warn!("Could not remove mirrored event {event_id}: {error}");
        }
    }
}

fn ensure_known_calendar(kind: &str, id: &str, calendars: &[CalendarInfo]) -> Result<()> {
    if calendars.iter().any(|calendar| calendar.id == id) {
        return Ok(());
    }
    let mut message = format!("{kind} calendar '{id}' not found, available calendars:");
    for calendar in calendars {
        message.push_str(&format!("\n  {}: {}", calendar.summary, calendar.id));
    }
    Err(ClinicError::Validation(message))
}

fn no_slot(date: NaiveDate, time: NaiveTime) -> ClinicError {
    ClinicError::NotFound(format!("no slot for {} at {}", date, time.format("%H:%M")))
}

fn no_bookable_slot(date: NaiveDate, time: NaiveTime) -> ClinicError {
    ClinicError::NotFound(format!(
        "no slot for {} at {}, run 'view' to see available slots",
        date,
        time.format("%H:%M")
    ))
}

fn slot_window(date: NaiveDate, time: NaiveTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(time);
    (start, start + Duration::minutes(SLOT_MINUTES))
}

fn availability_draft(date: NaiveDate, time: NaiveTime, name: &str, email: &str) -> EventDraft {
    let (start, end) = slot_window(date, time);
    EventDraft {
        summary: format!("Coding Clinic - Available (Volunteer: {name})"),
        description: format!("Volunteer: {name} ({email})"),
        start,
        end,
        attendees: vec![email.to_string()],
    }
}

fn session_draft(slot: &Slot, subject: &str, description: &str, student_email: &str) -> EventDraft {
    let (start, end) = slot_window(slot.date, slot.time);
    EventDraft {
        summary: format!("Coding Clinic: {subject}"),
        description: format!(
            "Subject: {subject}\n\nDescription: {description}\n\nStudent: {student_email}\nVolunteer: {} ({})",
            slot.volunteer_name, slot.volunteer_email
        ),
        start,
        end,
        attendees: vec![student_email.to_string(), slot.volunteer_email.clone()],
    }
}
