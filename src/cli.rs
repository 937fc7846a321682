use crate::backend::CalendarBackend;
use crate::clinic_manager::ClinicManager;
use crate::configuration::{ClinicConfig, ClinicPaths};
use crate::error::Result;
use crate::google::GoogleCalendar;
use crate::store::BookingStore;
use crate::types::{CalendarInfo, Slot, SlotStatus};
use crate::validation::{parse_date, parse_time, validate_args};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use validator::Validate;

const BANNER_WIDTH: usize = 70;

#[derive(Parser)]
#[command(name = "coding_clinic", version, about = "Book and volunteer for coding clinic slots")]
pub struct Cli {
    /// Directory holding bookings.json, clinic_config.json and secrets/
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the student and clinic calendar identifiers
    Setup(SetupArgs),
    /// Show slots, optionally filtered by date or status
    View(ViewArgs),
    /// Offer a 30 minute slot as a volunteer
    Volunteer(VolunteerArgs),
    /// Book an available slot
    Book(BookArgs),
    /// Cancel a booked session
    CancelBooking(CancelArgs),
    /// Withdraw an offered slot
    CancelVolunteer(CancelArgs),
    /// List the calendars the connected credential can reach
    Calendars,
}

#[derive(Args)]
struct SetupArgs {
    /// Student calendar identifier
    #[arg(long)]
    student: String,

    /// Clinic calendar identifier
    #[arg(long)]
    clinic: String,
}

#[derive(Args)]
struct ViewArgs {
    /// Only show slots on this date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Only show slots with this status
    #[arg(long, value_enum)]
    status: Option<SlotStatus>,
}

#[derive(Args, Validate)]
struct VolunteerArgs {
    /// Slot date (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    /// Slot start time (HH:MM)
    #[arg(long)]
    time: String,

    /// Volunteer display name
    #[arg(long)]
    name: String,

    /// Volunteer email address
    #[arg(long)]
    #[validate(email(message = "is not a valid email address"))]
    email: String,
}

#[derive(Args, Validate)]
struct BookArgs {
    /// Slot date (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    /// Slot start time (HH:MM)
    #[arg(long)]
    time: String,

    /// Topic you need help with
    #[arg(long)]
    subject: String,

    /// What you want to cover in the session
    #[arg(long)]
    description: String,

    /// Your email address
    #[arg(long)]
    #[validate(email(message = "is not a valid email address"))]
    email: String,
}

#[derive(Args, Validate)]
struct CancelArgs {
    /// Slot date (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    /// Slot start time (HH:MM)
    #[arg(long)]
    time: String,

    /// Your email address
    #[arg(long)]
    #[validate(email(message = "is not a valid email address"))]
    email: String,
}

pub async fn run() -> Result<()> {
    run_command(Cli::parse()).await
}

async fn run_command(cli: Cli) -> Result<()> {
    let paths = ClinicPaths::resolve(cli.data_dir);
    let store = BookingStore::new(paths.bookings_file());

    // Viewing only reads the ledger, no calendar connection needed.
    if let Commands::View(args) = &cli.command {
        let date = args.date.as_deref().map(parse_date).transpose()?;
        banner("CODING CLINIC CALENDAR");
        render_slots(&store.list(date, args.status)?);
        return Ok(());
    }

    let config = ClinicConfig::load(&paths.config_file())?;
    let calendar = GoogleCalendar::connect(&paths.token_file()).await?;
    let mut manager = ClinicManager::new(store, calendar, config, paths.config_file());
    dispatch(cli.command, &mut manager).await
}

async fn dispatch<C: CalendarBackend>(
    command: Commands,
    manager: &mut ClinicManager<C>,
) -> Result<()> {
    match command {
        Commands::Setup(args) => {
            banner("SETTING UP CODING CLINIC BOOKING SYSTEM");
            manager.setup(&args.student, &args.clinic).await?;
            println!("Student calendar: {}", args.student);
            println!("Clinic calendar: {}", args.clinic);
            println!("Configuration saved");
            Ok(())
        }
        Commands::Volunteer(args) => {
            validate_args(&args)?;
            let date = parse_date(&args.date)?;
            let time = parse_time(&args.time)?;
            banner("VOLUNTEERING FOR SLOT");
            let slot = manager.volunteer(date, time, &args.name, &args.email).await?;
            println!("Created available slot");
            println!("Date: {}", slot.date);
            println!("Time: {}", slot.time.format("%H:%M"));
            println!("Calendar invitation sent to {}", slot.volunteer_email);
            Ok(())
        }
        Commands::Book(args) => {
            validate_args(&args)?;
            let date = parse_date(&args.date)?;
            let time = parse_time(&args.time)?;
            banner("BOOKING SESSION");
            let slot = manager
                .book(date, time, &args.subject, &args.description, &args.email)
                .await?;
            println!("Booked session with {}", slot.volunteer_name);
            println!("Date: {}", slot.date);
            println!("Time: {}", slot.time.format("%H:%M"));
            println!("Subject: {}", args.subject);
            println!("Calendar invitations sent to both participants");
            Ok(())
        }
        Commands::CancelBooking(args) => {
            validate_args(&args)?;
            let date = parse_date(&args.date)?;
            let time = parse_time(&args.time)?;
            banner("CANCELING BOOKING");
            let slot = manager.cancel_booking(date, time, &args.email).await?;
            println!("Booking cancelled, the slot is available again");
            println!("Date: {}", slot.date);
            println!("Time: {}", slot.time.format("%H:%M"));
            println!("Volunteer: {}", slot.volunteer_name);
            Ok(())
        }
        Commands::CancelVolunteer(args) => {
            validate_args(&args)?;
            let date = parse_date(&args.date)?;
            let time = parse_time(&args.time)?;
            banner("CANCELING VOLUNTEER SLOT");
            let removed = manager.cancel_volunteer(date, time, &args.email).await?;
            println!("Volunteer slot removed");
            println!("Date: {}", removed.date);
            println!("Time: {}", removed.time.format("%H:%M"));
            Ok(())
        }
        Commands::Calendars => {
            banner("AVAILABLE CALENDARS");
            render_calendars(&manager.calendars().await?);
            Ok(())
        }
        Commands::View(_) => unreachable!("handled before the calendar connection"),
    }
}

fn banner(title: &str) {
    println!();
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("{title}");
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!();
}

fn render_slots(slots: &[Slot]) {
    if slots.is_empty() {
        println!("No slots found");
        return;
    }
    let mut by_date: BTreeMap<NaiveDate, Vec<&Slot>> = BTreeMap::new();
    for slot in slots {
        by_date.entry(slot.date).or_default().push(slot);
    }
    for (date, day_slots) in &by_date {
        println!("{}", date.format("%A, %B %d, %Y"));
        println!("{}", "-".repeat(BANNER_WIDTH));
        for slot in day_slots {
            println!(
                "{} - {}",
                slot.time.format("%H:%M"),
                slot.status.to_string().to_uppercase()
            );
            println!("    Volunteer: {}", slot.volunteer_name);
            if slot.status == SlotStatus::Booked {
                if let Some(student) = &slot.student_email {
                    println!("    Student: {student}");
                }
                if let Some(subject) = &slot.subject {
                    println!("    Subject: {subject}");
                }
            }
            println!();
        }
    }
    let available = slots
        .iter()
        .filter(|slot| slot.status == SlotStatus::Available)
        .count();
    let booked = slots
        .iter()
        .filter(|slot| slot.status == SlotStatus::Booked)
        .count();
    println!("{}", "-".repeat(BANNER_WIDTH));
    println!(
        "Summary: {available} available | {booked} booked | {} total",
        slots.len()
    );
}

fn render_calendars(calendars: &[CalendarInfo]) {
    println!("Found {} calendar(s)", calendars.len());
    println!();
    for calendar in calendars {
        println!("{}", calendar.summary);
        println!("ID: {}", calendar.id);
        if calendar.primary {
            println!("(primary calendar)");
        }
        println!();
    }
}
