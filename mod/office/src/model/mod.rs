mod appointment;
mod client;
mod lawyer;
mod lead;
mod schedule;
mod settings;

pub use appointment::{
    Appointment, AppointmentStats, CreateAppointment, UpdateAppointment, APPOINTMENT_STATUSES,
};
pub use client::{Client, ClientStats, ClientSummary, CreateClient, UpdateClient};
pub use lawyer::{CreateLawyer, Lawyer, UpdateLawyer};
pub use lead::{CreateLead, Lead, LeadStats, UpdateLead, LEAD_STATUSES};
pub use schedule::{CreateScheduleEntry, ScheduleEntry, SCHEDULE_KINDS, SCHEDULE_STATUSES};
pub use settings::{Settings, UpdateSettings};
