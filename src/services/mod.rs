pub mod messages;
pub mod notify;
pub mod requests;
pub mod transcribe;
pub mod uploads;
