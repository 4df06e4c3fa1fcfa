//! `checkin` - Training attendance registration
//!
//! This library records attendees (name, ID number and a handwritten
//! signature) in a local item store and exports them as a PDF attendance
//! sheet.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod attendee;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod signature;
pub mod storage;
pub mod store;

pub use attendee::AttendeeRecord;
pub use capture::{submit, AttendeeForm, ImportedSignature, SignaturePad, SignatureSource};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use report::{Report, ReportBuilder};
pub use storage::{ItemStore, Storage};
pub use store::{AttendeeStore, Persisted};
