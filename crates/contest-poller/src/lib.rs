//! Mirror upcoming Codeforces rounds into a Google Calendar.
//!
//! One pass fetches the public contest list, then reconciles each
//! scheduled contest against the calendar under a deterministic event
//! id, so running the binary twice leaves the calendar unchanged.

pub mod auth;
pub mod calendar;
pub mod codeforces;
pub mod config;
pub mod sync;
