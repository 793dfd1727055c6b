//! `vbsutil` support: command-line argument parsing and the display-level
//! logging plumbing the discovery engine uses to report non-silent
//! enumeration errors.

pub mod args;
pub mod constants;
