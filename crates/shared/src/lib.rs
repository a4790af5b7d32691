//! Shared utilities and common types for the Turnout backend.
//!
//! This crate provides functionality used across all other crates:
//! - Attendance capability tokens (HMAC-SHA256 signed, time-bound)
//! - Requester access token verification
//! - Common validation logic

pub mod attendance_token;
pub mod jwt;
pub mod validation;

pub use attendance_token::{
    AttendanceClaims, AttendanceTokenService, IssuedToken, TokenError, TokenKeyError,
};
