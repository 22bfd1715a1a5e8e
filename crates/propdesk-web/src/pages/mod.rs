//! Routed pages

pub mod forgot_password;
pub mod listings;
pub mod login;
pub mod not_found;
pub mod otp;
pub mod reset_password;
