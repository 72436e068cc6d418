// Phone-Verified Registration Service
//
// This crate implements a three-step enrollment flow: collect identity data,
// verify control of the phone number with a one-time passcode, then finalize
// the account with a password. Domain logic lives in domains/registration;
// infrastructure seams (messaging, provisioning, hashing, clock) live in kernel/.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
