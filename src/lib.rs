//! # Registrar
//!
//! Self-service account registration and password recovery.
//!
//! ## Registration
//!
//! `GET /register` returns a blank (or pre-filled) form and `POST /register`
//! submits it. Only the configured registration fields are taken from the
//! request; the submission is validated by the user store and any extra
//! checks registered as hooks or `beforeRegister` listeners. On success the
//! account is saved, the caller's session is elevated to the new account and
//! a `registerComplete` email is sent when the account has an address.
//!
//! Requests from a session that is already signed in, or made while
//! registration is disabled, are denied.
//!
//! ## Password recovery
//!
//! `POST /register/recover` looks the account up by username, then by email,
//! issues a single-use recovery token and mails the reset link.
//!
//! ## Storage
//!
//! The workflows talk to storage, sessions, mail and tokens through the traits
//! in [`registrar::ports`]. The [`memory`] module provides in-process
//! implementations used by the server binary and the tests.

pub mod api;
pub mod cli;
pub mod memory;
pub mod registrar;

pub const GIT_COMMIT_HASH: &str = env!("REGISTRAR_GIT_SHA");
