//! Backend of the portfolio site's contact form, plus the state machine that
//! drives the form itself.
//!
//! API endpoints:
//! - `GET /api/health`
//! - `POST /api/contact`
//! - `GET /api/preview/{id}` (sandbox transport only)

pub mod configuration;
pub mod contact_form;
pub mod delivery;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
