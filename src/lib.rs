//! # portfolio-guard
//!
//! Compliance and session-guard core for a bilingual agency portfolio site.
//!
//! The crate covers four concerns that sit between the HTTP layer and the data store:
//! PII masking, structured JSON logging with an audit trail, consent and retention
//! checks for the contact form, and signed admin sessions gating `/api/admin` routes.

pub mod clock;
pub mod compliance;
pub mod config;
pub mod error;
pub mod http_server;
pub mod logging;
pub mod masking;
pub mod session;

pub use compliance::ComplianceEngine;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use logging::Logger;
pub use masking::{mask_pii, PiiMasker};
pub use session::{with_auth, SessionGuard};
