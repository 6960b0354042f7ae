//! The process-wide state mirror.
//!
//! One [`MirrorService`] exists per server process. It owns the bounded
//! state maps, the leaderboard, and the event bus; all mutation flows
//! through its update listener, and everything else reads. The service is
//! constructed explicitly and injected into whatever serves requests —
//! there is no module-level global.

pub mod attestation;
pub mod config;
pub mod error;
pub mod service;
pub mod snapshot;

pub use attestation::{AttestationLookup, DisabledLookup, HttpAttestationClient, LookupError};
pub use config::MirrorConfig;
pub use error::MirrorError;
pub use service::MirrorService;
