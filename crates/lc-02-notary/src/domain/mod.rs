//! Domain layer for the notary.

pub mod phase;
pub mod signature;
pub mod time_window;

pub use phase::{IllegalTransition, Notarisation, NotarisationPhase};
pub use signature::NotarySignature;
pub use time_window::check_time_window;
