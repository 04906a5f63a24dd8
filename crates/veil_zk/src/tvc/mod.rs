//! Temporal Visual Code
//!
//! A device transmits a secret nonce and a time slot as a brightness signal;
//! a receiver decodes it and proves it captured a code close to "now".

pub mod proof;
pub mod signal;

pub use proof::{prove_reception, verify_reception, ReceptionInputs};
pub use signal::{TvcCodec, SIGNAL_SYMBOLS, SYNC_HEADER};
