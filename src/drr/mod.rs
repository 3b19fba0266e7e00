mod config;
mod drr_arbiter;
#[cfg(not(test))]
mod ffi;
mod ledger;
mod rotation;
pub use config::*;
pub use drr_arbiter::*;
pub use ledger::CreditLedger;
pub use rotation::{Granted, RotationMask};

/// Credit/size unit of the deficit counters.
pub type Credit = u32;

pub const REQS: usize = 4;
pub const REF_QUANTUM: [Credit; REQS] = [600, 600, 600, 300];
pub const REF_PACKET_SIZE: [Credit; REQS] = [300, 600, 900, 300];
pub const REF_DEFICIT_CAP: [Credit; REQS] = [600, 600, 1200, 300];

pub const STATICS_TAR: &str = "drr";
