pub mod arbiter;
pub mod bitmap;
pub mod drr;
#[cfg(not(test))]
mod ffi;
pub mod logger;
pub mod selector;
pub mod sim;
