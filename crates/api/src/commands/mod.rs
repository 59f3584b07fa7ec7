//! Commands - UI/IPC caller to backend bridge
//!
//! Every command returns a value shaped for the caller; failures are logged
//! and carried in the result instead of propagated.

mod orders;
mod reference;
mod settings;

pub use orders::*;
pub use reference::*;
pub use settings::*;
