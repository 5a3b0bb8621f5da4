mod contact;
mod health_check;
mod preview;
pub use contact::*;
pub use health_check::*;
pub use preview::*;
