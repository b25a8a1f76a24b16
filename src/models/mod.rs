mod account;
mod billing;
mod feedback;
mod organization;
mod waitlist;

pub use account::*;
pub use billing::*;
pub use feedback::*;
pub use organization::*;
pub use waitlist::*;
