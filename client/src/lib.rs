//! Connects the launchpad controller to the chain: capability traits for
//! reads, writes, receipts and notifications, the participant session that
//! sequences transactions, and an in-memory simulated fair auction.
mod capabilities;
mod config;
mod session;
pub mod sim;

pub use capabilities::*;
pub use config::{Deployment, LaunchpadConfig};
pub use session::{Participant, PreparedRequest};

pub use launchpad_controller as controller;
