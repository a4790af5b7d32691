//! Delivery gateways backing the engine's notification ports.

pub mod email;
pub mod notification;

pub use email::{EmailError, EmailService};
pub use notification::OutboxNotifier;
