//! Typed events and the bus that delivers them

mod bus;
mod event;

pub use bus::{EventBus, EventHandler, ANY_EVENT};
pub use event::GatewayEvent;
