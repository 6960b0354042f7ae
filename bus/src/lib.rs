//! In-process topic-based event bus.
//!
//! Every topic is backed by a `tokio::sync::broadcast` channel. Subscribing
//! returns the receiver itself — dropping it removes the listener, so
//! teardown is structural rather than convention-based and a forgotten
//! unsubscribe cannot leak. A periodic monitor still samples listener
//! counts per topic as a diagnostic for handler accumulation.

pub mod bus;
pub mod monitor;

pub use bus::{BusEvent, EventBus};
pub use monitor::spawn_listener_monitor;
