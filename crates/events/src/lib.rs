//! `jobpool-events`: outcome notification mechanics.
//!
//! A pool reports every finished job as a [`JobEvent`]. Consumers receive them
//! through an [`EventBus`] subscription; the bus itself knows nothing about pools.

pub mod bus;
pub mod envelope;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::JobEvent;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
