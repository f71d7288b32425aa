//! Pub/sub for simulation events
//!
//! ```text
//! ┌────────────┐  CourtObserver  ┌──────────────────┐     ┌─────────────┐
//! │ Simulation │───────────────▶│ EventBusObserver │────▶│  EventBus   │──▶ subscribers
//! └────────────┘                 └──────────────────┘     └─────────────┘
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventBusObserver, SharedEventBus};
pub use types::CourtEvent;
