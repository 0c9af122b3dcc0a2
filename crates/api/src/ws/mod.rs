//! WebSocket infrastructure for real-time updates.
//!
//! Admin clients connect to `/api/v1/ws` and receive every domain event;
//! display players connect with `?screen_id=` and receive only events for
//! their screen. Events come from the [`EventBus`](signage_events::EventBus)
//! through [`EventRelay`].

mod handler;
mod heartbeat;
pub mod manager;
pub mod relay;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
pub use relay::EventRelay;
