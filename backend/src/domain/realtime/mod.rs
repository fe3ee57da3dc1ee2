//! Real-time fan-out: connections, rooms and the events that flow through them.

mod events;
mod hub;
mod policy;
mod registry;

pub use events::{
    CONNECTED_MESSAGE, ClientEvent, ConnectionId, DASHBOARD_ROOM, DEFAULT_ROOM, ROOM_NAME_MAX,
    RoomName, ServerEvent,
};
pub use hub::RealtimeHub;
pub use policy::{RoomPolicy, RoomPolicyParseError};
pub use registry::{
    ANONYMOUS, Connection, ConnectionInfo, ConnectionRegistry, DEFAULT_OUTBOX_CAPACITY, Delivery,
};
