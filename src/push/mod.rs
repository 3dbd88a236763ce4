pub mod coordinator;
pub mod machine;
pub mod protocol;

pub use coordinator::PushCoordinator;
pub use machine::{ConnectionMachine, LinkAction, LinkEvent, LinkState};
pub use protocol::{parse_frame, PushNotification};
