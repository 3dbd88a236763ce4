pub mod dispatcher;
pub mod fetcher;
pub mod poller;

pub use dispatcher::{Dispatcher, Notice};
pub use fetcher::{Synchronizer, Trigger};
pub use poller::Poller;
