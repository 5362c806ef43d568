//! Live book snapshots: a last-write-wins store and the polling task feeding it.

pub mod connection;
pub mod poller;
pub mod store;

pub use connection::{ConnectionState, FeedEvent};
pub use poller::BookFeed;
pub use store::BookStore;
