//! Paginated feed over the remote catalog with an offline fallback.

pub mod controller;

pub use controller::{FeedController, FeedPhase, FeedTicket, FeedUpdate};
