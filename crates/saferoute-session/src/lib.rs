//! Async glue for saferoute: position feeds and the navigation
//! session task that owns the progress tracker.

pub mod feed;
pub mod session;

pub use feed::{FeedError, PositionFeed};
pub use session::{
    AnnouncementSink, NavigationSession, SessionCommand, SessionHandle, SessionOptions,
};
