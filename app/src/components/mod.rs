//! UI Components
//!
//! Page-level components built on the loading and consent contexts.

pub mod status_line;
pub mod story_feed;

pub use status_line::StatusLine;
pub use story_feed::StoryFeed;
