//! Device-side client for the timeline tracker: the HTTP client, a session
//! that remembers this device's identity, and text rendering for the CLI.

pub mod api;
pub mod render;
pub mod session;

pub use api::{ClientError, TrackerClient};
pub use session::Session;
