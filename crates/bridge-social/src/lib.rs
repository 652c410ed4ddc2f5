//! Connection graph, presence and direct messaging for AlumniBridge.
//!
//! Every operation takes the caller's account id explicitly; nothing here
//! reads request-scoped identity.

pub mod clock;
pub mod conversations;
pub mod directory;
pub mod error;
pub mod graph;
pub mod messaging;
pub mod presence;
pub mod realtime;

pub use clock::{Clock, ManualClock, SystemClock};
pub use conversations::ConversationAggregator;
pub use directory::Directory;
pub use error::{ErrorKind, SocialError};
pub use graph::{ConnectionGraph, ConnectionService, RequestParties};
pub use messaging::{MAX_CONTENT_CHARS, MessageStore, MessagingService};
pub use presence::{ONLINE_WINDOW_SECS, PresenceTracker};
pub use realtime::Publisher;
