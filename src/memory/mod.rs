//! In-memory collaborators used by the bundled server and tests.

pub mod notifier;
pub mod sessions;
pub mod tokens;
pub mod users;

pub use notifier::LogNotifier;
pub use sessions::{MemorySessionStore, SessionClass, SessionError};
pub use tokens::MemoryTokenIssuer;
pub use users::{MemoryUserStore, StoreError};
