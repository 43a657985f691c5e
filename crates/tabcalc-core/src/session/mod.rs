//! Session (tab) domain module.
//!
//! # Module Structure
//!
//! - `model`: One calculation context (`Session`)
//! - `store`: The ordered session collection with the active tab (`SessionStore`)
//! - `persister`: Persistence hook attached to the store (`StorePersister`)

mod model;
mod persister;
mod store;

pub use model::{DEFAULT_LABEL_HINT, DEFAULT_SESSION_LABEL, Session};
pub use persister::StorePersister;
pub use store::SessionStore;
