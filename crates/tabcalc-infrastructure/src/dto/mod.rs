//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs mirror the JSON documents stored in key-value storage. They are
//! private to the infrastructure layer and handle the evolution of the storage
//! format over time.
//!
//! ### Store Version History
//! - **1.0.0**: Flat layout. One history array under `calc-history` and one
//!   scope object under `calc-scope`.
//! - **1.1.0**: Sessioned layout. `{"tabs": [...], "activeTab": n}` under
//!   `calculator`.
//!
//! History items keep the field names of the first release (`error`,
//! `original`, `expression`, `TeX`, `result`) so that older data decodes
//! unchanged.

mod history;
mod store;
mod value;

pub use history::{ErrorFlagDto, HistoryItemDto};
pub use store::{FlatLayoutV1_0_0, SessionStoreDTO, SessionStoreV1_1_0, TabV1_1_0, encode_store};
pub use value::{ScopeDto, decode_scope, decode_value, encode_scope, encode_value};
