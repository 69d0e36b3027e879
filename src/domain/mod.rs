pub mod bookmark;
pub mod query_key;

pub use bookmark::BookmarkEntry;
pub use query_key::{InvalidationTag, Namespace, QueryKey};
