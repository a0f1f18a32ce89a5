//! StoreSource implementations and client-side collaborators

pub mod bookmarks;
pub mod http;
pub mod in_memory;

pub use bookmarks::{BOOKMARKS_KEY, BookmarkSet};
pub use http::HttpStoreSource;
pub use in_memory::InMemoryStoreSource;
