//! Persistence for contact messages, projects, skills, blog posts, and
//! newsletter subscribers.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryContentStore;
pub use sqlite::SqliteStore;
