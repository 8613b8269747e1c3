//! Episodic memory
//!
//! Append-only conversation log kept in a single-facet (`content`) vector
//! collection. Writes never block the response path; recall degrades to no
//! context when anything goes wrong.

mod recall;
mod writer;

pub use recall::{recall, RecalledEntry};
pub use writer::{build_entries, MemoryWriter};
