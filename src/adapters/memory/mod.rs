//! In-process store backend
//!
//! Implements both [`ClinicStore`](crate::adapters::database::ClinicStore) and
//! [`NoteStore`](crate::adapters::database::NoteStore) over `tokio` RwLock
//! maps. Data is lost on restart; used for development and tests.

pub mod store;

pub use store::MemoryStore;
