//! Studio content documents and their persistence.

pub mod model;
pub mod store;

pub use model::{Block, BlockKind, CastMember, Chapter, Node, Studio};
pub use store::{
    DocumentStore, FilesystemDocumentStore, MemoryDocumentStore, StoreError,
};
