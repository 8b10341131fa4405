pub mod blob;

pub use blob::BlobStore;
