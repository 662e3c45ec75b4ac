//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod firestore;
pub mod gcs;
pub mod gemini;
pub mod google_auth;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use firestore::FirestoreContentStore;
pub use gcs::GcsBlobStore;
pub use gemini::GeminiVisionModel;
pub use google_auth::{MetadataTokenProvider, StaticTokenProvider};
pub use traits::{
    BaseBlobStore, BaseContentStore, BaseTokenProvider, BaseVisionModel, RecordVersion,
};
