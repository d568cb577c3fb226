//! Stamping pass, PDF commit and image resources

pub mod overlay;
pub mod pdf;
pub mod resources;

pub use overlay::{stamp, stamp_all, Deferred, DrawOp, PageRecord, StampContext, StampedPage};
pub use pdf::{write_pdf, DocumentInfo};
pub use resources::{DirectoryResources, MemoryResources, ResourceLookup};
