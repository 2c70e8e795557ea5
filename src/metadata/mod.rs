//! metadata.txt parsing and tag resolution.
//!
//! Both halves are pure: the parser turns override text into an
//! [`document::OverrideDocument`], the resolver reconciles it against the
//! actual file listing into one [`resolve::ResolvedTags`] per file. All
//! file system access stays with the callers.

pub mod document;
pub mod error;
pub mod resolve;

pub use document::{OverrideDocument, parse};
pub use error::MetadataError;
pub use resolve::{ResolvedTags, resolve};
