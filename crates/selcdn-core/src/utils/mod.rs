//! Helpers for content digests and object URL composition.

pub mod digest;
pub mod location;

pub use digest::content_md5;
pub use location::{check_object_path, object_url, public_url};
