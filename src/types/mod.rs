// ABOUTME: Validated domain types shared across push and registry operations.
// ABOUTME: Image references, digests, and registry address normalization.

mod digest;
mod image_ref;

pub use digest::{Digest, DigestError};
pub use image_ref::{
    DEFAULT_NAMESPACE, DEFAULT_REGISTRY, DEFAULT_TAG, ImageRef, ParseImageRefError,
    normalize_registry_address,
};
