//! Persistence backends for the string-keyed local store.
//!
//! Everything the gallery keeps lives under a handful of string keys with
//! string values. Backends only move whole values in and out; the photo store
//! above them owns the encoding.

pub mod file;
pub mod memory;

use anyhow::Result;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key holding the serialized gallery collection.
pub const GALLERY_KEY: &str = "galleryPhotos";
/// Key holding the homepage profile photo.
pub const PROFILE_PHOTO_KEY: &str = "profilePhoto";
/// Key holding the contact page profile photo.
pub const CONTACT_PROFILE_PHOTO_KEY: &str = "contactProfilePhoto";

/// A string-keyed key-value store with whole-value replacement.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`. Either the whole value is written or
    /// the previous value is left in place.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Size a key/value pair counts against a quota.
pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}
