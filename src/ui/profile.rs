//! Profile photo uploader shared by the homepage and the contact page.

use std::sync::Arc;
use std::time::Duration;

use super::notify::{Notice, DEFAULT_TOAST_DURATION};
use super::surface::ProfileSurface;
use crate::config::Config;
use crate::error::{GalleryError, Result};
use crate::storage::{StorageBackend, CONTACT_PROFILE_PHOTO_KEY, PROFILE_PHOTO_KEY};
use crate::upload::{format_limit, FileBlob, FileReader, UploadPolicy};

pub const INVALID_TYPE_MESSAGE: &str = "Please select a valid image file (JPG, PNG, GIF, WebP)";
pub const READ_ERROR_MESSAGE: &str = "Error reading the image file. Please try again.";
pub const UPDATED_MESSAGE: &str = "Profile photo updated successfully!";

/// Where a profile photo is shown. Each slot is stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileSlot {
    Homepage,
    Contact,
}

impl ProfileSlot {
    pub const ALL: [ProfileSlot; 2] = [ProfileSlot::Homepage, ProfileSlot::Contact];

    pub fn storage_key(&self) -> &'static str {
        match self {
            ProfileSlot::Homepage => PROFILE_PHOTO_KEY,
            ProfileSlot::Contact => CONTACT_PROFILE_PHOTO_KEY,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "home" | "homepage" => Some(ProfileSlot::Homepage),
            "contact" => Some(ProfileSlot::Contact),
            _ => None,
        }
    }
}

pub struct ProfileUploader<S: ProfileSurface> {
    storage: Arc<dyn StorageBackend>,
    surface: S,
    policy: UploadPolicy,
    reader: FileReader,
    toast_duration: Duration,
}

impl<S: ProfileSurface> ProfileUploader<S> {
    pub fn new(storage: Arc<dyn StorageBackend>, surface: S, policy: UploadPolicy) -> Self {
        Self {
            storage,
            surface,
            policy,
            reader: FileReader::new(),
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }

    pub fn from_config(storage: Arc<dyn StorageBackend>, surface: S, config: &Config) -> Self {
        let policy = UploadPolicy::new(
            config.profile.accepted_types.clone(),
            config.profile.max_file_bytes,
        );
        let mut uploader = Self::new(storage, surface, policy);
        uploader.toast_duration = Duration::from_millis(config.notifications.toast_duration_ms);
        uploader
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Show every slot that has a saved photo.
    pub fn initialize(&mut self) {
        for slot in ProfileSlot::ALL {
            match self.storage.load(slot.storage_key()) {
                Ok(Some(url)) => self.surface.show_profile_photo(slot, &url),
                Ok(None) => {}
                Err(e) => tracing::warn!(?slot, "Could not load profile photo: {:#}", e),
            }
        }
    }

    /// The saved photo for `slot`, if any.
    pub fn saved(&self, slot: ProfileSlot) -> Option<String> {
        self.storage.load(slot.storage_key()).ok().flatten()
    }

    /// Validate, read, save and show a new profile photo for `slot`.
    pub async fn upload(&mut self, file: FileBlob, slot: ProfileSlot) -> Result<String> {
        if let Err(e) = self.policy.check(&file) {
            let message = match e {
                GalleryError::FileTooLarge { limit, .. } => {
                    format!("Please select an image under {}", format_limit(limit))
                }
                _ => INVALID_TYPE_MESSAGE.to_string(),
            };
            self.surface.alert(&message);
            return Err(e);
        }

        let url = match self.reader.read_as_data_url(&file).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("{}", e);
                self.surface.alert(READ_ERROR_MESSAGE);
                return Err(e);
            }
        };

        if let Err(e) = self.storage.save(slot.storage_key(), &url) {
            tracing::error!(?slot, "Failed to save profile photo: {:#}", e);
            self.surface
                .alert("Could not save the profile photo: storage is full or unavailable");
            return Err(GalleryError::StorageWriteFailure {
                key: slot.storage_key().to_string(),
                reason: format!("{:#}", e),
            });
        }
        self.surface.show_profile_photo(slot, &url);

        tracing::info!(?slot, bytes = file.size, "Profile photo updated");
        self.surface
            .notify(Notice::success(UPDATED_MESSAGE, self.toast_duration));
        Ok(url)
    }
}
