//! What the gallery and profile views need from a UI toolkit.

use super::notify::Notifier;
use super::profile::ProfileSlot;
use crate::store::{PhotoId, PhotoRecord};
use crate::upload::UploadProgress;

/// Rendering surface for the gallery grid, its upload widgets and the
/// detail modal.
pub trait GallerySurface: Notifier {
    /// Append a grid item for `record`, visible, after existing items.
    fn insert_item(&mut self, record: &PhotoRecord);

    fn remove_item(&mut self, id: PhotoId);

    fn set_item_visible(&mut self, id: PhotoId, visible: bool);

    /// The "no photos yet" upload prompt.
    fn set_prompt_visible(&mut self, visible: bool);

    fn show_progress(&mut self, progress: &UploadProgress);

    fn hide_progress(&mut self);

    fn show_detail(&mut self, record: &PhotoRecord);

    fn hide_detail(&mut self);

    /// Save an image URL client-side under `filename`.
    fn save_download(&mut self, url: &str, filename: &str);

    /// Ask a yes/no question; `true` means the user agreed.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Rendering surface for the profile photo slots.
pub trait ProfileSurface: Notifier {
    /// Hide the slot's default icon and show `url` in its place.
    fn show_profile_photo(&mut self, slot: ProfileSlot, url: &str);
}
