//! A surface that renders nothing and remembers everything, for tests and
//! the command-line driver.

use std::collections::HashMap;

use super::notify::{Notice, Notifier};
use super::profile::ProfileSlot;
use super::surface::{GallerySurface, ProfileSurface};
use crate::store::{Category, PhotoId, PhotoRecord};
use crate::upload::UploadProgress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessItem {
    pub id: PhotoId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub visible: bool,
}

#[derive(Debug)]
pub struct HeadlessSurface {
    pub items: Vec<HeadlessItem>,
    pub prompt_visible: bool,
    pub progress: Option<UploadProgress>,
    /// Every progress state shown, in order
    pub progress_history: Vec<UploadProgress>,
    pub detail: Option<PhotoId>,
    pub downloads: Vec<(String, String)>,
    /// Answer given to every confirmation
    pub confirm_answer: bool,
    pub confirmations: Vec<String>,
    pub alerts: Vec<String>,
    pub notices: Vec<Notice>,
    pub profile_photos: HashMap<ProfileSlot, String>,
}

impl HeadlessSurface {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            items: Vec::new(),
            prompt_visible: true,
            progress: None,
            progress_history: Vec::new(),
            detail: None,
            downloads: Vec::new(),
            confirm_answer,
            confirmations: Vec::new(),
            alerts: Vec::new(),
            notices: Vec::new(),
            profile_photos: HashMap::new(),
        }
    }

    pub fn item(&self, id: PhotoId) -> Option<&HeadlessItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn visible_ids(&self) -> Vec<PhotoId> {
        self.items.iter().filter(|i| i.visible).map(|i| i.id).collect()
    }

    /// The toast currently on screen, if any.
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for HeadlessSurface {
    fn alert(&mut self, message: &str) {
        tracing::debug!(message, "alert");
        self.alerts.push(message.to_string());
    }

    fn notify(&mut self, notice: Notice) {
        tracing::debug!(message = %notice.message, kind = ?notice.kind, "notice");
        self.notices.push(notice);
    }
}

impl GallerySurface for HeadlessSurface {
    fn insert_item(&mut self, record: &PhotoRecord) {
        self.items.push(HeadlessItem {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            visible: true,
        });
    }

    fn remove_item(&mut self, id: PhotoId) {
        self.items.retain(|i| i.id != id);
    }

    fn set_item_visible(&mut self, id: PhotoId, visible: bool) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.visible = visible;
        }
    }

    fn set_prompt_visible(&mut self, visible: bool) {
        self.prompt_visible = visible;
    }

    fn show_progress(&mut self, progress: &UploadProgress) {
        self.progress = Some(*progress);
        self.progress_history.push(*progress);
    }

    fn hide_progress(&mut self) {
        self.progress = None;
    }

    fn show_detail(&mut self, record: &PhotoRecord) {
        self.detail = Some(record.id);
    }

    fn hide_detail(&mut self) {
        self.detail = None;
    }

    fn save_download(&mut self, url: &str, filename: &str) {
        self.downloads.push((url.to_string(), filename.to_string()));
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.confirmations.push(message.to_string());
        self.confirm_answer
    }
}

impl ProfileSurface for HeadlessSurface {
    fn show_profile_photo(&mut self, slot: ProfileSlot, url: &str) {
        self.profile_photos.insert(slot, url.to_string());
    }
}
