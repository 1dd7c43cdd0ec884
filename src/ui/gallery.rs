//! Gallery view: projects the photo store onto a grid and routes every
//! user-triggered change through validated entry points.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use super::notify::{Notice, DEFAULT_TOAST_DURATION};
use super::surface::GallerySurface;
use crate::config::Config;
use crate::error::{GalleryError, Result};
use crate::store::{Category, CategoryFilter, IdAllocator, PhotoId, PhotoRecord, PhotoStore};
use crate::upload::{format_limit, FileBlob, FileReader, UploadPolicy, UploadProgress};

pub const DROP_NON_IMAGE_MESSAGE: &str = "Please drop only image files (JPG, PNG, GIF)";
pub const DELETE_CONFIRM_MESSAGE: &str = "Are you sure you want to delete this photo?";
pub const DELETED_MESSAGE: &str = "Photo deleted successfully!";

/// Alert for a batch in which no file passed validation.
pub fn invalid_batch_message(max_bytes: u64) -> String {
    format!(
        "Please select valid image files (JPG, PNG, GIF, WebP) under {} each",
        format_limit(max_bytes)
    )
}

/// How a batch of files reached the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOrigin {
    Picker,
    Drop,
}

/// Knobs for the gallery view.
#[derive(Debug, Clone)]
pub struct GallerySettings {
    pub policy: UploadPolicy,
    /// Pause between a batch finishing and its progress bar disappearing
    pub progress_hide_delay: Duration,
    pub download_filename: String,
    pub default_category: Category,
    pub toast_duration: Duration,
}

impl GallerySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: UploadPolicy::new(
                config.gallery.accepted_types.clone(),
                config.gallery.max_file_bytes,
            ),
            progress_hide_delay: Duration::from_millis(config.gallery.progress_hide_delay_ms),
            download_filename: config.gallery.download_filename.clone(),
            default_category: Category::from(config.gallery.default_category.as_str()),
            toast_duration: Duration::from_millis(config.notifications.toast_duration_ms),
        }
    }
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            policy: UploadPolicy::gallery(),
            progress_hide_delay: Duration::from_secs(1),
            download_filename: "portfolio-photo.jpg".to_string(),
            default_category: Category::default(),
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }
}

/// Outcome of one upload batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub submitted: usize,
    /// Files dropped by validation, with the reason
    pub rejected: Vec<(String, GalleryError)>,
    /// Ids stored and rendered, in completion order
    pub added: Vec<PhotoId>,
    /// Accepted files that could not be read or stored
    pub failed: Vec<GalleryError>,
}

#[derive(Debug, Clone)]
struct RenderedItem {
    id: PhotoId,
    category: Category,
}

pub struct GalleryView<S: GallerySurface> {
    store: Arc<PhotoStore>,
    surface: S,
    settings: GallerySettings,
    reader: FileReader,
    ids: IdAllocator,
    /// Grid items in render order; mirrors the store
    rendered: Vec<RenderedItem>,
    filter: CategoryFilter,
    prompt_visible: bool,
    /// Record shown in the detail modal
    selected: Option<PhotoRecord>,
}

impl<S: GallerySurface> GalleryView<S> {
    pub fn new(store: Arc<PhotoStore>, surface: S, settings: GallerySettings) -> Self {
        Self {
            store,
            surface,
            settings,
            reader: FileReader::new(),
            ids: IdAllocator::new(),
            rendered: Vec::new(),
            filter: CategoryFilter::All,
            prompt_visible: true,
            selected: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn rendered_ids(&self) -> Vec<PhotoId> {
        self.rendered.iter().map(|r| r.id).collect()
    }

    pub fn selected(&self) -> Option<&PhotoRecord> {
        self.selected.as_ref()
    }

    pub fn active_filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// Render everything in the store. Calling it again rebuilds the grid
    /// from scratch.
    pub fn initialize(&mut self) {
        for item in std::mem::take(&mut self.rendered) {
            self.surface.remove_item(item.id);
        }

        let photos = self.store.list();
        self.ids = IdAllocator::resuming(photos.iter().map(|p| p.id));

        for photo in &photos {
            self.render_item(photo);
        }
        self.refresh_prompt();

        tracing::info!(count = photos.len(), "Gallery initialized");
    }

    /// Validate a batch from the picker or a drop, then read, store and
    /// render every accepted file. Invalid files are dropped from the batch
    /// without stopping the valid ones.
    pub async fn accept_files(&mut self, files: Vec<FileBlob>, origin: UploadOrigin) -> Result<BatchReport> {
        let mut report = BatchReport {
            submitted: files.len(),
            ..Default::default()
        };
        if files.is_empty() {
            return Ok(report);
        }

        let files = match origin {
            UploadOrigin::Picker => files,
            UploadOrigin::Drop => {
                let (images, others): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| f.is_image());
                if images.is_empty() {
                    self.surface.alert(DROP_NON_IMAGE_MESSAGE);
                    let first = &others[0];
                    return Err(GalleryError::InvalidFileType {
                        name: first.name.clone(),
                        media_type: first.media_type.clone(),
                    });
                }
                for file in others {
                    report.rejected.push((
                        file.name.clone(),
                        GalleryError::InvalidFileType {
                            name: file.name,
                            media_type: file.media_type,
                        },
                    ));
                }
                images
            }
        };

        let (accepted, rejected) = self.settings.policy.partition(files);
        for (file, reason) in rejected {
            tracing::debug!(name = %file.name, "Rejected upload: {}", reason);
            report.rejected.push((file.name, reason));
        }
        if accepted.is_empty() {
            let message = invalid_batch_message(self.settings.policy.max_bytes);
            self.surface.alert(&message);
            return Err(GalleryError::EmptyBatch);
        }

        let mut progress = UploadProgress::new(accepted.len());
        self.surface.show_progress(&progress);
        tracing::info!(
            files = accepted.len(),
            rejected = report.rejected.len(),
            "Uploading batch"
        );

        // Start every read at once; completions arrive in whatever order
        // the reads finish
        let now = Utc::now();
        let mut reads = JoinSet::new();
        for (index, file) in accepted.into_iter().enumerate() {
            let Some(id) = self.ids.next_id(now, index) else {
                tracing::error!(name = %file.name, "No photo id left for upload");
                self.surface
                    .alert(&format!("Could not save {}: no photo id is available", file.name));
                report.failed.push(GalleryError::IdsExhausted);
                progress.advance();
                self.surface.show_progress(&progress);
                continue;
            };
            let reader = self.reader;
            reads.spawn(async move {
                let result = reader.read_as_data_url(&file).await;
                (id, file, result)
            });
        }

        while let Some(joined) = reads.join_next().await {
            match joined {
                Ok((id, file, Ok(url))) => {
                    let record = PhotoRecord::from_upload(
                        id,
                        &file.name,
                        url,
                        self.settings.default_category.clone(),
                        Utc::now(),
                    );
                    match self.store.add(record.clone()) {
                        Ok(()) => {
                            self.render_item(&record);
                            report.added.push(id);
                        }
                        Err(e) => {
                            tracing::error!(name = %file.name, "Failed to store photo: {}", e);
                            self.surface
                                .alert(&format!("Could not save {}: storage is full or unavailable", file.name));
                            report.failed.push(e);
                        }
                    }
                }
                Ok((_, file, Err(e))) => {
                    tracing::warn!("{}", e);
                    self.surface.alert(&format!("Error reading file: {}", file.name));
                    report.failed.push(e);
                }
                Err(e) => {
                    tracing::error!("Upload task failed: {}", e);
                    report.failed.push(GalleryError::FileReadError {
                        name: String::new(),
                        reason: e.to_string(),
                    });
                }
            }

            progress.advance();
            self.surface.show_progress(&progress);
        }

        tokio::time::sleep(self.settings.progress_hide_delay).await;
        self.surface.hide_progress();
        self.refresh_prompt();

        tracing::info!(
            added = report.added.len(),
            failed = report.failed.len(),
            "Upload batch complete"
        );
        Ok(report)
    }

    /// Show only the items in `filter`. The store is not consulted.
    pub fn filter(&mut self, filter: CategoryFilter) {
        for item in &self.rendered {
            self.surface.set_item_visible(item.id, filter.matches(&item.category));
        }
        self.filter = filter;
        self.refresh_prompt();
    }

    pub fn open_detail(&mut self, record: &PhotoRecord) {
        self.surface.show_detail(record);
        self.selected = Some(record.clone());
    }

    /// Open the detail modal for a stored photo. Returns `false` if there
    /// is no such photo.
    pub fn open_detail_by_id(&mut self, id: &PhotoId) -> bool {
        match self.store.get(id) {
            Some(record) => {
                self.open_detail(&record);
                true
            }
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        if self.selected.take().is_some() {
            self.surface.hide_detail();
        }
    }

    /// Ask for confirmation, then delete the photo from the store and the
    /// grid. Returns whether the deletion went ahead.
    pub async fn confirm_and_delete(&mut self, id: PhotoId) -> Result<bool> {
        if !self.surface.confirm(DELETE_CONFIRM_MESSAGE) {
            return Ok(false);
        }

        if let Err(e) = self.store.remove(&id) {
            tracing::error!(%id, "Failed to delete photo: {}", e);
            self.surface.notify(Notice::error(
                format!("Could not delete photo: {}", e),
                self.settings.toast_duration,
            ));
            return Err(e);
        }

        if let Some(pos) = self.rendered.iter().position(|r| r.id == id) {
            self.rendered.remove(pos);
            self.surface.remove_item(id);
        }
        self.close_detail();
        self.refresh_prompt();
        self.surface
            .notify(Notice::success(DELETED_MESSAGE, self.settings.toast_duration));
        Ok(true)
    }

    /// Delete the photo currently shown in the detail modal.
    pub async fn delete_selected(&mut self) -> Result<bool> {
        match self.selected.as_ref().map(|r| r.id) {
            Some(id) => self.confirm_and_delete(id).await,
            None => Ok(false),
        }
    }

    /// Save the image shown in the detail modal. Returns `false` when the
    /// modal is closed.
    pub fn download(&mut self) -> bool {
        match &self.selected {
            Some(record) => {
                self.surface
                    .save_download(&record.url, &self.settings.download_filename);
                true
            }
            None => false,
        }
    }

    fn render_item(&mut self, record: &PhotoRecord) {
        self.surface.insert_item(record);
        if !self.filter.matches(&record.category) {
            self.surface.set_item_visible(record.id, false);
        }
        self.rendered.push(RenderedItem {
            id: record.id,
            category: record.category.clone(),
        });
    }

    /// The upload prompt shows only while nothing is rendered, and only
    /// under the views a new upload would land in.
    fn refresh_prompt(&mut self) {
        let lands_here = match &self.filter {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == self.settings.default_category,
        };
        self.prompt_visible = self.rendered.is_empty() && lands_here;
        self.surface.set_prompt_visible(self.prompt_visible);
    }
}
