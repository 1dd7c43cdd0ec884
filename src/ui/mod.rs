//! Views over the photo store and the surfaces they render to.

pub mod gallery;
pub mod headless;
pub mod notify;
pub mod profile;
pub mod surface;

pub use gallery::{BatchReport, GallerySettings, GalleryView, UploadOrigin};
pub use headless::HeadlessSurface;
pub use notify::{Notice, NoticeKind, Notifier};
pub use profile::{ProfileSlot, ProfileUploader};
pub use surface::{GallerySurface, ProfileSurface};
