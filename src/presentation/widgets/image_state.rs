//! Per-card image state and terminal protocol management.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use ratatui_image::picker::{Capability, Picker, ProtocolType};
use ratatui_image::protocol::StatefulProtocol;

use crate::domain::entities::{ImageStatus, Photo, PhotoId};
use crate::presentation::widgets::gallery_grid::CellSize;

/// Extra multiple of the load range within which decoded images stay in
/// memory.
pub const MEMORY_BUFFER_FACTOR: usize = 3;

pub struct ImageAttachment {
    pub id: PhotoId,
    pub url: String,
    pub image: Option<Arc<image::DynamicImage>>,
    pub protocol: Option<StatefulProtocol>,
    pub status: ImageStatus,
}

impl ImageAttachment {
    #[must_use]
    pub fn new(id: PhotoId, url: String) -> Self {
        Self {
            id,
            url,
            image: None,
            protocol: None,
            status: ImageStatus::NotStarted,
        }
    }

    #[must_use]
    pub fn from_photo(photo: &Photo) -> Self {
        Self::new(photo.id().clone(), photo.display_url().to_string())
    }

    pub fn set_loaded(&mut self, image: Arc<image::DynamicImage>) {
        self.image = Some(image);
        self.status = ImageStatus::Ready;
        self.protocol = None;
    }

    pub fn set_downloading(&mut self) {
        self.status = ImageStatus::Downloading;
    }

    pub fn set_failed(&mut self, error: String) {
        self.status = ImageStatus::Failed(error);
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.image.is_some() && self.status.is_ready()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    #[must_use]
    pub fn needs_load(&self) -> bool {
        self.status.is_not_started() && !self.url.is_empty()
    }

    pub fn update_protocol_if_needed(&mut self, picker: &Picker) {
        if self.protocol.is_some() {
            return;
        }

        if let Some(ref image) = self.image {
            self.protocol = Some(picker.new_resize_protocol((**image).clone()));
        }
    }

    pub fn clear_protocol(&mut self) {
        self.protocol = None;
    }

    /// Drops the decoded pixels; the card is downloaded again when it comes
    /// back into range. Returns true if a download was still pending.
    pub fn evict(&mut self) -> bool {
        self.protocol = None;
        self.image = None;
        match self.status {
            ImageStatus::Ready => {
                self.status = ImageStatus::NotStarted;
                false
            }
            ImageStatus::Downloading => {
                self.status = ImageStatus::NotStarted;
                true
            }
            ImageStatus::NotStarted | ImageStatus::Failed(_) => false,
        }
    }
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("has_image", &self.image.is_some())
            .field("has_protocol", &self.protocol.is_some())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Card image attachments keyed by photo id.
pub type Attachments = HashMap<PhotoId, ImageAttachment>;

pub struct ImageManager {
    picker: Picker,
}

impl ImageManager {
    /// Queries the terminal for its graphics protocol and font size. Must
    /// run after the terminal has entered raw mode.
    #[must_use]
    pub fn new() -> Self {
        let mut picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::halfblocks());

        let caps = picker.capabilities();
        let has_sixel = caps.iter().any(|c| matches!(c, Capability::Sixel));
        let has_kitty = caps.iter().any(|c| matches!(c, Capability::Kitty));

        if has_sixel && !has_kitty && picker.protocol_type() == ProtocolType::Halfblocks {
            picker.set_protocol_type(ProtocolType::Sixel);
        }

        Self { picker }
    }

    #[must_use]
    pub fn halfblocks() -> Self {
        Self {
            picker: Picker::halfblocks(),
        }
    }

    /// Terminal cell size in pixels.
    #[must_use]
    pub fn cell_size(&self) -> CellSize {
        let (width, height) = self.picker.font_size();
        CellSize::new(width, height)
    }

    /// Builds protocols for decoded images of the cards in `range`.
    pub fn update_visible_protocols(
        &self,
        attachments: &mut Attachments,
        photos: &[Photo],
        range: Range<usize>,
    ) {
        for photo in clamp(photos, range) {
            if let Some(attachment) = attachments.get_mut(photo.id()) {
                attachment.update_protocol_if_needed(&self.picker);
            }
        }
    }

    /// Releases protocols of cards outside `range`, and decoded images of
    /// cards further than [`MEMORY_BUFFER_FACTOR`] times its length away.
    /// Returns the evicted cards whose downloads should be cancelled.
    #[must_use]
    pub fn clear_distant_protocols(
        attachments: &mut Attachments,
        photos: &[Photo],
        range: &Range<usize>,
    ) -> Vec<PhotoId> {
        let span = range.len().max(1) * MEMORY_BUFFER_FACTOR;
        let memory_start = range.start.saturating_sub(span);
        let memory_end = range.end.saturating_add(span);
        let mut cancelled = Vec::new();

        for (idx, photo) in photos.iter().enumerate() {
            let Some(attachment) = attachments.get_mut(photo.id()) else {
                continue;
            };

            if idx < memory_start || idx >= memory_end {
                if attachment.evict() {
                    cancelled.push(photo.id().clone());
                }
            } else if !range.contains(&idx) {
                attachment.clear_protocol();
            }
        }

        cancelled
    }

    /// Returns the cards in `range` whose images have not been requested,
    /// marking them as downloading.
    #[must_use]
    pub fn collect_needed_loads(
        attachments: &mut Attachments,
        photos: &[Photo],
        range: Range<usize>,
    ) -> Vec<(PhotoId, String)> {
        clamp(photos, range)
            .iter()
            .filter_map(|photo| {
                let attachment = attachments
                    .entry(photo.id().clone())
                    .or_insert_with(|| ImageAttachment::from_photo(photo));
                if !attachment.needs_load() {
                    return None;
                }
                attachment.set_downloading();
                Some((attachment.id.clone(), attachment.url.clone()))
            })
            .collect()
    }
}

fn clamp(photos: &[Photo], range: Range<usize>) -> &[Photo] {
    let end = range.end.min(photos.len());
    let start = range.start.min(end);
    &photos[start..end]
}

impl Default for ImageManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photos(count: usize) -> Vec<Photo> {
        (0..count)
            .map(|i| {
                Photo::new(i.to_string(), "Author", 300, 200)
                    .with_display_url(format!("http://img/{i}"))
            })
            .collect()
    }

    #[test]
    fn test_image_attachment_creation() {
        let id = PhotoId::new("test");
        let attachment = ImageAttachment::new(id.clone(), "https://example.com/img.png".to_string());

        assert_eq!(attachment.id, id);
        assert!(!attachment.is_ready());
        assert!(attachment.needs_load());
    }

    #[test]
    fn test_image_attachment_loading_flow() {
        let id = PhotoId::new("test");
        let mut attachment = ImageAttachment::new(id, "https://example.com/img.png".to_string());

        assert!(attachment.needs_load());

        attachment.set_downloading();
        assert!(attachment.is_loading());
        assert!(!attachment.needs_load());

        let img = Arc::new(image::DynamicImage::new_rgb8(100, 100));
        attachment.set_loaded(img);
        assert!(attachment.is_ready());
        assert!(!attachment.is_loading());
    }

    #[test]
    fn test_image_attachment_failure() {
        let id = PhotoId::new("test");
        let mut attachment = ImageAttachment::new(id, "https://example.com/img.png".to_string());

        attachment.set_failed("Network error".to_string());
        assert!(attachment.status.is_failed());
        assert!(!attachment.is_ready());
        assert!(!attachment.needs_load());
    }

    #[test]
    fn test_evict_allows_reload() {
        let mut attachment = ImageAttachment::new(PhotoId::new("1"), "url".to_string());
        attachment.set_loaded(Arc::new(image::DynamicImage::new_rgb8(2, 2)));

        assert!(!attachment.evict());
        assert!(attachment.image.is_none());
        assert!(attachment.needs_load());

        attachment.set_downloading();
        assert!(attachment.evict());
        assert!(attachment.needs_load());
    }

    #[test]
    fn test_collect_needed_loads_only_in_range() {
        let photos = photos(10);
        let mut attachments = Attachments::new();

        let needed = ImageManager::collect_needed_loads(&mut attachments, &photos, 2..5);
        let ids: Vec<_> = needed.iter().map(|(id, _)| id.as_str().to_string()).collect();
        assert_eq!(ids, ["2", "3", "4"]);
        assert_eq!(needed[0].1, "http://img/2");
        assert!(attachments[&PhotoId::new("3")].is_loading());
    }

    #[test]
    fn test_collect_needed_loads_skips_requested() {
        let photos = photos(4);
        let mut attachments = Attachments::new();

        let first = ImageManager::collect_needed_loads(&mut attachments, &photos, 0..4);
        let second = ImageManager::collect_needed_loads(&mut attachments, &photos, 0..4);
        assert_eq!(first.len(), 4);
        assert!(second.is_empty());
    }

    #[test]
    fn test_collect_needed_loads_range_past_end() {
        let photos = photos(3);
        let mut attachments = Attachments::new();

        let needed = ImageManager::collect_needed_loads(&mut attachments, &photos, 2..10);
        assert_eq!(needed.len(), 1);
        assert_eq!(needed[0].0, PhotoId::new("2"));
    }

    #[test]
    fn test_clear_distant_evicts_far_cards() {
        let photos = photos(40);
        let mut attachments = Attachments::new();
        for photo in &photos {
            let mut attachment = ImageAttachment::from_photo(photo);
            attachment.set_loaded(Arc::new(image::DynamicImage::new_rgb8(2, 2)));
            attachments.insert(photo.id().clone(), attachment);
        }

        let mut pending = ImageAttachment::new(PhotoId::new("extra"), "url".into());
        pending.set_downloading();
        let mut photos = photos;
        photos.push(Photo::new("extra", "Author", 300, 200));
        attachments.insert(PhotoId::new("extra"), pending);

        let cancelled = ImageManager::clear_distant_protocols(&mut attachments, &photos, &(10..12));

        assert_eq!(cancelled, [PhotoId::new("extra")]);
        assert!(attachments[&PhotoId::new("11")].is_ready());
        assert!(attachments[&PhotoId::new("5")].is_ready());
        assert!(attachments[&PhotoId::new("39")].needs_load());
        assert!(attachments[&PhotoId::new("0")].needs_load());
    }

    #[test]
    fn test_halfblocks_cell_size() {
        let manager = ImageManager::halfblocks();
        let cell = manager.cell_size();
        assert!(cell.width > 0 && cell.height > 0);
    }
}
