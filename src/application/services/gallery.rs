//! Incremental-loading gallery state.
//!
//! The gallery owns every photo fetched so far together with the page
//! cursor and the loading, exhausted and error flags. It performs no I/O:
//! callers ask it for the next [`PageRequest`], run the fetch elsewhere and
//! feed the result back through [`Gallery::apply_page`].

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::application::dto::{PageOutcome, PageRequest};
use crate::domain::PageErrorPolicy;
use crate::domain::entities::{Photo, PhotoId};
use crate::domain::ports::DEFAULT_PAGE_LIMIT;

/// Gallery settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryConfig {
    /// Photos requested per page.
    pub page_limit: u32,
    /// First page requested.
    pub start_page: u32,
    /// What the next scroll trigger does after a failed page.
    pub on_page_error: PageErrorPolicy,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            start_page: 1,
            on_page_error: PageErrorPolicy::default(),
        }
    }
}

/// Observable phase of the gallery, derived from its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryPhase {
    /// Nothing requested and nothing received.
    Idle,
    /// A fetch for this page is outstanding.
    Fetching(u32),
    /// The last fetch merged photos.
    Success,
    /// The source has no further pages.
    Exhausted,
    /// The last failed fetch left this message.
    Error(String),
}

#[derive(Debug)]
pub struct Gallery {
    items: Vec<Photo>,
    cursor: u32,
    loading: bool,
    exhausted: bool,
    error: Option<String>,
    failed_page: Option<u32>,
    halted: bool,
    config: GalleryConfig,
}

impl Gallery {
    /// Creates the gallery in its mount state: empty, on the start page,
    /// loading.
    #[must_use]
    pub fn new(config: GalleryConfig) -> Self {
        Self {
            items: Vec::new(),
            cursor: config.start_page.max(1),
            loading: true,
            exhausted: false,
            error: None,
            failed_page: None,
            halted: false,
            config,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[Photo] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn cursor(&self) -> u32 {
        self.cursor
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn policy(&self) -> PageErrorPolicy {
        self.config.on_page_error
    }

    /// Returns true while further pages may still be requested.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        !self.exhausted && !self.halted
    }

    #[must_use]
    pub fn phase(&self) -> GalleryPhase {
        if self.loading {
            GalleryPhase::Fetching(self.cursor)
        } else if self.exhausted {
            GalleryPhase::Exhausted
        } else if let Some(error) = &self.error {
            GalleryPhase::Error(error.clone())
        } else if self.items.is_empty() {
            GalleryPhase::Idle
        } else {
            GalleryPhase::Success
        }
    }

    /// Starts the fetch for the current cursor.
    pub fn begin_fetch(&mut self) -> PageRequest {
        self.loading = true;
        debug!(page = self.cursor, "Fetching page");
        PageRequest::new(self.cursor).with_limit(self.config.page_limit)
    }

    /// Handles the sentinel reporting the end of the content.
    ///
    /// Returns the request to run, or `None` when pagination is finished,
    /// a fetch is already outstanding, or the error policy holds it back.
    pub fn on_sentinel(&mut self) -> Option<PageRequest> {
        if self.loading || !self.has_more() {
            return None;
        }

        let retry_failed = self.config.on_page_error == PageErrorPolicy::Retry
            && self.failed_page == Some(self.cursor);

        if retry_failed {
            info!(page = self.cursor, "Retrying failed page");
        } else {
            self.cursor += 1;
        }

        Some(self.begin_fetch())
    }

    /// Applies the result of fetching `page`.
    ///
    /// A failure records the message and keeps the photos; an empty page
    /// exhausts the gallery for good; anything else is merged and clears the
    /// error. Results for a page other than the cursor still merge, but only
    /// the cursor's own result ends the loading state.
    pub fn apply_page(&mut self, page: u32, result: Result<Vec<Photo>, String>) -> PageOutcome {
        if page == self.cursor {
            self.loading = false;
        } else {
            debug!(page, cursor = self.cursor, "Applying result for stale page");
        }

        match result {
            Err(message) => {
                warn!(page, error = %message, "Page fetch failed");
                self.error = Some(message.clone());
                self.failed_page = Some(page);
                if self.config.on_page_error == PageErrorPolicy::Halt {
                    info!(page, "Pagination halted after error");
                    self.halted = true;
                }
                PageOutcome::Failed(message)
            }
            Ok(photos) if photos.is_empty() => {
                info!(page, total = self.items.len(), "Source exhausted");
                self.exhausted = true;
                self.clear_failure(page);
                PageOutcome::Exhausted
            }
            Ok(photos) => {
                let added = merge_photos(&mut self.items, photos);
                self.error = None;
                self.clear_failure(page);
                debug!(page, added, total = self.items.len(), "Merged page");
                PageOutcome::Merged {
                    added,
                    total: self.items.len(),
                }
            }
        }
    }

    fn clear_failure(&mut self, page: u32) {
        if self.failed_page == Some(page) {
            self.failed_page = None;
        }
    }

    /// Marks the photo's image as loaded. Returns true if the flag changed.
    pub fn mark_loaded(&mut self, id: &PhotoId) -> bool {
        match self.items.iter_mut().find(|photo| photo.id() == id) {
            Some(photo) if !photo.is_loaded() => {
                photo.mark_loaded();
                true
            }
            _ => false,
        }
    }

    /// Marks the photo currently at `index` as loaded.
    ///
    /// The index is resolved to an id at call time, so a re-sort between
    /// rendering and the call does not flag the wrong photo.
    pub fn mark_loaded_at(&mut self, index: usize) -> bool {
        let Some(id) = self.items.get(index).map(|photo| photo.id().clone()) else {
            return false;
        };
        self.mark_loaded(&id)
    }
}

/// Merges `incoming` into `existing`, dropping ids already present (or
/// repeated within `incoming`), then stable-sorts by numeric id. Returns the
/// number of photos added.
pub fn merge_photos(existing: &mut Vec<Photo>, incoming: Vec<Photo>) -> usize {
    let mut seen: HashSet<PhotoId> = existing.iter().map(|p| p.id().clone()).collect();
    let before = existing.len();

    existing.extend(
        incoming
            .into_iter()
            .filter(|photo| seen.insert(photo.id().clone())),
    );
    existing.sort_by_key(|photo| photo.id().sort_key());

    existing.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn photos(ids: &[&str]) -> Vec<Photo> {
        ids.iter()
            .map(|id| Photo::new(*id, format!("author {id}"), 300, 200))
            .collect()
    }

    fn ids(gallery: &Gallery) -> Vec<&str> {
        gallery.items().iter().map(|p| p.id().as_str()).collect()
    }

    fn gallery_with(policy: PageErrorPolicy) -> Gallery {
        Gallery::new(GalleryConfig {
            on_page_error: policy,
            ..GalleryConfig::default()
        })
    }

    #[test]
    fn test_mount_state() {
        let gallery = Gallery::new(GalleryConfig::default());

        assert!(gallery.is_empty());
        assert_eq!(gallery.cursor(), 1);
        assert!(gallery.is_loading());
        assert!(!gallery.is_exhausted());
        assert_eq!(gallery.error(), None);
        assert_eq!(gallery.phase(), GalleryPhase::Fetching(1));
    }

    #[test]
    fn test_first_page_sorted_by_numeric_id() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        let request = gallery.begin_fetch();

        gallery.apply_page(request.page, Ok(photos(&["10", "5", "20"])));

        assert_eq!(ids(&gallery), vec!["5", "10", "20"]);
        assert!(!gallery.is_loading());
        assert_eq!(gallery.phase(), GalleryPhase::Success);
    }

    #[test]
    fn test_overlapping_pages_dedupe() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["5", "10"])));

        let request = gallery.on_sentinel().unwrap();
        assert_eq!(request.page, 2);
        let outcome = gallery.apply_page(2, Ok(photos(&["10", "15"])));

        assert_eq!(outcome, PageOutcome::Merged { added: 1, total: 3 });
        assert_eq!(ids(&gallery), vec!["5", "10", "15"]);
    }

    #[test]
    fn test_duplicates_within_one_page_dropped() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["3", "3", "1"])));

        assert_eq!(ids(&gallery), vec!["1", "3"]);
    }

    #[test]
    fn test_redelivered_page_is_idempotent() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["1", "2", "3"])));
        let outcome = gallery.apply_page(1, Ok(photos(&["1", "2", "3"])));

        assert_eq!(outcome, PageOutcome::Merged { added: 0, total: 3 });
    }

    #[test]
    fn test_empty_page_exhausts() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["1"])));
        gallery.on_sentinel();

        let outcome = gallery.apply_page(2, Ok(Vec::new()));

        assert_eq!(outcome, PageOutcome::Exhausted);
        assert!(gallery.is_exhausted());
        assert!(!gallery.is_loading());
        assert_eq!(ids(&gallery), vec!["1"]);
        assert_eq!(gallery.on_sentinel(), None);
    }

    #[test]
    fn test_exhausted_never_reverts() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(Vec::new()));
        gallery.apply_page(1, Ok(photos(&["7"])));
        gallery.apply_page(1, Err("boom".into()));

        assert!(gallery.is_exhausted());
    }

    #[test]
    fn test_transport_error_keeps_items() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["1", "2"])));
        gallery.on_sentinel();

        let message = "Failed to fetch images: 500 Internal Server Error".to_string();
        gallery.apply_page(2, Err(message));

        assert!(gallery.error().unwrap().contains("500"));
        assert_eq!(ids(&gallery), vec!["1", "2"]);
        assert!(!gallery.is_loading());
        assert!(matches!(gallery.phase(), GalleryPhase::Error(_)));
    }

    #[test]
    fn test_error_cleared_only_by_non_empty_success() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Err("offline".into()));

        gallery.on_sentinel();
        gallery.apply_page(2, Ok(Vec::new()));
        assert_eq!(gallery.error(), Some("offline"));

        gallery.apply_page(3, Ok(photos(&["9"])));
        assert_eq!(gallery.error(), None);
    }

    #[test]
    fn test_sentinel_ignored_while_loading() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        assert_eq!(gallery.on_sentinel(), None);
        assert_eq!(gallery.cursor(), 1);
    }

    #[test_case(PageErrorPolicy::Skip, Some(3) ; "skip moves past failed page")]
    #[test_case(PageErrorPolicy::Retry, Some(2) ; "retry refetches failed page")]
    #[test_case(PageErrorPolicy::Halt, None ; "halt stops pagination")]
    fn test_page_error_policy(policy: PageErrorPolicy, next: Option<u32>) {
        let mut gallery = gallery_with(policy);
        gallery.apply_page(1, Ok(photos(&["1"])));
        gallery.on_sentinel();
        gallery.apply_page(2, Err("timeout".into()));

        assert_eq!(gallery.on_sentinel().map(|r| r.page), next);
    }

    #[test]
    fn test_retry_moves_on_after_recovery() {
        let mut gallery = gallery_with(PageErrorPolicy::Retry);
        gallery.apply_page(1, Err("timeout".into()));

        assert_eq!(gallery.on_sentinel().map(|r| r.page), Some(1));
        gallery.apply_page(1, Ok(photos(&["1"])));
        assert_eq!(gallery.on_sentinel().map(|r| r.page), Some(2));
    }

    #[test]
    fn test_stale_result_merges_without_ending_load() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["4"])));
        gallery.on_sentinel();

        gallery.apply_page(1, Ok(photos(&["2", "4"])));

        assert!(gallery.is_loading());
        assert_eq!(ids(&gallery), vec!["2", "4"]);
    }

    #[test]
    fn test_mark_loaded_by_id_survives_resort() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["10", "20"])));
        let first = gallery.items()[0].id().clone();

        gallery.apply_page(1, Ok(photos(&["5"])));
        assert!(gallery.mark_loaded(&first));

        let loaded: Vec<_> = gallery
            .items()
            .iter()
            .filter(|p| p.is_loaded())
            .map(|p| p.id().as_str())
            .collect();
        assert_eq!(loaded, vec!["10"]);
    }

    #[test]
    fn test_mark_loaded_is_monotonic() {
        let mut gallery = Gallery::new(GalleryConfig::default());
        gallery.apply_page(1, Ok(photos(&["1", "2", "3"])));

        assert!(gallery.mark_loaded_at(0));
        assert!(gallery.mark_loaded_at(2));
        assert!(!gallery.mark_loaded_at(0));
        assert!(!gallery.mark_loaded_at(99));

        gallery.apply_page(1, Ok(photos(&["0"])));
        let flags: Vec<_> = gallery.items().iter().map(Photo::is_loaded).collect();
        assert_eq!(flags, vec![false, true, false, true]);
    }

    #[test]
    fn test_start_page_is_at_least_one() {
        let gallery = Gallery::new(GalleryConfig {
            start_page: 0,
            ..GalleryConfig::default()
        });
        assert_eq!(gallery.cursor(), 1);
    }
}
