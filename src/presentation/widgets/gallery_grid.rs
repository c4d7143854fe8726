//! Scrollable card grid.
//!
//! Cards are laid out in content rows independent of the viewport and drawn
//! through a vertical scroll offset. The line after the last card row is the
//! end-of-content marker the sentinel watches.

use std::borrow::Cow;
use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{
        Block, BorderType, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget,
    },
};
use ratatui_image::{Resize, StatefulImage};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::image_state::{Attachments, ImageAttachment};
use crate::application::services::visibility_ratio;
use crate::domain::entities::{Photo, PhotoId, display_width};

/// Border rows plus the author line.
pub const CARD_CHROME_ROWS: u16 = 3;
const CARD_CHROME_COLS: u16 = 2;
const MIN_IMAGE_COLS: u16 = 6;
const CARD_GAP: u16 = 1;
/// Rows taken by the end-of-content marker.
pub const MARKER_HEIGHT: u32 = 1;
/// Lines moved by a single scroll step.
pub const SCROLL_LINES: u32 = 3;

const LOADING_TEXT: &str = "loading...";
const FAILED_TEXT: &str = "unavailable";

/// Size of one terminal cell in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u16,
    pub height: u16,
}

impl CellSize {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }

    /// Rows needed to show `height_px` pixels.
    #[must_use]
    pub fn rows_for(self, height_px: u32) -> u16 {
        let rows = height_px.div_ceil(u32::from(self.height)).max(1);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }

    /// Columns closest to `width_px` pixels.
    #[must_use]
    pub fn cols_for(self, width_px: u32) -> u16 {
        let cell = u32::from(self.width);
        let cols = (width_px + cell / 2) / cell;
        u16::try_from(cols).unwrap_or(u16::MAX)
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

/// Position of one card in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    pub index: usize,
    pub x: u16,
    pub top: u32,
    pub width: u16,
    pub height: u16,
}

impl CardSlot {
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.top + u32::from(self.height)
    }
}

/// Cards flowed left to right into rows that wrap at the viewport width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLayout {
    slots: Vec<CardSlot>,
    row_starts: Vec<usize>,
    card_height: u16,
}

impl GridLayout {
    #[must_use]
    pub fn compute(photos: &[Photo], width: u16, cell: CellSize, fixed_height: u32) -> Self {
        let card_height = cell.rows_for(fixed_height).saturating_add(CARD_CHROME_ROWS);
        let mut slots = Vec::with_capacity(photos.len());
        let mut row_starts = Vec::new();
        let mut x: u16 = 0;
        let mut row: u32 = 0;

        for (index, photo) in photos.iter().enumerate() {
            let card_width = card_width(photo, width, cell, fixed_height);

            if row_starts.is_empty() {
                row_starts.push(index);
            } else if x > 0 && x.saturating_add(card_width) > width {
                row += 1;
                x = 0;
                row_starts.push(index);
            }

            slots.push(CardSlot {
                index,
                x,
                top: row * u32::from(card_height),
                width: card_width,
                height: card_height,
            });
            x = x.saturating_add(card_width).saturating_add(CARD_GAP);
        }

        Self {
            slots,
            row_starts,
            card_height,
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[CardSlot] {
        &self.slots
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_starts.len()
    }

    #[must_use]
    pub const fn card_height(&self) -> u16 {
        self.card_height
    }

    /// First content row of the end-of-content marker.
    #[must_use]
    pub fn marker_top(&self) -> u32 {
        u32::try_from(self.row_count()).unwrap_or(u32::MAX) * u32::from(self.card_height)
    }

    #[must_use]
    pub fn content_height(&self) -> u32 {
        self.marker_top() + MARKER_HEIGHT
    }

    /// Card rows that intersect content lines `[top, bottom)`.
    #[must_use]
    pub fn rows_in(&self, top: u32, bottom: u32) -> Range<usize> {
        if self.card_height == 0 || bottom <= top {
            return 0..0;
        }
        let height = u32::from(self.card_height);
        let to_index = |v: u32| usize::try_from(v).unwrap_or(usize::MAX);
        let start = to_index(top / height).min(self.row_count());
        let end = to_index(bottom.div_ceil(height)).min(self.row_count());
        start..end.max(start)
    }

    /// Indices of the cards in the given rows.
    #[must_use]
    pub fn cards_in_rows(&self, rows: Range<usize>) -> Range<usize> {
        let total = self.slots.len();
        let start = self.row_starts.get(rows.start).copied().unwrap_or(total);
        let end = self.row_starts.get(rows.end).copied().unwrap_or(total);
        start..end.max(start)
    }
}

fn card_width(photo: &Photo, width: u16, cell: CellSize, fixed_height: u32) -> u16 {
    let width_px = display_width(photo.width(), photo.height(), fixed_height);
    cell.cols_for(width_px)
        .max(MIN_IMAGE_COLS)
        .saturating_add(CARD_CHROME_COLS)
        .min(width.max(1))
}

#[derive(Debug)]
pub struct GalleryGridState {
    offset: u32,
    viewport_height: u16,
    cell: CellSize,
    fixed_height: u32,
    layout: GridLayout,
    laid_out: Option<(usize, u16)>,
    pub attachments: Attachments,
    rendered: Vec<PhotoId>,
}

impl GalleryGridState {
    #[must_use]
    pub fn new(cell: CellSize, fixed_height: u32) -> Self {
        Self {
            offset: 0,
            viewport_height: 0,
            cell,
            fixed_height,
            layout: GridLayout::default(),
            laid_out: None,
            attachments: Attachments::new(),
            rendered: Vec::new(),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    #[must_use]
    pub const fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    #[must_use]
    pub const fn cell(&self) -> CellSize {
        self.cell
    }

    /// Recomputes the layout when the card count or width changed. Merges
    /// only ever add cards, so the count is enough to detect new content.
    pub fn relayout(&mut self, photos: &[Photo], width: u16) {
        let key = (photos.len(), width);
        if self.laid_out != Some(key) {
            self.layout = GridLayout::compute(photos, width, self.cell, self.fixed_height);
            self.laid_out = Some(key);
        }
        self.offset = self.offset.min(self.max_offset());
    }

    pub const fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
    }

    #[must_use]
    pub fn max_offset(&self) -> u32 {
        self.layout
            .content_height()
            .saturating_sub(u32::from(self.viewport_height))
    }

    pub fn scroll_down(&mut self, lines: u32) {
        self.offset = self.offset.saturating_add(lines).min(self.max_offset());
    }

    pub const fn scroll_up(&mut self, lines: u32) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(u32::from(self.viewport_height.max(1)));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(u32::from(self.viewport_height.max(1)));
    }

    pub const fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    /// Cards within `buffer_rows` card rows of the viewport.
    #[must_use]
    pub fn visible_cards(&self, buffer_rows: usize) -> Range<usize> {
        let buffer = u32::try_from(buffer_rows)
            .unwrap_or(u32::MAX)
            .saturating_mul(u32::from(self.layout.card_height()));
        let top = self.offset.saturating_sub(buffer);
        let bottom = self
            .offset
            .saturating_add(u32::from(self.viewport_height))
            .saturating_add(buffer);
        self.layout.cards_in_rows(self.layout.rows_in(top, bottom))
    }

    /// Visible fraction of the end-of-content marker, with the viewport grown
    /// by `margin_rows` on both ends.
    #[must_use]
    pub fn marker_ratio(&self, margin_rows: u32) -> f32 {
        visibility_ratio(
            self.layout.marker_top(),
            MARKER_HEIGHT,
            self.offset,
            u32::from(self.viewport_height),
            margin_rows,
        )
    }

    /// Ids of cards whose image was drawn in the last frame.
    pub fn take_rendered(&mut self) -> Vec<PhotoId> {
        std::mem::take(&mut self.rendered)
    }
}

struct GalleryGridStyle {
    border_style: Style,
    loaded_border_style: Style,
    author_style: Style,
    loading_style: Style,
    failed_style: Style,
    footer_style: Style,
    scrollbar_style: Style,
}

impl Default for GalleryGridStyle {
    fn default() -> Self {
        Self {
            border_style: Style::default().fg(Color::DarkGray),
            loaded_border_style: Style::default().fg(Color::Gray),
            author_style: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
            loading_style: Style::default().fg(Color::DarkGray),
            failed_style: Style::default().fg(Color::Red),
            footer_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            scrollbar_style: Style::default().fg(Color::DarkGray),
        }
    }
}

pub struct GalleryGrid<'a> {
    photos: &'a [Photo],
    footer: Option<&'a str>,
    style: GalleryGridStyle,
}

impl<'a> GalleryGrid<'a> {
    #[must_use]
    pub fn new(photos: &'a [Photo]) -> Self {
        Self {
            photos,
            footer: None,
            style: GalleryGridStyle::default(),
        }
    }

    /// Text drawn on the end-of-content marker line.
    #[must_use]
    pub const fn footer(mut self, footer: Option<&'a str>) -> Self {
        self.footer = footer;
        self
    }

    fn render_card(
        &self,
        slot: &CardSlot,
        area: Rect,
        view_top: u32,
        buf: &mut Buffer,
        attachments: &mut Attachments,
        rendered: &mut Vec<PhotoId>,
    ) {
        let Some(photo) = self.photos.get(slot.index) else {
            return;
        };
        let attachment = attachments.get_mut(photo.id());
        let view_bottom = view_top + u32::from(area.height);
        let x = area.x + slot.x;
        let width = slot.width.min(area.width.saturating_sub(slot.x));
        if width == 0 {
            return;
        }

        if slot.top >= view_top && slot.bottom() <= view_bottom {
            let y = area.y + to_u16(slot.top - view_top);
            let card = Rect::new(x, y, width, slot.height);
            if self.draw_card(photo, card, buf, attachment, true) {
                rendered.push(photo.id().clone());
            }
            return;
        }

        // Partially visible cards are drawn off-screen and the visible lines
        // copied over. Graphics protocols cannot be clipped, so the image
        // area stays empty.
        let mut scratch = Buffer::empty(Rect::new(0, 0, width, slot.height));
        self.draw_card(photo, scratch.area, &mut scratch, attachment, false);

        for line in view_top.max(slot.top)..view_bottom.min(slot.bottom()) {
            let src_y = to_u16(line - slot.top);
            let dst_y = area.y + to_u16(line - view_top);
            for col in 0..width {
                if let (Some(src), Some(dst)) =
                    (scratch.cell((col, src_y)), buf.cell_mut((x + col, dst_y)))
                {
                    *dst = src.clone();
                }
            }
        }
    }

    /// Draws one card. Returns true if the image itself was drawn.
    fn draw_card(
        &self,
        photo: &Photo,
        card: Rect,
        buf: &mut Buffer,
        attachment: Option<&mut ImageAttachment>,
        allow_image: bool,
    ) -> bool {
        let border_style = if photo.is_loaded() {
            self.style.loaded_border_style
        } else {
            self.style.border_style
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style);
        let inner = block.inner(card);
        block.render(card, buf);

        if inner.is_empty() {
            return false;
        }

        let image_area = Rect {
            height: inner.height.saturating_sub(1),
            ..inner
        };
        let author_area = Rect {
            y: inner.y + image_area.height,
            height: 1,
            ..inner
        };
        Line::styled(
            truncate(photo.author(), usize::from(author_area.width)),
            self.style.author_style,
        )
        .render(author_area, buf);

        match attachment {
            Some(ImageAttachment {
                protocol: Some(protocol),
                ..
            }) if allow_image => {
                StatefulImage::default()
                    .resize(Resize::Fit(None))
                    .render(image_area, buf, protocol);
                return true;
            }
            Some(attachment) if attachment.status.is_failed() => {
                placeholder(FAILED_TEXT, self.style.failed_style, image_area, buf);
            }
            _ if !photo.is_loaded() => {
                placeholder(LOADING_TEXT, self.style.loading_style, image_area, buf);
            }
            _ => {}
        }
        false
    }

    fn render_marker(&self, area: Rect, view_top: u32, marker_top: u32, buf: &mut Buffer) {
        let Some(footer) = self.footer else {
            return;
        };
        let view_bottom = view_top + u32::from(area.height);
        if marker_top < view_top || marker_top >= view_bottom {
            return;
        }
        let line_area = Rect {
            y: area.y + to_u16(marker_top - view_top),
            height: 1,
            ..area
        };
        Paragraph::new(footer)
            .style(self.style.footer_style)
            .alignment(Alignment::Center)
            .render(line_area, buf);
    }
}

impl StatefulWidget for GalleryGrid<'_> {
    type State = GalleryGridState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if area.is_empty() {
            return;
        }

        let grid_area = Rect {
            width: area.width.saturating_sub(1),
            ..area
        };
        state.set_viewport_height(area.height);
        state.relayout(self.photos, grid_area.width);
        state.rendered.clear();

        let view_top = state.offset;
        let visible = state
            .layout
            .cards_in_rows(state.layout.rows_in(view_top, view_top + u32::from(area.height)));

        let GalleryGridState {
            layout,
            attachments,
            rendered,
            ..
        } = &mut *state;
        for slot in &layout.slots[visible] {
            self.render_card(slot, grid_area, view_top, buf, attachments, rendered);
        }
        self.render_marker(grid_area, view_top, layout.marker_top(), buf);

        let max_offset = state.max_offset();
        if max_offset > 0 {
            let scrollbar_area = Rect {
                x: area.x + grid_area.width,
                width: 1,
                ..area
            };
            let mut scrollbar_state =
                ScrollbarState::new(usize::try_from(max_offset).unwrap_or(usize::MAX))
                    .position(usize::try_from(state.offset).unwrap_or(usize::MAX));
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(self.style.scrollbar_style)
                .begin_symbol(None)
                .end_symbol(None)
                .render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}

fn placeholder(text: &str, style: Style, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
        return;
    }
    let line_area = Rect {
        y: area.y + area.height / 2,
        height: 1,
        ..area
    };
    Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .render(line_area, buf);
}

fn truncate(text: &str, max_width: usize) -> Cow<'_, str> {
    if text.width() <= max_width {
        return Cow::Borrowed(text);
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    Cow::Owned(out)
}

fn to_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
