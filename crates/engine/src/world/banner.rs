use std::time::{Duration, Instant};

use crate::app::text::{draw_text, text_size};
use crate::app::{Rect, Window};

const PANEL_COLOR: [u8; 4] = [24, 28, 40, 220];
const BORDER_COLOR: [u8; 4] = [232, 220, 180, 255];
const TEXT_COLOR: [u8; 4] = [250, 246, 232, 255];
const PADDING_PX: i32 = 4;
const MARGIN_PX: i32 = 4;

/// Map name shown in the corner after a map change.
#[derive(Debug, Clone)]
pub struct MapNameBanner {
    text: String,
    visible: bool,
    dismiss_at: Option<Instant>,
    scale: i32,
}

impl MapNameBanner {
    pub fn new(scale: i32) -> Self {
        Self {
            text: String::new(),
            visible: false,
            dismiss_at: None,
            scale: scale.max(1),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
        self.dismiss_at = None;
    }

    pub fn dismiss_after(&mut self, delay: Duration, now: Instant) {
        self.dismiss_at = now.checked_add(delay);
    }

    pub fn update(&mut self, now: Instant) {
        if self.dismiss_at.is_some_and(|deadline| now >= deadline) {
            self.dismiss();
        }
    }

    pub fn draw(&self, window: &mut dyn Window) {
        if !self.visible || self.text.is_empty() {
            return;
        }
        let (text_w, text_h) = text_size(&self.text, self.scale);
        let panel = Rect::new(
            MARGIN_PX,
            MARGIN_PX,
            text_w + PADDING_PX * 2,
            text_h + PADDING_PX * 2,
        );
        window.fill_rect(panel, BORDER_COLOR);
        window.fill_rect(
            Rect::new(panel.x + 1, panel.y + 1, panel.width - 2, panel.height - 2),
            PANEL_COLOR,
        );
        draw_text(
            window,
            panel.x + PADDING_PX,
            panel.y + PADDING_PX,
            &self.text,
            self.scale,
            TEXT_COLOR,
        );
    }
}
