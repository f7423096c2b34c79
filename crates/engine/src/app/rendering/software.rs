use std::collections::HashMap;

use tracing::debug;

use super::{Rect, TextureId, Window};

const DEFAULT_CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

#[derive(Debug, Clone, PartialEq, Eq)]
struct PixelBuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PixelBuffer {
    fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for chunk in rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    fn fill(&mut self, color: [u8; 4]) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let offset = self.offset(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(offset) = self.offset(x, y) {
            blend_over(&mut self.rgba[offset..offset + 4], color);
        }
    }

    fn write_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(offset) = self.offset(x, y) {
            self.rgba[offset..offset + 4].copy_from_slice(&color);
        }
    }
}

#[derive(Debug, Clone)]
struct Texture {
    pixels: PixelBuffer,
    transparent: bool,
}

/// CPU implementation of [`Window`]. The screen buffer is what the presenter
/// copies into the OS surface each frame.
#[derive(Debug)]
pub struct SoftwareWindow {
    screen: PixelBuffer,
    textures: HashMap<TextureId, Texture>,
    next_texture_id: u32,
    render_target: Option<TextureId>,
    clear_color: [u8; 4],
}

impl SoftwareWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: PixelBuffer::filled(width, height, DEFAULT_CLEAR_COLOR),
            textures: HashMap::new(),
            next_texture_id: 0,
            render_target: None,
            clear_color: DEFAULT_CLEAR_COLOR,
        }
    }

    pub fn with_clear_color(mut self, clear_color: [u8; 4]) -> Self {
        self.clear_color = clear_color;
        self.screen.fill(clear_color);
        self
    }

    pub fn resize_screen(&mut self, width: u32, height: u32) {
        self.screen = PixelBuffer::filled(width, height, self.clear_color);
    }

    /// Fills the screen with the clear colour, whatever the current target.
    pub fn clear_screen(&mut self) {
        self.screen.fill(self.clear_color);
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen.width, self.screen.height)
    }

    pub fn screen_pixels(&self) -> &[u8] {
        &self.screen.rgba
    }

    pub fn screen_pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.screen.pixel(x, y)
    }

    pub fn texture_pixel(&self, texture: TextureId, x: i32, y: i32) -> Option<[u8; 4]> {
        self.textures.get(&texture)?.pixels.pixel(x, y)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn current_target(&self) -> Option<TextureId> {
        self.render_target
    }

    fn allocate(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.next_texture_id);
        self.next_texture_id = self.next_texture_id.wrapping_add(1);
        self.textures.insert(id, texture);
        id
    }

    /// Runs `draw` against the current target with shared access to every
    /// other texture. A texture target is taken out of the table for the
    /// duration of the call.
    fn with_target<R>(
        &mut self,
        draw: impl FnOnce(&HashMap<TextureId, Texture>, &mut PixelBuffer, bool) -> R,
    ) -> R {
        match self.render_target {
            None => draw(&self.textures, &mut self.screen, false),
            Some(id) => {
                let Some(mut target) = self.textures.remove(&id) else {
                    debug!(texture = id.0, "render_target_missing_falling_back_to_screen");
                    self.render_target = None;
                    return draw(&self.textures, &mut self.screen, false);
                };
                let result = draw(&self.textures, &mut target.pixels, target.transparent);
                self.textures.insert(id, target);
                result
            }
        }
    }
}

impl Window for SoftwareWindow {
    fn create_texture(&mut self, width: u32, height: u32) -> TextureId {
        self.allocate(Texture {
            pixels: PixelBuffer::filled(width, height, self.clear_color),
            transparent: false,
        })
    }

    fn create_transparent_texture(&mut self, width: u32, height: u32) -> TextureId {
        self.allocate(Texture {
            pixels: PixelBuffer::filled(width, height, TRANSPARENT),
            transparent: true,
        })
    }

    fn upload_texture(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Option<TextureId> {
        if rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(self.allocate(Texture {
            pixels: PixelBuffer {
                width,
                height,
                rgba,
            },
            transparent: true,
        }))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        if self.render_target == Some(texture) {
            self.render_target = None;
        }
    }

    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&texture)
            .map(|texture| (texture.pixels.width, texture.pixels.height))
    }

    fn set_render_target(&mut self, texture: TextureId) {
        if self.textures.contains_key(&texture) {
            self.render_target = Some(texture);
        } else {
            debug!(texture = texture.0, "set_render_target_unknown_texture");
        }
    }

    fn clear_render_target(&mut self) {
        let clear_color = self.clear_color;
        self.with_target(|_, target, transparent| {
            target.fill(if transparent { TRANSPARENT } else { clear_color });
        });
    }

    fn reset_render_target(&mut self) {
        self.render_target = None;
    }

    fn target_size(&self) -> (u32, u32) {
        self.render_target
            .and_then(|id| self.texture_size(id))
            .unwrap_or((self.screen.width, self.screen.height))
    }

    fn draw_texture(&mut self, texture: TextureId, src: Option<Rect>, dst: Option<Rect>) {
        let self_copy = if self.render_target == Some(texture) {
            self.textures.get(&texture).map(|texture| texture.pixels.clone())
        } else {
            None
        };
        self.with_target(|textures, target, _| {
            let Some(source) = self_copy
                .as_ref()
                .or_else(|| textures.get(&texture).map(|texture| &texture.pixels))
            else {
                debug!(texture = texture.0, "draw_texture_unknown_texture");
                return;
            };
            let src = src.unwrap_or_else(|| source.bounds());
            let dst = dst.unwrap_or_else(|| target.bounds());
            blit_scaled(source, src, target, dst);
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        self.with_target(|_, target, _| {
            let Some(visible) = rect.intersect(&target.bounds()) else {
                return;
            };
            for y in visible.y..visible.bottom() {
                for x in visible.x..visible.right() {
                    target.blend_pixel(x, y, color);
                }
            }
        });
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.with_target(|_, target, _| {
            let Some(visible) = rect.intersect(&target.bounds()) else {
                return;
            };
            for y in visible.y..visible.bottom() {
                for x in visible.x..visible.right() {
                    target.write_pixel(x, y, TRANSPARENT);
                }
            }
        });
    }
}

fn blit_scaled(source: &PixelBuffer, src: Rect, target: &mut PixelBuffer, dst: Rect) {
    if src.is_empty() || dst.is_empty() {
        return;
    }
    let Some(visible) = dst.intersect(&target.bounds()) else {
        return;
    };

    let (src_w, src_h) = (src.width as i64, src.height as i64);
    let (dst_w, dst_h) = (dst.width as i64, dst.height as i64);
    for out_y in visible.y..visible.bottom() {
        let sy = src.y as i64 + (out_y - dst.y) as i64 * src_h / dst_h;
        if sy < 0 || sy >= source.height as i64 {
            continue;
        }
        for out_x in visible.x..visible.right() {
            let sx = src.x as i64 + (out_x - dst.x) as i64 * src_w / dst_w;
            if sx < 0 || sx >= source.width as i64 {
                continue;
            }
            if let Some(color) = source.pixel(sx as i32, sy as i32) {
                target.blend_pixel(out_x, out_y, color);
            }
        }
    }
}

fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let src_a = src[3] as u32;
    if src_a == 0 {
        return;
    }
    if src_a == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    let dst_a = dst[3] as u32;
    let inv_a = 255 - src_a;
    let out_a = src_a + dst_a * inv_a / 255;
    if out_a == 0 {
        return;
    }
    for channel in 0..3 {
        let weighted = src[channel] as u32 * src_a * 255 + dst[channel] as u32 * dst_a * inv_a;
        dst[channel] = (weighted / (out_a * 255)).min(255) as u8;
    }
    dst[3] = out_a as u8;
}
