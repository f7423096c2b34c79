use super::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Render-target abstraction used by maps, characters and the world.
///
/// `None` as a source rect means the whole texture; `None` as a destination
/// rect means the whole current render target. Draws are nearest-neighbour
/// scaled and alpha blended. Source pixels outside the texture leave the
/// destination untouched.
pub trait Window {
    fn create_texture(&mut self, width: u32, height: u32) -> TextureId;
    fn create_transparent_texture(&mut self, width: u32, height: u32) -> TextureId;
    fn upload_texture(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Option<TextureId>;
    fn destroy_texture(&mut self, texture: TextureId);
    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)>;

    fn set_render_target(&mut self, texture: TextureId);
    fn clear_render_target(&mut self);
    fn reset_render_target(&mut self);
    fn target_size(&self) -> (u32, u32);

    fn draw_texture(&mut self, texture: TextureId, src: Option<Rect>, dst: Option<Rect>);
    fn fill_rect(&mut self, rect: Rect, color: [u8; 4]);
    /// Overwrites `rect` with fully transparent pixels.
    fn clear_rect(&mut self, rect: Rect);
}
