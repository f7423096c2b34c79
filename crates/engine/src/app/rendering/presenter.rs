use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window as OsWindow;

use super::SoftwareWindow;

/// Copies the software screen into a `pixels` surface. The pixel buffer keeps
/// the logical resolution; `pixels` scales it to the OS window.
pub struct Presenter {
    pixels: Pixels<'static>,
    logical_size: (u32, u32),
}

impl Presenter {
    pub fn new(
        window: &'static OsWindow,
        logical_width: u32,
        logical_height: u32,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), window);
        let pixels = Pixels::new(logical_width, logical_height, surface)?;
        Ok(Self {
            pixels,
            logical_size: (logical_width, logical_height),
        })
    }

    pub fn logical_size(&self) -> (u32, u32) {
        self.logical_size
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub fn present(&mut self, screen: &SoftwareWindow) -> Result<(), Error> {
        if screen.screen_size() != self.logical_size {
            return Ok(());
        }
        let frame = self.pixels.frame_mut();
        let pixels = screen.screen_pixels();
        if frame.len() == pixels.len() {
            frame.copy_from_slice(pixels);
        }
        self.pixels.render()
    }
}
