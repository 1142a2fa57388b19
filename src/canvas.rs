//! RGB canvas for synthetic scene rendering and grid overlays.
//!
//! Trials are judged purely on geometry, so scene images only need flat
//! shapes: a white background, colored buttons, a black cursor square and an
//! optional measurement grid for the vision model.

use image::{ImageBuffer, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Result type for canvas operations
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur while encoding or decoding canvas images
#[derive(Debug)]
pub enum CanvasError {
    /// PNG encode/decode failure
    Image(String),
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for CanvasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanvasError::Image(msg) => write!(f, "Image error: {}", msg),
            CanvasError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CanvasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CanvasError::Image(_) => None,
            CanvasError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CanvasError {
    fn from(err: std::io::Error) -> Self {
        CanvasError::Io(err)
    }
}

/// An in-memory RGB drawing surface
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
}

impl Canvas {
    /// Create a canvas filled with a single color
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Self {
        let mut canvas = Self {
            width,
            height,
            buffer: vec![0u8; (width * height * 3) as usize],
        };
        canvas.fill(background);
        canvas
    }

    /// Load a canvas from PNG image bytes
    pub fn from_png_bytes(data: &[u8]) -> CanvasResult<Self> {
        let img = image::load_from_memory(data)
            .map_err(|e| CanvasError::Image(format!("Failed to load PNG: {}", e)))?;
        let rgb = img.to_rgb8();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            buffer: rgb.into_raw(),
        })
    }

    /// Load a canvas from a PNG file on disk
    pub fn from_png_file(path: &Path) -> CanvasResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_png_bytes(&data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill the entire canvas with a color
    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Draw a filled axis-aligned rectangle. Out-of-bounds parts are clipped.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..y + h as i32 {
            for px in x..x + w as i32 {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Draw a 1px rectangle outline
    pub fn outline_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 3]) {
        let (w, h) = (w as i32, h as i32);
        for px in x..x + w {
            self.set_pixel(px, y, color);
            self.set_pixel(px, y + h - 1, color);
        }
        for py in y..y + h {
            self.set_pixel(x, py, color);
            self.set_pixel(x + w - 1, py, color);
        }
    }

    /// Draw a filled rectangle centered on (cx, cy) with a 1px outline.
    ///
    /// This is the button shape used by synthetic scenes.
    pub fn draw_button(&mut self, cx: i32, cy: i32, w: u32, h: u32, fill: [u8; 3], outline: [u8; 3]) {
        let x = cx - w as i32 / 2;
        let y = cy - h as i32 / 2;
        self.fill_rect(x, y, w, h, fill);
        self.outline_rect(x, y, w, h, outline);
    }

    /// Overlay a measurement grid of 1px lines every `spacing` pixels.
    ///
    /// Lines run through x = 0, spacing, 2*spacing, ... (same for y), so the
    /// grid cells a vision model counts are exactly `spacing` pixels wide.
    pub fn draw_grid(&mut self, spacing: u32, color: [u8; 3]) {
        if spacing == 0 {
            return;
        }
        let mut x = 0;
        while x < self.width {
            for y in 0..self.height {
                self.set_pixel(x as i32, y as i32, color);
            }
            x += spacing;
        }
        let mut y = 0;
        while y < self.height {
            for x in 0..self.width {
                self.set_pixel(x as i32, y as i32, color);
            }
            y += spacing;
        }
    }

    /// Get the color of a pixel. Out-of-bounds reads return black.
    pub fn get_pixel(&self, x: i32, y: i32) -> [u8; 3] {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return [0, 0, 0];
        }
        let idx = ((y as u32 * self.width + x as u32) * 3) as usize;
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    /// Set the color of a pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: [u8; 3]) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 3) as usize;
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    /// Convert to an image buffer
    pub fn to_image(&self) -> RgbImage {
        ImageBuffer::from_raw(self.width, self.height, self.buffer.clone())
            .expect("Buffer size should match dimensions")
    }

    /// Encode the canvas as PNG bytes
    pub fn to_png(&self) -> CanvasResult<Vec<u8>> {
        let img = self.to_image();
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| CanvasError::Image(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }

    /// Write the canvas to a PNG file
    pub fn save(&self, path: &Path) -> CanvasResult<()> {
        std::fs::write(path, self.to_png()?)?;
        Ok(())
    }
}
