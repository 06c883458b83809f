use minifb::{Key, Scale, Window, WindowOptions};

use crate::{
    display::{Display, FrameBuffer},
    error::FrontendError,
    keyboard::Keyboard,
};

fn from_u16_rgb(r: u16, g: u16, b: u16) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

/// Desktop window showing the frame buffer and feeding the keypad.
pub struct Frontend {
    window: Window,
    pixel_buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl Frontend {
    pub fn new(fb: &FrameBuffer, scale: Scale) -> Result<Self, FrontendError> {
        let (width, height) = (fb.width(), fb.height());
        let mut window = Window::new(
            "chip8vm - ESC to exit",
            width,
            height,
            WindowOptions {
                scale,
                ..WindowOptions::default()
            },
        )?;
        window.set_position(500, 300);
        Ok(Self {
            window,
            pixel_buffer: vec![0; width * height],
            width,
            height,
        })
    }

    /// Closing the window or pressing Escape is the quit signal.
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// Presents the frame buffer if it changed, and pumps window events
    /// either way.
    pub fn sync(&mut self, fb: &mut FrameBuffer) -> Result<(), FrontendError> {
        if fb.take_dirty() {
            let (on, off) = (from_u16_rgb(0, 127, 255), from_u16_rgb(0, 0, 0));
            for (dst, px) in self.pixel_buffer.iter_mut().zip(fb.pixels(on, off)) {
                *dst = px;
            }
            self.window
                .update_with_buffer(&self.pixel_buffer, self.width, self.height)?;
        } else {
            self.window.update();
        }
        Ok(())
    }

    pub fn poll_keys(&self, keyboard: &mut Keyboard) {
        keyboard.update_from(|key| self.window.is_key_down(key));
    }
}
