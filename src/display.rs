pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// The monochrome bitmap the interpreter draws into. Implementations own the
/// bounds: out-of-range cells read as unset and ignore writes.
pub trait Display {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn clear(&mut self);
    fn get(&self, x: usize, y: usize) -> bool;
    fn set(&mut self, x: usize, y: usize, on: bool);
}

/// Plain in-memory bitmap, one bool per cell, row-major.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    bit_buffer: Vec<bool>,
    width: usize,
    height: usize,
    dirty: bool,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(WIDTH, HEIGHT)
    }
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            bit_buffer: vec![false; width * height],
            width,
            height,
            dirty: true,
        }
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Whether anything changed since the last call. Lets the frontend skip
    /// redundant uploads.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// 0RGB pixels for the whole bitmap
    pub fn pixels(&self, on: u32, off: u32) -> impl Iterator<Item = u32> + '_ {
        self.bit_buffer
            .iter()
            .map(move |bit| if *bit { on } else { off })
    }

    pub fn lit_count(&self) -> usize {
        self.bit_buffer.iter().filter(|bit| **bit).count()
    }
}

impl Display for FrameBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.bit_buffer.fill(false);
        self.dirty = true;
    }

    fn get(&self, x: usize, y: usize) -> bool {
        self.index(x, y).map_or(false, |i| self.bit_buffer[i])
    }

    fn set(&mut self, x: usize, y: usize, on: bool) {
        if let Some(i) = self.index(x, y) {
            if self.bit_buffer[i] != on {
                self.bit_buffer[i] = on;
                self.dirty = true;
            }
        }
    }
}
