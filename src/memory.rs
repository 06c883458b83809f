use crate::error::Chip8Error;

pub type TypeAddr = u16; // in reality u12
type FontBytes = [u8; 5 * 16];

pub const MEMORY_SIZE: usize = 4096;
pub const ADDR_MASK: TypeAddr = 0x0FFF;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const FONT_START: TypeAddr = 0x050;
pub const GLYPH_BYTES: TypeAddr = 5;
pub const STACK_DEPTH: usize = 16;

const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Flat 4K address space. Every access is masked to 12 bits, so addressing
/// wraps instead of failing.
///
/// 000 -> 04F is empty by convention, glyphs live at 050 -> 09F and programs
/// are loaded from 200.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            bytes: [0; MEMORY_SIZE],
        }
    }

    pub fn write(&mut self, addr: TypeAddr, val: u8) {
        self.bytes[(addr & ADDR_MASK) as usize] = val;
    }

    pub fn read(&self, addr: TypeAddr) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    /// big-endian word at `addr`; the second byte wraps to 000 at the top
    pub fn read_word(&self, addr: TypeAddr) -> u16 {
        let (hi, lo) = (self.read(addr), self.read(addr.wrapping_add(1)));
        ((hi as u16) << 8) | lo as u16
    }

    pub fn load_font(&mut self, offset: TypeAddr) {
        for (i, glyph_row) in DEFAULT_FONT.iter().enumerate() {
            self.write(offset.wrapping_add(i as TypeAddr), *glyph_row);
        }
    }

    /// Copies an image to `PROGRAM_START`. Memory past the image is zeroed so
    /// a stale image never leaks into the new one.
    pub fn load_program(&mut self, bytes: &[u8]) -> Result<(), Chip8Error> {
        let start = PROGRAM_START as usize;
        let capacity = MEMORY_SIZE - start;
        if bytes.len() > capacity {
            return Err(Chip8Error::ImageTooLarge {
                size: bytes.len(),
                capacity,
            });
        }
        self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
        self.bytes[start + bytes.len()..].fill(0);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

/// Bounded stack of return addresses.
pub struct Stack {
    addresses: Vec<TypeAddr>,
    capacity: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::with_capacity(STACK_DEPTH)
    }
}

impl Stack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            addresses: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// `target` is only used to report where the failed call was heading
    pub fn push(&mut self, addr: TypeAddr, target: TypeAddr) -> Result<(), Chip8Error> {
        if self.addresses.len() >= self.capacity {
            return Err(Chip8Error::StackOverflow { target });
        }
        self.addresses.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<TypeAddr, Chip8Error> {
        self.addresses.pop().ok_or(Chip8Error::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.addresses.len()
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
    }
}
