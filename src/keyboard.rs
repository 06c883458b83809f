use minifb::Key;

/// Host keys for the 16 logical keys, laid out like the COSMAC VIP keypad
///
///   1 2 3 C        1 2 3 4
///   4 5 6 D   <-   Q W E R
///   7 8 9 E        A S D F
///   A 0 B F        Z X C V
pub const KEYMAP: [(Key, u8); 16] = [
    (Key::Key1, 0x1),
    (Key::Key2, 0x2),
    (Key::Key3, 0x3),
    (Key::Key4, 0xC),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xD),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xE),
    (Key::Z, 0xA),
    (Key::X, 0x0),
    (Key::C, 0xB),
    (Key::V, 0xF),
];

/// What the interpreter may ask about the keypad.
pub trait Input {
    /// is logical key `key` (0x0 -> 0xF) held right now
    fn is_held(&self, key: u8) -> bool;

    /// lowest-numbered held key, if any
    fn first_held(&self) -> Option<u8> {
        (0..16).find(|key| self.is_held(*key))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    keys: [bool; 16],
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.keys = [false; 16];
    }

    pub fn press(&mut self, key: u8) {
        self.keys[(key & 0xF) as usize] = true;
    }

    pub fn release(&mut self, key: u8) {
        self.keys[(key & 0xF) as usize] = false;
    }

    /// Refresh every logical key from a host "is this key down" query.
    pub fn update_from(&mut self, is_down: impl Fn(Key) -> bool) {
        for (host, logical) in KEYMAP {
            self.keys[logical as usize] = is_down(host);
        }
    }
}

impl Input for Keyboard {
    fn is_held(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }
}
