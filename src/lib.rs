// 16 8-bit data registers named V0 to VF, VF doubling as a flag
// I -> address register (12 bits)
//
// Stack of return addresses for 2NNN / 00EE
//
// Delay timer & Sound timer: count down at 60 times / s until 0,
// independent of the instruction rate
//
// Display res: 64 width, 32 height, XOR sprites
//
// 35 opcodes, each 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier

pub mod config;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod scheduler;
pub mod sound;
pub mod timer;
pub mod window;

pub use emulator::{Emulator, Mode, State};
pub use error::{Chip8Error, FrontendError};
