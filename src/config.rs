use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use minifb::Scale;

use crate::emulator::Mode;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatMode {
    /// COSMAC VIP behaviour
    Legacy,
    /// CHIP-48 / SUPER-CHIP behaviour
    Modern,
}

impl From<CompatMode> for Mode {
    fn from(mode: CompatMode) -> Self {
        match mode {
            CompatMode::Legacy => Mode::Legacy,
            CompatMode::Modern => Mode::Modern,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowScale {
    #[value(name = "1")]
    X1,
    #[value(name = "2")]
    X2,
    #[value(name = "4")]
    X4,
    #[value(name = "8")]
    X8,
    #[value(name = "16")]
    X16,
    #[value(name = "32")]
    X32,
}

impl From<WindowScale> for Scale {
    fn from(scale: WindowScale) -> Self {
        match scale {
            WindowScale::X1 => Scale::X1,
            WindowScale::X2 => Scale::X2,
            WindowScale::X4 => Scale::X4,
            WindowScale::X8 => Scale::X8,
            WindowScale::X16 => Scale::X16,
            WindowScale::X32 => Scale::X32,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chip8vm", version, about = "CHIP-8 interpreter")]
pub struct Args {
    /// Program image, loaded verbatim at 0x200
    pub rom: PathBuf,

    /// Behaviour of the opcodes that differ between interpreters
    #[arg(long, value_enum)]
    pub mode: CompatMode,

    /// Instructions executed per second
    #[arg(long, default_value_t = 700, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub ips: u32,

    /// Window pixels per CHIP-8 pixel
    #[arg(long, value_enum, default_value_t = WindowScale::X16)]
    pub scale: WindowScale,

    /// Seed for the CXNN random source
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not open an audio device
    #[arg(long)]
    pub mute: bool,

    /// More logging; repeat for instruction traces
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
