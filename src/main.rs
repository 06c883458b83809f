use std::{fs, time::Instant};

use chip8vm::{
    config::Args,
    display::FrameBuffer,
    keyboard::Keyboard,
    scheduler::Scheduler,
    sound::Tone,
    window::Frontend,
    Emulator, FrontendError, Mode, State,
};
use clap::Parser;
use log::{info, warn};
use simple_logger::SimpleLogger;

// Separately:
// CPU: --ips times per second
// Timers + display + keys: 60 times per second

fn main() -> Result<(), FrontendError> {
    let args = Args::parse();
    SimpleLogger::new()
        .with_level(args.log_level())
        .env()
        .init()?;

    let program = fs::read(&args.rom)?;
    let (fb, keyboard) = (FrameBuffer::default(), Keyboard::new());
    let mut frontend = Frontend::new(&fb, args.scale.into())?;
    let mode = Mode::from(args.mode);
    let mut emu = match args.seed {
        Some(seed) => Emulator::with_seed(fb, keyboard, mode, seed),
        None => Emulator::new(fb, keyboard, mode),
    };
    emu.load_program(&program)?;
    info!("running {} in {:?} mode at {} Hz", args.rom.display(), mode, args.ips);

    let mut tone = if args.mute {
        None
    } else {
        Tone::new()
            .map_err(|e| warn!("audio disabled: {e}"))
            .ok()
    };

    let mut scheduler = Scheduler::new(args.ips, Instant::now());
    while frontend.is_open() {
        let ticks = scheduler.poll(Instant::now());

        for _ in 0..ticks.timers {
            emu.tick_timers();
        }
        if ticks.timers > 0 {
            frontend.sync(emu.display_mut())?;
            frontend.poll_keys(emu.input_mut());
            if let Some(t) = tone.as_mut() {
                if let Err(e) = t.set_active(emu.timers.sound.is_active()) {
                    warn!("audio disabled: {e}");
                    tone = None;
                }
            }
        }

        // once halted, the last frame stays up until the window is closed
        for _ in 0..ticks.instructions {
            if emu.state() == State::Halted {
                break;
            }
            if let Err(e) = emu.step() {
                warn!("program stopped: {e}");
                break;
            }
        }

        let (now, deadline) = (Instant::now(), scheduler.next_deadline());
        if deadline > now {
            spin_sleep::sleep(deadline - now);
        }
    }
    Ok(())
}
