use std::time::{Duration, Instant};
use std::{env, fs, process, thread};

use ember8::Builder;
use log::{error, info};

use ember_host::render::render;
use ember_host::{Args, HeadlessContext, HostError};

const FRAME_RATE: u64 = 60;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        error!("{}", err);
        eprintln!("ember: {}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), HostError> {
    let args = Args::parse(env::args().skip(1))?;
    let rom = fs::read(&args.rom)?;
    info!("running {} for {}s", args.rom.display(), args.seconds);

    let mut chip = Builder::new()
        .with_context(HeadlessContext::new(args.keys))
        .with_program(&rom)
        .with_rate(args.rate)
        .build()?;

    let timeout = Duration::from_secs_f64(args.seconds);
    let period = Duration::from_nanos(1_000_000_000u64 / FRAME_RATE);
    let started = Instant::now();
    let mut previous = started;
    let result = loop {
        let now = Instant::now();
        if now.duration_since(started) >= timeout {
            break Ok(());
        }
        let elapsed = now.duration_since(previous);
        if elapsed >= period {
            if let Err(err) = chip.tick(elapsed.as_secs_f64()) {
                break Err(err);
            }
            previous = now;
        } else {
            thread::sleep(period - elapsed);
        }
    };

    print!("{}", render(chip.frame()));
    info!("{} frames drawn", chip.ctx.frames_received());
    result.map_err(HostError::from)
}
