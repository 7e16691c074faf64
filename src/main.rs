/// Weather FX demo executable
/// Usage: weather-fx [--config <file>] [--headless <frames>] [descriptor]

use std::time::Duration;

use anyhow::{bail, Context, Result};
use weather_fx::{EngineConfig, HeadlessRunner, SurfaceSize};

const HEADLESS_SIZE: SurfaceSize = SurfaceSize::new(1280, 320);
const HEADLESS_FRAME: Duration = Duration::from_nanos(16_666_667);

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    headless: Option<u64>,
    descriptor: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                parsed.config = Some(args.next().context("--config needs a file path")?);
            }
            "--headless" => {
                let frames = args.next().context("--headless needs a frame count")?;
                parsed.headless = Some(
                    frames
                        .parse()
                        .with_context(|| format!("invalid frame count '{}'", frames))?,
                );
            }
            other if other.starts_with("--") => bail!("unknown option '{}'", other),
            _ => {
                parsed.descriptor = Some(match parsed.descriptor.take() {
                    Some(existing) => format!("{} {}", existing, arg),
                    None => arg,
                });
            }
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    if let Err(e) = env_logger::try_init() {
        eprintln!("env_logger already initialized: {}", e);
    }

    let args = parse_args(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => EngineConfig::default(),
    };

    match args.headless {
        Some(frames) => {
            let mut runner = HeadlessRunner::new(config, HEADLESS_SIZE);
            if !runner.engine().is_enabled() {
                bail!("headless engine failed to initialise");
            }
            if let Some(descriptor) = args.descriptor {
                runner.set_weather(descriptor);
            }
            let stats = runner.run(frames, HEADLESS_FRAME);
            println!(
                "{:?}: {} frames, {} live objects, {} draw calls, {} bolts",
                runner.engine().category(),
                stats.frames_rendered,
                stats.live_objects,
                stats.last_render.draw_calls,
                stats.bolts_spawned
            );
            Ok(())
        }
        #[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
        None => {
            weather_fx::host::native::run_native(config, args.descriptor)?;
            Ok(())
        }
        #[cfg(not(all(not(target_arch = "wasm32"), feature = "native")))]
        None => bail!("windowed mode needs the `native` feature; use --headless <frames>"),
    }
}
