use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    thread,
    time::{Duration, Instant},
};

use channel_deck_core::{
    audio::{
        analyse,
        synth::{CLICK_DURATION, HOVER_DURATION},
        write_wav,
    },
    AnimationController, AppConfig, AudioHost, Clock, CommandRecorder, DeckError, Dispatcher, InputEvent,
    Key, ManualClock, MotionAnimator, OfflineMixer, SharedSurfaceSize, SignalGenerator,
    SurfaceSize, SvgSurface, SystemClock, WaveLoop, WaveRenderer,
};
use clap::{Parser, Subcommand, ValueEnum};
use rand::Rng;
use tracing_subscriber::EnvFilter;

fn main() -> channel_deck_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Frame { at_ms, output } => render_frame(&config, at_ms, &output),
        Commands::Sequence { frames, output_dir } => render_sequence(&config, frames, &output_dir),
        Commands::Tone { kind, output } => render_tone(&config, kind, &output),
        Commands::Run { seconds, snapshot } => run_paced(&config, seconds, snapshot.as_deref()),
    }
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> channel_deck_core::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

fn surface_size(config: &AppConfig) -> SurfaceSize {
    SurfaceSize::new(config.surface.width, config.surface.height)
}

fn render_frame(config: &AppConfig, at_ms: f64, output: &Path) -> channel_deck_core::Result<()> {
    tracing::info!(at_ms, ?output, "rendering frame");

    let size = surface_size(config);
    let renderer = WaveRenderer::new(config.waves.clone(), SharedSurfaceSize::new(size), 0.0)?;
    let mut svg = SvgSurface::new(size);
    renderer.draw(&mut svg, at_ms);
    fs::write(output, svg.finish())?;
    Ok(())
}

fn render_sequence(config: &AppConfig, frames: usize, output_dir: &Path) -> channel_deck_core::Result<()> {
    tracing::info!(frames, ?output_dir, "rendering frame sequence");
    fs::create_dir_all(output_dir)?;

    let clock = ManualClock::new(0.0);
    let size = SharedSurfaceSize::new(surface_size(config));
    let renderer = WaveRenderer::new(config.waves.clone(), size.clone(), clock.now_ms())?;
    let waves = Rc::new(RefCell::new(WaveLoop::new(renderer, CommandRecorder::new())));
    let mut rng = config.rng();
    let motion = Rc::new(RefCell::new(MotionAnimator::seeded(
        config.deck.channels.len(),
        &config.motion,
        &mut rng,
    )));

    let mut controller = AnimationController::new(clock.clone());
    controller.register(waves.clone());
    controller.register(motion.clone());
    controller.start();

    let frame_ms = 1000.0 / config.surface.frame_rate;
    let mut timeline = Vec::with_capacity(frames);
    for index in 0..frames {
        controller.step();

        let commands = waves
            .borrow_mut()
            .surface_mut()
            .map(CommandRecorder::take)
            .unwrap_or_default();
        let svg = SvgSurface::from_commands(size.get(), &commands).finish();
        fs::write(output_dir.join(format!("frame_{index:04}.svg")), svg)?;

        let transforms: Vec<String> = motion
            .borrow()
            .transforms()
            .iter()
            .map(ToString::to_string)
            .collect();
        timeline.push(serde_json::json!({
            "frame": index,
            "time_ms": clock.now_ms(),
            "transforms": transforms,
        }));
        clock.advance(frame_ms);
    }
    controller.teardown();

    let motion_path = output_dir.join("motion.json");
    fs::write(&motion_path, serde_json::to_string_pretty(&timeline)?)?;
    tracing::info!(frames, ?motion_path, "sequence written");
    Ok(())
}

fn render_tone(config: &AppConfig, kind: ToneKind, output: &Path) -> channel_deck_core::Result<()> {
    let sample_rate = config.audio.sample_rate;
    let mut tones = SignalGenerator::new(OfflineMixer::new(sample_rate), config.rng());
    let duration = match kind {
        ToneKind::Hover => {
            tones.hover_tone();
            HOVER_DURATION
        }
        ToneKind::Click => {
            tones.click_tone();
            CLICK_DURATION
        }
    };

    let host = tones
        .host_mut()
        .ok_or_else(|| DeckError::msg("audio host unavailable"))?;
    let total = (duration * f64::from(sample_rate)).ceil() as usize;
    let mut samples = vec![0.0_f32; total];
    for block in samples.chunks_mut(config.audio.block_size) {
        host.render(block);
    }

    write_wav(output, &samples, sample_rate)?;
    let report = analyse(&samples, sample_rate)?;
    tracing::info!(
        ?kind,
        ?output,
        duration_seconds = report.duration_seconds,
        rms = report.rms,
        peak = report.peak,
        centroid_hz = report.spectral_centroid_hz,
        "tone rendered"
    );
    Ok(())
}

#[cfg(feature = "device")]
fn run_paced(config: &AppConfig, seconds: f64, snapshot: Option<&Path>) -> channel_deck_core::Result<()> {
    use channel_deck_core::audio::DeviceHost;

    let mut rng = config.rng();
    let motion = MotionAnimator::seeded(config.deck.channels.len(), &config.motion, &mut rng);

    match DeviceHost::open() {
        Ok(host) => {
            let tones = SignalGenerator::new(host, rng);
            let deck = run_loop(config, seconds, snapshot, motion, tones, |_| {})?;
            let host = deck.tones().host();
            tracing::info!(
                scheduled_voices = host.map_or(0, DeviceHost::scheduled_voices),
                active_voices = host.map_or(0, DeviceHost::active_voices),
                "audio output closed"
            );
        }
        Err(err) => {
            tracing::warn!(%err, "audio output unavailable; tones disabled");
            let tones: SignalGenerator<OfflineMixer, _> = SignalGenerator::detached(rng);
            run_loop(config, seconds, snapshot, motion, tones, |_| {})?;
        }
    }
    Ok(())
}

/// Without an output device the mix is rendered in step with the frames and
/// only its level is reported.
#[cfg(not(feature = "device"))]
fn run_paced(config: &AppConfig, seconds: f64, snapshot: Option<&Path>) -> channel_deck_core::Result<()> {
    tracing::info!("built without the `device` feature; tones are mixed offline");

    let mut rng = config.rng();
    let motion = MotionAnimator::seeded(config.deck.channels.len(), &config.motion, &mut rng);

    let block_len = (f64::from(config.audio.sample_rate) / config.surface.frame_rate).round() as usize;
    let mut block = vec![0.0_f32; block_len.max(1)];
    let mut peak = 0.0_f32;

    let tones = SignalGenerator::new(OfflineMixer::suspended(config.audio.sample_rate), rng);
    let deck = run_loop(config, seconds, snapshot, motion, tones, |mixer: &mut OfflineMixer| {
        mixer.render(&mut block);
        peak = block.iter().fold(peak, |acc, sample| acc.max(sample.abs()));
    })?;
    let host = deck.tones().host();
    tracing::info!(
        peak,
        scheduled_voices = host.map_or(0, OfflineMixer::scheduled_voices),
        active_voices = host.map_or(0, OfflineMixer::active_voices),
        "offline mix finished"
    );
    Ok(())
}

/// Paces the animation controller on the system clock, feeds scripted input
/// to the deck and calls `pump` with the audio host once per frame.
fn run_loop<H, R>(
    config: &AppConfig,
    seconds: f64,
    snapshot: Option<&Path>,
    motion: MotionAnimator,
    tones: SignalGenerator<H, R>,
    mut pump: impl FnMut(&mut H),
) -> channel_deck_core::Result<Dispatcher<H, R>>
where
    H: AudioHost,
    R: Rng,
{
    tracing::info!(seconds, frame_rate = config.surface.frame_rate, "starting paced loop");

    let clock = SystemClock::start();
    let size = SharedSurfaceSize::new(surface_size(config));
    let renderer = WaveRenderer::new(config.waves.clone(), size.clone(), clock.now_ms())?;
    let waves = Rc::new(RefCell::new(WaveLoop::new(renderer, CommandRecorder::new())));
    let mut deck = Dispatcher::new(config.deck.channels.clone(), config.deck.columns, tones);

    let mut controller = AnimationController::new(clock);
    controller.register(waves.clone());
    controller.register(motion);
    controller.start();

    let frame_budget = Duration::from_secs_f64(1.0 / config.surface.frame_rate);

    // The first pointer event doubles as the user gesture that unlocks audio.
    deck.handle(InputEvent::PointerEnter(0));

    let started = Instant::now();
    let mut overruns = 0_u64;
    let mut last_second = 0;
    let mut last_frame = Vec::new();
    while started.elapsed().as_secs_f64() < seconds {
        let frame_start = Instant::now();
        controller.step();
        if let Some(surface) = waves.borrow_mut().surface_mut() {
            last_frame = surface.take();
        }

        // Scripted input: walk focus once per second, then open the last tile.
        let second = started.elapsed().as_secs();
        if second != last_second {
            last_second = second;
            let last = deck.channels().len().saturating_sub(1);
            let event = if deck.focused() >= last {
                InputEvent::TileKey {
                    tile: last,
                    key: Key::Enter,
                }
            } else {
                InputEvent::DocumentKey {
                    key: Key::ArrowRight,
                    active_tile: None,
                }
            };
            deck.handle(event);
        }
        if let Some(host) = deck.tones_mut().host_mut() {
            pump(host);
        }

        let spent = frame_start.elapsed();
        if spent > frame_budget {
            overruns += 1;
            tracing::warn!(?spent, ?frame_budget, "frame over budget");
        } else {
            thread::sleep(frame_budget - spent);
        }
    }
    controller.teardown();

    if let Some(path) = snapshot {
        fs::write(path, SvgSurface::from_commands(size.get(), &last_frame).finish())?;
        tracing::info!(?path, "last frame written");
    }
    tracing::info!(
        frames = controller.frames(),
        overruns,
        focused = deck.focused(),
        panel_open = deck.panel().is_visible(),
        "paced loop finished"
    );
    Ok(deck)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated channel deck renderer", long_about = None)]
struct Cli {
    /// JSON configuration file; built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Seed for tile motion and click noise, overriding the configuration.
    #[arg(short, long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a single background frame to SVG.
    Frame {
        /// Elapsed time of the frame in milliseconds.
        #[arg(long, default_value_t = 0.0)]
        at_ms: f64,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Step the animation loop and write SVG frames plus tile transforms.
    Sequence {
        #[arg(short, long, default_value_t = 60)]
        frames: usize,
        #[arg(short = 'd', long)]
        output_dir: PathBuf,
    },
    /// Synthesize an interface tone to a WAV file.
    Tone {
        #[arg(value_enum)]
        kind: ToneKind,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the frame loop in real time with scripted input, playing tones on
    /// the default output device when built with the `device` feature.
    Run {
        #[arg(long, default_value_t = 5.0)]
        seconds: f64,
        /// Write the last rendered frame to this SVG file.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ToneKind {
    Hover,
    Click,
}
