//! Crossbeat - application builder and runners

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing::info;

use crossbeat::{
    config::SessionConfig,
    engine::CpalBackend,
    playback::{OfflineBackend, PlaybackController},
    rhythm::Side,
};

use super::ui::UiApp;

/// Samples kept in flight between the audio thread and the oscilloscope
const SCOPE_CAPACITY: usize = 16_384;

/// Offline step for `--simulate`
const SIMULATE_STEP_SECONDS: f64 = 0.01;

/// Main application builder
pub struct Crossbeat {
    session: SessionConfig,
}

impl Crossbeat {
    pub fn new() -> Self {
        Self {
            session: SessionConfig::default(),
        }
    }

    /// Starting values for the session
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Run the terminal UI with live audio
    pub fn run(self) -> EyreResult<()> {
        let (backend, scope) = CpalBackend::with_scope(SCOPE_CAPACITY);
        let mut controller = PlaybackController::new(backend);
        self.session
            .apply(&mut controller)
            .wrap_err("invalid session settings")?;
        info!("starting terminal UI");

        let mut terminal = ratatui::init();
        let result = UiApp::new(controller, scope).run(&mut terminal);
        ratatui::restore();
        result
    }

    /// Drive the core without audio and print every fired note
    pub fn simulate(self, seconds: f64) -> EyreResult<()> {
        let mut controller = PlaybackController::new(OfflineBackend::new());
        self.session
            .apply(&mut controller)
            .wrap_err("invalid session settings")?;

        println!("=== crossbeat (simulated) ===");
        println!(
            "Beats: {} against {}",
            controller.rhythm().left_beats(),
            controller.rhythm().right_beats()
        );
        println!(
            "Notes: {} / {}",
            controller.note(Side::Left),
            controller.note(Side::Right)
        );
        println!("Transport: {:.1} BPM", controller.transport_bpm());

        controller.start()?;
        let mut shortest = f64::INFINITY;
        for scheduler in controller.loops() {
            let interval = scheduler.interval().to_seconds(controller.transport_bpm());
            shortest = shortest.min(interval);
            println!(
                "  {:<5} every {} ({:.3}s)",
                scheduler.side().to_string(),
                scheduler.interval(),
                interval
            );
        }
        println!();

        // At most one fire per voice per step, so the lit square belongs to
        // the note just printed
        let step_limit = SIMULATE_STEP_SECONDS.min(shortest / 2.0);
        let mut fired = [0u64; 2];
        let mut elapsed = 0.0;
        while elapsed < seconds {
            let step = step_limit.min(seconds - elapsed);
            controller.backend_mut().advance(step);
            elapsed += step;

            for note in controller.backend_mut().take_notes() {
                let voice = controller.voice(note.side);
                let square = voice
                    .lit_square()
                    .map_or_else(|| "-".to_string(), |i| (i + 1).to_string());
                println!(
                    "{:>9.4}s  {:<5}  {:<3}  square {}/{}",
                    note.time,
                    note.side.to_string(),
                    note.pitch.to_string(),
                    square,
                    voice.beats
                );
                fired[if note.side == Side::Left { 0 } else { 1 }] += 1;
            }
        }

        controller.stop();
        println!();
        println!("Fired: left {}  right {}", fired[0], fired[1]);
        Ok(())
    }
}

impl Default for Crossbeat {
    fn default() -> Self {
        Self::new()
    }
}
