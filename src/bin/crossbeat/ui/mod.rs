//! TUI module for crossbeat
//!
//! Two rhythm panels, a header with the transport controls and an
//! oscilloscope of the output.

mod header;
mod panel;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use std::time::Duration;
use tracing::warn;

use crossbeat::{
    engine::CpalBackend,
    playback::PlaybackController,
    presentation::{panel_for, PanelView},
    rhythm::Side,
};

use header::render_header;
use panel::render_panel;
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

/// Longest beat count that can be typed
const MAX_INPUT_DIGITS: usize = 4;

pub struct UiApp {
    controller: PlaybackController<CpalBackend>,
    /// Stereo frames tapped from the audio thread
    audio_rx: Consumer<[f32; 2]>,
    audio_buffer: Vec<[f32; 2]>,
    /// Panel taking beat input, named by its beat side
    focus: Side,
    /// Digits typed but not yet submitted
    input: String,
    /// Last activation failure
    status: Option<String>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(controller: PlaybackController<CpalBackend>, audio_rx: Consumer<[f32; 2]>) -> Self {
        Self {
            controller,
            audio_rx,
            audio_buffer: vec![[0.0; 2]; VIS_BUFFER_SIZE],
            focus: Side::Left,
            input: String::new(),
            status: None,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.controller.stop();
        Ok(())
    }

    fn poll_audio(&mut self) {
        while let Ok(frame) = self.audio_rx.pop() {
            self.audio_buffer.push(frame);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => match self.controller.toggle() {
                Ok(()) => self.status = None,
                Err(err) => self.status = Some(err.to_string()),
            },
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.other();
                self.input.clear();
            }
            KeyCode::Up => self.nudge_beats(1),
            KeyCode::Down => self.nudge_beats(-1),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.input.len() < MAX_INPUT_DIGITS {
                    self.input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                if !self.input.is_empty() {
                    // A rejected value flags the panel; nothing else to do
                    let _ = self.controller.set_beats_text(self.focus, &self.input);
                    self.input.clear();
                }
            }
            KeyCode::Char('n') => self.step_pitch(1),
            KeyCode::Char('N') => self.step_pitch(-1),
            KeyCode::Left => self.nudge_tempo(-1.0),
            KeyCode::Right => self.nudge_tempo(1.0),
            KeyCode::Char('-') => {
                self.controller.step_volume(-1);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.controller.step_volume(1);
            }
            _ => {}
        }
    }

    fn nudge_beats(&mut self, delta: i64) {
        let beats = self.controller.rhythm().beats(self.focus) as i64;
        if let Err(err) = self.controller.set_beats(self.focus, Some(beats + delta)) {
            warn!(%err, "beat nudge rejected");
        }
    }

    /// Step the pitch selector shown in the focused panel
    fn step_pitch(&mut self, delta: i32) {
        let side = panel_for(self.focus).pitch_side;
        self.controller.step_note(side, delta);
    }

    fn nudge_tempo(&mut self, delta: f64) {
        let tempo = self.controller.tempo();
        self.controller.set_tempo(tempo + delta);
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(8),    // Panels
                Constraint::Length(8), // Waveform
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        render_header(frame, chunks[0], &self.controller, self.status.as_deref());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        for (view, column) in PanelView::all(&self.controller).iter().zip(columns.iter()) {
            let focused = view.layout.beats_side == self.focus;
            let input = (focused && !self.input.is_empty()).then_some(self.input.as_str());
            render_panel(frame, *column, view, focused, input);
        }

        render_waveform(frame, chunks[2], &self.audio_buffer, &self.controller);

        let help = Paragraph::new(
            " [Space] Play/Stop  [Tab] Panel  [↑↓/0-9 Enter] Beats  [n/N] Pitch  [←→] Tempo  [-/+] Volume  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
