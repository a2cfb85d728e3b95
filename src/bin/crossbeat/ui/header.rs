//! Header bar - play/stop control, tempo, volume and engine stats

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crossbeat::{
    engine::CpalBackend,
    playback::PlaybackController,
    presentation::{volume_label, TransportControl},
};

pub fn render_header(
    frame: &mut Frame,
    area: Rect,
    controller: &PlaybackController<CpalBackend>,
    status: Option<&str>,
) {
    let block = Block::default().title(" crossbeat ").borders(Borders::ALL);

    let control = TransportControl::for_state(controller.state());
    let control_color = match control {
        TransportControl::Play => Color::Green,
        TransportControl::Stop => Color::Yellow,
    };
    let engine = controller.backend().snapshot();

    let mut spans = vec![
        Span::styled(
            format!(" [{}]  ", control.label()),
            Style::default()
                .fg(control_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tempo: {:.0}  ", controller.tempo()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Volume: {}  ", volume_label(controller.volume())),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Clock: {:.0} BPM  ", engine.bpm),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("{:.1}kHz", engine.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if let Some(status) = status {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
