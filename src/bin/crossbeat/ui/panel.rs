//! Rhythm panel - beat count, square row and the paired pitch selector

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crossbeat::presentation::PanelView;

pub fn render_panel(
    frame: &mut Frame,
    area: Rect,
    view: &PanelView,
    focused: bool,
    input: Option<&str>,
) {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .title(format!(" {} ", view.layout.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let beats = match input {
        Some(text) => Span::styled(
            format!(" Beats: {text}_"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(format!(" Beats: {}", view.beats), Style::default().fg(Color::White)),
    };
    let mut lines = vec![Line::from(vec![
        beats,
        Span::styled(
            format!("  ({}-{})", view.bounds.0, view.bounds.1),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    if view.stale {
        lines.push(Line::styled(
            " Above the current range, playing as set",
            Style::default().fg(Color::Yellow),
        ));
    }

    let squares: Vec<Span> = view
        .squares
        .iter()
        .map(|lit| {
            if *lit {
                Span::styled("■ ", Style::default().fg(Color::Magenta))
            } else {
                Span::styled("□ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    lines.push(Line::from(squares));
    lines.push(Line::default());

    // The range message takes the pitch selector's place
    match &view.error {
        Some(message) => lines.push(Line::styled(
            format!(" {message}"),
            Style::default().fg(Color::Red),
        )),
        None => {
            let mut pitches = vec![Span::raw(" Note: ")];
            for pitch in view.pitches {
                let style = if *pitch == view.pitch {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };
                pitches.push(Span::styled(pitch.to_string(), style));
                pitches.push(Span::raw(" "));
            }
            lines.push(Line::from(pitches));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
