//! Per-voice oscilloscope
//!
//! Each voice is hard-panned, so one output channel is one voice. The base
//! trace reads the channel the left voice sounds on and the cross trace the
//! other one.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition},
    Frame,
};

use crossbeat::{
    engine::CpalBackend,
    playback::PlaybackController,
    presentation::panel_for,
    rhythm::Side,
    synth::pan_for,
};

/// Peak level the y axis is scaled to; the master gain keeps output well
/// below full scale
const SCOPE_RANGE: f64 = 0.25;

/// Output channel a voice is panned to
fn channel_of(side: Side) -> usize {
    if pan_for(side) > 0.0 {
        1
    } else {
        0
    }
}

fn trace_color(side: Side) -> Color {
    match side {
        Side::Left => Color::Cyan,
        Side::Right => Color::Yellow,
    }
}

pub fn render_waveform(
    frame: &mut Frame,
    area: Rect,
    audio_buffer: &[[f32; 2]],
    controller: &PlaybackController<CpalBackend>,
) {
    let len = audio_buffer.len().max(1) as f64;
    let traces: Vec<(Side, String, Vec<(f64, f64)>)> = Side::BOTH
        .into_iter()
        .map(|side| {
            let channel = channel_of(side);
            let voice = controller.voice(side);
            let title = panel_for(side).title.split(' ').next().unwrap_or("");
            let name = format!("{title} {} {}", voice.beats, voice.note);
            let points = audio_buffer
                .iter()
                .enumerate()
                .map(|(i, pair)| (i as f64 / len, pair[channel] as f64))
                .collect();
            (side, name, points)
        })
        .collect();

    let datasets = traces
        .iter()
        .map(|(side, name, points)| {
            let mut style = Style::default().fg(trace_color(*side));
            if controller.error(*side) {
                style = style.add_modifier(Modifier::DIM);
            }
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(style)
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(Block::default().title(" Voices ").borders(Borders::ALL))
        .legend_position(Some(LegendPosition::TopRight))
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-SCOPE_RANGE, SCOPE_RANGE])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
