use crate::app::App;
use crate::braille;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 30;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Canvas interior (inside its border) in terminal coordinates
pub fn canvas_area(frame_area: Rect, fullscreen: bool) -> Rect {
    let outer = if fullscreen {
        frame_area
    } else {
        Rect {
            x: frame_area.x + SIDEBAR_WIDTH.min(frame_area.width),
            y: frame_area.y,
            width: frame_area.width.saturating_sub(SIDEBAR_WIDTH),
            height: frame_area.height,
        }
    };
    styled_block("").inner(outer)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Status
            Constraint::Length(8), // Parameters
            Constraint::Min(6),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Particlify ");
    let system = &app.system;

    let total = system.particles().len();
    let displaced = system.displaced_count();
    let bar_width = (area.width.saturating_sub(4)) as usize;
    let filled = if total == 0 {
        0
    } else {
        (displaced * bar_width / total).min(bar_width)
    };
    let empty = bar_width.saturating_sub(filled);

    let (status_text, status_color) = if !system.is_populated() {
        ("NO IMAGE", Color::Red)
    } else if app.paused {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else if displaced == 0 {
        ("AT REST", Color::Green)
    } else {
        ("SCATTERED", BORDER_COLOR)
    };

    let pointer = system.pointer();
    let content = vec![
        Line::from(Span::styled(
            format!("{} particles", total),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!(
                "{} moved, {} off",
                displaced,
                system.off_canvas_count()
            ),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(vec![
            Span::styled("█".repeat(filled), Style::default().fg(Color::Green)),
            Span::styled("░".repeat(empty), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(
            format!("ptr {:.0},{:.0}  f{}", pointer.x, pointer.y, system.frames),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");
    let system = &app.system;

    let make_line = |label: &str, value: String| {
        Line::from(Span::styled(
            format!("  {}: {}", label, value),
            Style::default().fg(TEXT_COLOR),
        ))
    };

    let content = vec![
        make_line("Canvas", format!("{:.0}x{:.0}", system.width, system.height)),
        make_line("Size", format!("{:.1}", system.particle_size)),
        make_line("Radius", format!("{:.0}", system.grid().cell_size())),
        make_line("Drift", format!("{:.1}", system.max_displacement())),
        make_line(
            "Grid",
            format!("{}x{}", system.grid().rows, system.grid().cols),
        ),
        Line::from(Span::styled(
            format!(
                "  Push {} / Pull {}",
                app.last_stats.repelled, app.last_stats.restored
            ),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    // Helper to create a control line
    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let mut content = vec![
        make_control("Mouse", "scatter".to_string()),
        make_control("Space", "pause/resume".to_string()),
        make_control("R", "resample".to_string()),
        make_control("+/-", "particle size".to_string()),
        make_control("[/]", "radius".to_string()),
        make_control("P", format!("pointer: {}", if app.show_pointer { "on" } else { "off" })),
        make_control("V", "fullscreen".to_string()),
        make_control("S", "save config".to_string()),
        make_control("H", "help".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    if let Some(status) = &app.status {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(HIGHLIGHT_COLOR),
        )));
    }

    let block = styled_block(" Controls ");
    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(&app.system, inner.width, inner.height, app.show_pointer);

    let buf = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            buf[(x, y)]
                .set_char(cell.char)
                .set_style(Style::default().fg(cell.color));
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    // Clear the background
    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("PARTICLIFY", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("The image is sampled into particles. Move the mouse over the canvas to push them away; they drift back to where they came from."),
        Line::from(""),
        Line::from(Span::styled("SAMPLING:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Only pixels with alpha above 128 become particles. Without --count the budget is one particle per size² x 6 canvas pixels, at most 15000."),
        Line::from(""),
        Line::from(Span::styled("+/- - Particle Size", Style::default().fg(TEXT_COLOR))),
        Line::from("Bigger particles mean fewer of them. Resamples the image."),
        Line::from(""),
        Line::from(Span::styled("[/] - Interaction Radius", Style::default().fg(TEXT_COLOR))),
        Line::from("How far the pointer reaches. Also the spatial grid cell size."),
        Line::from(""),
        Line::from(Span::styled("R - Resample", Style::default().fg(TEXT_COLOR))),
        Line::from("Draw a new random subset of pixels (reproducible with --seed)."),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Pause, P=Pointer marker, V=Fullscreen, S=Save config, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    // Update title to show scroll hint if scrollable
    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_area_leaves_room_for_sidebar() {
        let area = Rect::new(0, 0, 100, 30);
        assert_eq!(canvas_area(area, false), Rect::new(SIDEBAR_WIDTH + 1, 1, 100 - SIDEBAR_WIDTH - 2, 28));
        assert_eq!(canvas_area(area, true), Rect::new(1, 1, 98, 28));
    }

    #[test]
    fn test_canvas_area_on_tiny_terminal() {
        let area = Rect::new(0, 0, 10, 2);
        let inner = canvas_area(area, false);
        assert_eq!(inner.width, 0);
        assert_eq!(inner.height, 0);
    }
}
