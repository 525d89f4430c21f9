use crate::app::{App, Focus};
use crate::color::BACKGROUND;
use crate::quiz::{Phase, QuizBattle, MONSTER_MAX_HP, START_HEARTS};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 17;

const STATUS_HEIGHT: u16 = 8;
const PARAMS_HEIGHT: u16 = 12;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;
const GOOD_COLOR: Color = Color::Green;
const BAD_COLOR: Color = Color::Red;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function for the particle demo
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if !app.fullscreen_mode {
        let sidebar = Rect {
            width: SIDEBAR_WIDTH.min(area.width),
            ..area
        };
        render_sidebar(frame, sidebar, app);
    }
    render_canvas(frame, canvas_outer(area, app.fullscreen_mode), app);

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

fn canvas_outer(area: Rect, fullscreen: bool) -> Rect {
    if fullscreen {
        area
    } else {
        let sidebar = SIDEBAR_WIDTH.min(area.width);
        Rect {
            x: area.x + sidebar,
            width: area.width - sidebar,
            ..area
        }
    }
}

/// Screen area inside the canvas border
pub fn canvas_rect(frame_area: Rect, fullscreen: bool) -> Rect {
    styled_block("").inner(canvas_outer(frame_area, fullscreen))
}

/// How far the controls box can scroll on a terminal `height` rows tall
pub fn controls_max_scroll(height: u16) -> u16 {
    let visible = height.saturating_sub(STATUS_HEIGHT + PARAMS_HEIGHT + 2);
    CONTROLS_CONTENT_LINES.saturating_sub(visible)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(PARAMS_HEIGHT),
            Constraint::Min(3),
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Constellation ");
    let stats = app.driver.stats();
    let field = &app.field;

    let (state_text, state_color) = if app.is_recording() {
        (format!("REC {} frames", app.recorded_frames()), BAD_COLOR)
    } else if field.paused {
        ("PAUSED".to_string(), HIGHLIGHT_COLOR)
    } else {
        ("RUNNING".to_string(), BORDER_COLOR)
    };

    let text = Style::default().fg(TEXT_COLOR);
    let dim = Style::default().fg(DIM_TEXT_COLOR);
    let content = vec![
        Line::from(Span::styled(format!("{} particles", field.particles().len()), text)),
        Line::from(Span::styled(format!("frame {}", field.frames), dim)),
        Line::from(Span::styled(
            format!("{:.0} / {} fps", stats.fps, app.driver.target_fps()),
            dim,
        )),
        Line::from(Span::styled(format!("{} stale dropped", stats.stale_dropped), dim)),
        Line::from(Span::styled(state_text, Style::default().fg(state_color))),
        Line::from(Span::styled(app.status().unwrap_or("").to_string(), Style::default().fg(GOOD_COLOR))),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = &app.field.settings;
    let focus = app.focus;

    let mut content = vec![
        make_line("Particles", settings.particle_count.to_string(), focus == Focus::Particles),
        make_line("Radius", format!("{:.0}", settings.interaction_radius), focus == Focus::Radius),
        make_line("Force", format!("{:.2}", settings.repulsion_force), focus == Focus::Force),
        make_line("Relax", format!("{:.2}", settings.relax_factor), focus == Focus::Relax),
        make_line("Damping", format!("{:.2}", settings.wall_damping), focus == Focus::Damping),
        make_line("Links", format!("{:.0}", settings.link_distance()), focus == Focus::Links),
        make_line("Palette", settings.palette.name().to_string(), focus == Focus::Palette),
        make_line(
            "Trails",
            if settings.trails { "on" } else { "off" }.to_string(),
            focus == Focus::Trails,
        ),
        make_line("FPS", app.driver.target_fps().to_string(), focus == Focus::Fps),
    ];
    content.push(Line::from(Span::styled(
        format!("  Preset: {}", app.current_preset_name().unwrap_or("-")),
        Style::default().fg(DIM_TEXT_COLOR),
    )));

    // Keep the focused line visible
    let focus_line = focus.line_index().unwrap_or(0) as u16;
    let visible_height = area.height.saturating_sub(2);
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume"),
        make_control("H/?", "help"),
        make_control("R", "reinitialise"),
        make_control("+/-", "particles"),
        make_control("C", "palette"),
        make_control("X", "random palette"),
        make_control("T", "trails"),
        make_control("N", "next preset"),
        make_control("S", "save preset"),
        make_control("D", "delete preset"),
        make_control("P", "PNG snapshot"),
        make_control("G", "record GIF"),
        make_control("V", "fullscreen"),
        make_control("Tab", "select param"),
        make_control("↑/↓", "adjust param"),
        make_control("Esc", "back to controls"),
        make_control("Q", "quit"),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2);
    let title = if content_height > visible_height {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let paragraph = Paragraph::new(content)
        .block(styled_block(title))
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.fullscreen_mode { " V to exit fullscreen " } else { "" };
    let block = styled_block(title).style(Style::default().bg(Color::from(BACKGROUND)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Clip to the smaller of the canvas and the drawable area
    let cols = app.canvas.cols().min(inner.width);
    let rows = app.canvas.rows().min(inner.height);

    let buf = frame.buffer_mut();
    for cell in app.canvas.cells() {
        if cell.x < cols && cell.y < rows {
            if let Some(target) = buf.cell_mut((inner.x + cell.x, inner.y + cell.y)) {
                target.set_char(cell.char).set_fg(cell.color);
            }
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let canvas = canvas_outer(area, app.fullscreen_mode);

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas.width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let help_area = Rect {
        x: canvas.x + canvas.width.saturating_sub(help_width) / 2,
        y: area.y + area.height.saturating_sub(help_height) / 2,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = Style::default().fg(HIGHLIGHT_COLOR);
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("CONSTELLATION", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Particles drift across the field and bounce off its edges. Pairs that come close are joined by faint links."),
        Line::from(""),
        Line::from(Span::styled("POINTER:", heading)),
        Line::from("Move the mouse over the canvas to push nearby particles away. Once it leaves they ease back to their own drift."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS (Tab, then ↑/↓):", heading)),
        Line::from("Particles: density, reinitialises the field"),
        Line::from("Radius: how far the pointer reaches"),
        Line::from("Force: how hard the pointer pushes"),
        Line::from("Relax: how quickly particles settle back"),
        Line::from("Damping: speed kept after a wall bounce"),
        Line::from("Links: longest link distance"),
        Line::from("Palette: hue band, reinitialises the field"),
        Line::from("X generates a palette of five random hues"),
        Line::from("Trails: fading history behind particles"),
        Line::from(""),
        Line::from(Span::styled("CAPTURE:", heading)),
        Line::from("P writes a PNG of the current frame. G starts or stops an animated GIF; recording stops on its own after 300 frames."),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", heading)),
        Line::from("Space=Pause, R=Reinitialise, N=Next preset, S/D=Save/delete preset, V=Fullscreen, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let title = if content_height > visible_height {
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

/// Main render function for the quiz battle
pub fn render_quiz(frame: &mut Frame, quiz: &QuizBattle) {
    let area = frame.area();
    match quiz.phase {
        Phase::Dialogue(_) => render_dialogue(frame, area, quiz),
        Phase::Battle => render_battle(frame, area, quiz),
        Phase::Victory => render_ending(
            frame,
            area,
            " Victory! ",
            GOOD_COLOR,
            "The Commawidow has been defeated! Your punctuation skills saved the day.",
            quiz.score,
        ),
        Phase::GameOver => render_ending(
            frame,
            area,
            " Game Over ",
            BAD_COLOR,
            "The Commawidow's web of confusion was too strong this time.",
            quiz.score,
        ),
    }
}

/// Rect of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_dialogue(frame: &mut Frame, area: Rect, quiz: &QuizBattle) {
    let Some(line) = quiz.dialogue_line() else { return };
    let box_area = centered(area, 64, 9);

    let content = vec![
        Line::from(Span::styled(
            line.speaker,
            Style::default().fg(HIGHLIGHT_COLOR).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(line.text, Style::default().fg(TEXT_COLOR))),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: continue   S: skip   Q: quit",
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

    let paragraph = Paragraph::new(content)
        .block(styled_block(" VocabVenture "))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, box_area);
}

fn render_battle(frame: &mut Frame, area: Rect, quiz: &QuizBattle) {
    let outer = centered(area, 72, 22);
    let block = styled_block(" VocabVenture: Battle ");
    let inner = block.inner(outer);
    frame.render_widget(block, outer);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // hearts, timer, score
            Constraint::Length(3), // monster health
            Constraint::Length(3), // question
            Constraint::Min(3),    // options
            Constraint::Length(3), // explanation
            Constraint::Length(1), // hint
        ])
        .split(inner);

    let hearts: String = (0..START_HEARTS)
        .map(|i| if i < quiz.hearts { '♥' } else { '♡' })
        .collect();
    let timer_color = if quiz.time_is_low() { BAD_COLOR } else { TEXT_COLOR };
    let status = Line::from(vec![
        Span::styled(hearts, Style::default().fg(BAD_COLOR)),
        Span::raw("   "),
        Span::styled(format!("{:>2}s", quiz.time_left), Style::default().fg(timer_color)),
        Span::raw("   "),
        Span::styled(format!("Score {}", quiz.score), Style::default().fg(HIGHLIGHT_COLOR)),
        Span::raw("   "),
        Span::styled(format!("Combo x{}", quiz.combo), Style::default().fg(DIM_TEXT_COLOR)),
    ]);
    frame.render_widget(Paragraph::new(status), rows[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Commawidow "))
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(quiz.monster_health().clamp(0.0, 1.0))
        .label(format!("{} / {} HP", quiz.monster_hp, MONSTER_MAX_HP));
    frame.render_widget(gauge, rows[1]);

    let question = quiz.question();
    let title = format!(" Question {} of {} ", quiz.question_index + 1, quiz.question_count());
    frame.render_widget(
        Paragraph::new(question.question.as_str())
            .style(Style::default().fg(TEXT_COLOR))
            .wrap(Wrap { trim: true })
            .block(Block::default().title(title)),
        rows[2],
    );

    let options: Vec<Line> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let letter = (b'A' + i as u8) as char;
            let style = match quiz.feedback {
                Some(fb) if fb.selected == i && fb.correct => Style::default().fg(GOOD_COLOR),
                Some(fb) if fb.selected == i => Style::default().fg(BAD_COLOR),
                _ => Style::default().fg(TEXT_COLOR),
            };
            Line::from(Span::styled(format!("{}) {}", letter, option), style))
        })
        .collect();
    frame.render_widget(Paragraph::new(options).wrap(Wrap { trim: true }), rows[3]);

    let explanation = match quiz.feedback {
        Some(fb) if fb.correct => Line::from(Span::styled(
            format!("Correct! {}", question.explanation),
            Style::default().fg(GOOD_COLOR),
        )),
        Some(_) => Line::from(Span::styled("Not quite, try again!", Style::default().fg(BAD_COLOR))),
        None => Line::from(""),
    };
    frame.render_widget(Paragraph::new(explanation).wrap(Wrap { trim: true }), rows[4]);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "1-9 / A-I: answer   R: restart   Q: quit",
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        rows[5],
    );
}

fn render_ending(frame: &mut Frame, area: Rect, title: &str, color: Color, message: &str, score: u32) {
    let box_area = centered(area, 56, 9);
    let content = vec![
        Line::from(Span::styled(message, Style::default().fg(TEXT_COLOR))),
        Line::from(""),
        Line::from(Span::styled(
            format!("Final score: {}", score),
            Style::default().fg(HIGHLIGHT_COLOR).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("R: play again   Q: quit", Style::default().fg(DIM_TEXT_COLOR))),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(color))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, box_area);
}
