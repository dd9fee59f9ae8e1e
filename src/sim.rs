//! Terminal simulator backend: renders the 128x64 monochrome frame as
//! half-block characters in an alternate screen and synthesizes encoder and
//! button line levels from keystrokes, so the whole stack above
//! [`InputSource`]/[`RenderSurface`] runs unmodified without hardware.

use std::{
    collections::VecDeque,
    io::{self, Write},
    panic,
    sync::{
        atomic::{AtomicBool, Ordering},
        OnceLock,
    },
    time::{Duration, Instant},
};

use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, BorderType, Borders, Paragraph},
    Terminal,
};

use crate::config::AppConfig;
use crate::frame::{Frame, RenderSurface, HEIGHT, WIDTH};
use crate::input::{InputSource, RawSample};
use crate::{log_debug, App};

static RAW_MODE_ENABLED: AtomicBool = AtomicBool::new(false);
static ALT_SCREEN_ENABLED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

/// RAII guard to restore terminal state on drop (and on panic via a shared hook).
struct TerminalRestoreGuard;

impl TerminalRestoreGuard {
    fn new() -> Self {
        install_terminal_panic_hook();
        TerminalRestoreGuard
    }

    fn enable_raw_mode(&self) -> io::Result<()> {
        enable_raw_mode()?;
        RAW_MODE_ENABLED.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn enter_alt_screen(&self, stdout: &mut impl Write) -> io::Result<()> {
        execute!(stdout, EnterAlternateScreen)?;
        ALT_SCREEN_ENABLED.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn restore(&self) {
        restore_terminal();
    }
}

impl Drop for TerminalRestoreGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    if RAW_MODE_ENABLED.swap(false, Ordering::SeqCst) {
        let _ = disable_raw_mode();
    }
    let mut stdout = io::stdout();
    if ALT_SCREEN_ENABLED.swap(false, Ordering::SeqCst) {
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
    let _ = execute!(stdout, Show);
    let _ = stdout.flush();
}

fn install_terminal_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal();
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".to_string());
            log_debug(&format!("panic at {location}"));
            previous(info);
        }));
    });
}

/// Draws frames into a ratatui terminal, two vertical pixels per character
/// cell using the half-block glyphs.
pub struct SimSurface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl SimSurface {
    fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Self {
        Self { terminal }
    }

    fn glyph(top: bool, bottom: bool) -> char {
        match (top, bottom) {
            (true, true) => '█',
            (true, false) => '▀',
            (false, true) => '▄',
            (false, false) => ' ',
        }
    }

    fn rows(frame: &Frame) -> Vec<String> {
        (0..HEIGHT / 2)
            .map(|row| {
                (0..WIDTH)
                    .map(|x| Self::glyph(frame.get(x, row * 2), frame.get(x, row * 2 + 1)))
                    .collect()
            })
            .collect()
    }
}

impl RenderSurface for SimSurface {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let rows = Self::rows(frame);
        self.terminal.draw(|tui| {
            let area = tui.size();
            // Center the fixed-size panel; the border adds one cell each side.
            let panel_w = (WIDTH as u16 + 2).min(area.width);
            let panel_h = (HEIGHT as u16 / 2 + 2).min(area.height);
            let panel = Rect::new(
                area.width.saturating_sub(panel_w) / 2,
                area.height.saturating_sub(panel_h) / 2,
                panel_w,
                panel_h,
            );
            let text = Text::from(rows.iter().map(|r| Line::from(r.as_str())).collect::<Vec<_>>());
            let widget = Paragraph::new(text)
                .style(Style::default().fg(Color::White).bg(Color::Black))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title(" pidial  <-/->: dial  Enter: select  Esc: back  q: quit "),
                );
            tui.render_widget(widget, panel);
        })?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.terminal.clear()?;
        Ok(())
    }
}

/// CW detent: phase walks 00 -> 01 -> 11 -> 10 -> 00 in (clk, dt) order.
const DETENT_CW: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];
const DETENT_CCW: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];

/// Synthesizes line levels from keystrokes. Each keypress becomes a held
/// level that outlasts the debounce window, and each arrow key queues one
/// full detent of quadrature phases, released one phase per sample.
pub struct SimInput {
    /// Keyboard presses have no release edge we can see, so a press latches
    /// the line active until this deadline.
    button_hold: Duration,
    quit_hold: Duration,
    phases: VecDeque<(bool, bool)>,
    phase: (bool, bool),
    back_until: Option<Instant>,
    confirm_until: Option<Instant>,
}

impl SimInput {
    pub fn new(config: &AppConfig) -> Self {
        // Hold past the debounce window with margin so slow ticks still
        // commit the edge.
        let button_hold = config.decoder_config().debounce * 3;
        let quit_hold = config.decoder_config().quit_hold + button_hold;
        Self {
            button_hold,
            quit_hold,
            phases: VecDeque::new(),
            phase: (false, false),
            back_until: None,
            confirm_until: None,
        }
    }

    fn queue_detent(&mut self, clockwise: bool) {
        let steps = if clockwise { DETENT_CW } else { DETENT_CCW };
        self.phases.extend(steps);
    }

    fn apply_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.back_until = Some(now + self.quit_hold);
            self.confirm_until = Some(now + self.quit_hold);
            return;
        }
        match key.code {
            KeyCode::Left => self.queue_detent(false),
            KeyCode::Right => self.queue_detent(true),
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.confirm_until = Some(now + self.button_hold);
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.back_until = Some(now + self.button_hold);
            }
            // 'b' held in a terminal auto-repeats, which conveniently reads
            // as one long press.
            KeyCode::Char('b') => {
                self.back_until = Some(now + self.button_hold);
            }
            KeyCode::Char('q') => {
                self.back_until = Some(now + self.quit_hold);
                self.confirm_until = Some(now + self.quit_hold);
            }
            _ => {}
        }
    }

    fn held(deadline: &mut Option<Instant>, now: Instant) -> bool {
        match deadline {
            Some(until) if now < *until => true,
            Some(_) => {
                *deadline = None;
                false
            }
            None => false,
        }
    }
}

impl InputSource for SimInput {
    fn sample(&mut self) -> RawSample {
        let now = Instant::now();
        // Drain whatever the terminal has; never block the loop.
        while let Ok(true) = event::poll(Duration::ZERO) {
            if let Ok(TermEvent::Key(key)) = event::read() {
                self.apply_key(key, now);
            }
        }
        if let Some(next) = self.phases.pop_front() {
            self.phase = next;
        }
        RawSample {
            clk: self.phase.0,
            dt: self.phase.1,
            back: Self::held(&mut self.back_until, now),
            confirm: Self::held(&mut self.confirm_until, now),
            at: now,
        }
    }
}

/// Configure the terminal, run the application loop, and tear everything down.
pub fn run(app: &mut App) -> Result<()> {
    let guard = TerminalRestoreGuard::new();
    guard.enable_raw_mode()?;
    let mut stdout = io::stdout();
    guard.enter_alt_screen(&mut stdout)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    let mut input = SimInput::new(app.config());
    let mut surface = SimSurface::new(terminal);
    let result = app.run(&mut input, &mut surface);

    guard.restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn glyphs_cover_both_pixel_rows() {
        assert_eq!(SimSurface::glyph(true, true), '█');
        assert_eq!(SimSurface::glyph(true, false), '▀');
        assert_eq!(SimSurface::glyph(false, true), '▄');
        assert_eq!(SimSurface::glyph(false, false), ' ');
    }

    #[test]
    fn frame_folds_into_32_rows() {
        let mut frame = Frame::new();
        frame.set(0, 0, true);
        frame.set(0, 1, true);
        frame.set(127, 63, true);
        let rows = SimSurface::rows(&frame);
        assert_eq!(rows.len(), 32);
        assert!(rows[0].starts_with('█'));
        assert!(rows[31].ends_with('▄'));
    }

    #[test]
    fn detent_queue_releases_one_phase_per_sample() {
        let config = AppConfig::parse_from(["test-app"]);
        let mut input = SimInput::new(&config);
        input.queue_detent(true);
        let phases: Vec<(bool, bool)> = (0..4)
            .map(|_| {
                let next = input.phases.pop_front().unwrap();
                input.phase = next;
                next
            })
            .collect();
        assert_eq!(phases, DETENT_CW.to_vec());
        assert_eq!(input.phase, (false, false));
    }

    #[test]
    fn button_hold_outlasts_debounce_then_releases() {
        let config = AppConfig::parse_from(["test-app"]);
        let mut input = SimInput::new(&config);
        let now = Instant::now();
        input.apply_key(KeyEvent::from(KeyCode::Enter), now);
        assert!(SimInput::held(&mut input.confirm_until, now + config.decoder_config().debounce));
        assert!(!SimInput::held(
            &mut input.confirm_until,
            now + config.decoder_config().debounce * 4
        ));
        assert!(input.confirm_until.is_none());
    }
}
