//! 128x64 monochrome framebuffer and the drawing helpers shared by the menu,
//! result screens, and the spinner. The buffer implements
//! `embedded_graphics::DrawTarget` so screens compose from mono-font text and
//! primitives; a [`RenderSurface`] pushes finished frames at whatever the
//! physical display (or the simulator) supports. Full-frame replace only.

use std::convert::Infallible;
use std::f32::consts::TAU;

use anyhow::Result;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 64;

/// Characters per line at FONT_6X10 with a 2px left margin.
const WRAP_COLUMNS: usize = 20;
/// Line pitch for wrapped text screens.
const TEXT_LINE_PX: i32 = 10;
/// Menu row pitch; 5 rows fill the display.
const MENU_ROW_PX: i32 = 12;
const MENU_VISIBLE_ROWS: usize = 5;
/// Spinner ring geometry, bottom-right corner.
const SPINNER_CENTER: (i32, i32) = (112, 52);
const SPINNER_RADIUS: f32 = 7.0;
pub const SPINNER_DOTS: usize = 12;

/// One full monochrome frame, packed row-major, one bit per pixel.
#[derive(Clone)]
pub struct Frame {
    bits: [u8; (WIDTH * HEIGHT / 8) as usize],
}

impl Frame {
    pub fn new() -> Self {
        Self {
            bits: [0; (WIDTH * HEIGHT / 8) as usize],
        }
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let idx = (y * WIDTH + x) as usize;
        let mask = 1u8 << (idx % 8);
        if on {
            self.bits[idx / 8] |= mask;
        } else {
            self.bits[idx / 8] &= !mask;
        }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        let idx = (y * WIDTH + x) as usize;
        self.bits[idx / 8] & (1 << (idx % 8)) != 0
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Count of lit pixels; handy for render assertions.
    pub fn lit(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

/// Sink for finished frames. The physical SSD1306 driver and the terminal
/// simulator both live behind this.
pub trait RenderSurface {
    fn present(&mut self, frame: &Frame) -> Result<()>;
    /// Blank the display; called once on shutdown.
    fn clear(&mut self) -> Result<()>;
}

fn text_style(on: bool) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(
        &FONT_6X10,
        if on { BinaryColor::On } else { BinaryColor::Off },
    )
}

/// Greedy word wrap at `max_chars` columns; words longer than a line are
/// hard-broken. Explicit newlines are respected. Widths are counted in
/// chars, never bytes: action results carry subprocess output that is not
/// guaranteed to be ASCII, and a byte split mid-codepoint panics.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        let mut current_chars = 0;
        for word in raw_line.split_whitespace() {
            let mut word = word;
            let mut word_chars = word.chars().count();
            while word_chars > max_chars {
                if current_chars > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_chars = 0;
                }
                let split = word
                    .char_indices()
                    .nth(max_chars)
                    .map(|(idx, _)| idx)
                    .unwrap_or(word.len());
                let (head, tail) = word.split_at(split);
                lines.push(head.to_string());
                word = tail;
                word_chars -= max_chars;
            }
            if current_chars == 0 {
                current.push_str(word);
                current_chars = word_chars;
            } else if current_chars + 1 + word_chars <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_chars += 1 + word_chars;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_chars = word_chars;
            }
        }
        lines.push(current);
    }
    lines
}

/// Plain wrapped-text screen (info results, goodbye, errors).
pub fn draw_text(frame: &mut Frame, text: &str) {
    let style = text_style(true);
    let mut y = 0;
    for line in wrap_text(text, WRAP_COLUMNS).iter().take(6) {
        Text::with_baseline(line, Point::new(2, y), style, Baseline::Top)
            .draw(frame)
            .ok();
        y += TEXT_LINE_PX;
    }
}

/// Menu screen: a window of rows around the selection, selected row drawn
/// inverted. The window slides so the selection stays near the middle.
pub fn draw_menu(frame: &mut Frame, labels: &[&str], selected: usize) {
    let start = if labels.len() <= MENU_VISIBLE_ROWS {
        0
    } else {
        selected
            .saturating_sub(2)
            .min(labels.len() - MENU_VISIBLE_ROWS)
    };
    let mut y = 0;
    for (i, label) in labels
        .iter()
        .enumerate()
        .skip(start)
        .take(MENU_VISIBLE_ROWS)
    {
        if i == selected {
            Rectangle::new(
                Point::new(0, y),
                Size::new(WIDTH, MENU_ROW_PX as u32),
            )
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(frame)
            .ok();
            Text::with_baseline(
                &format!("> {label}"),
                Point::new(4, y + 1),
                text_style(false),
                Baseline::Top,
            )
            .draw(frame)
            .ok();
        } else {
            Text::with_baseline(
                &format!("  {label}"),
                Point::new(4, y + 1),
                text_style(true),
                Baseline::Top,
            )
            .draw(frame)
            .ok();
        }
        y += MENU_ROW_PX;
    }
}

/// Busy screen: wrapped message plus a 12-dot ring, the active dot drawn fat
/// so liveness reads even on a 1-bit panel.
pub fn draw_spinner(frame: &mut Frame, message: &str, spinner_frame: usize) {
    let style = text_style(true);
    let mut y = 0;
    for line in wrap_text(message, WRAP_COLUMNS).iter().take(5) {
        Text::with_baseline(line, Point::new(2, y), style, Baseline::Top)
            .draw(frame)
            .ok();
        y += TEXT_LINE_PX;
    }
    let (cx, cy) = SPINNER_CENTER;
    let active = spinner_frame % SPINNER_DOTS;
    for i in 0..SPINNER_DOTS {
        let angle = i as f32 / SPINNER_DOTS as f32 * TAU;
        let x = cx + (SPINNER_RADIUS * angle.cos()) as i32;
        let dy = cy + (SPINNER_RADIUS * angle.sin()) as i32;
        if i == active {
            Rectangle::new(Point::new(x - 1, dy - 1), Size::new(3, 3))
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(frame)
                .ok();
        } else if let (Ok(x), Ok(dy)) = (u32::try_from(x), u32::try_from(dy)) {
            frame.set(x, dy, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip_and_bounds() {
        let mut frame = Frame::new();
        assert!(!frame.get(3, 5));
        frame.set(3, 5, true);
        assert!(frame.get(3, 5));
        frame.set(3, 5, false);
        assert!(!frame.get(3, 5));
        // Out of bounds is silently ignored.
        frame.set(WIDTH, 0, true);
        frame.set(0, HEIGHT, true);
        assert_eq!(frame.lit(), 0);
    }

    #[test]
    fn wrap_respects_width_and_newlines() {
        let lines = wrap_text("IP Address:\n192.168.1.10", 20);
        assert_eq!(lines, vec!["IP Address:", "192.168.1.10"]);

        let lines = wrap_text("a very long message that needs wrapping", 20);
        assert!(lines.iter().all(|l| l.len() <= 20));
        assert!(lines.len() >= 2);
    }

    #[test]
    fn wrap_hard_breaks_oversized_words() {
        let lines = wrap_text("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", 20);
        assert_eq!(lines[0].len(), 20);
        assert_eq!(lines[1].len(), 10);
    }

    #[test]
    fn wrap_counts_chars_not_bytes() {
        // Seven 3-byte chars (21 bytes) fit a 20-column line.
        let lines = wrap_text("日本語日本語日", 20);
        assert_eq!(lines, vec!["日本語日本語日"]);

        // A 25-char multi-byte word hard-breaks on a char boundary.
        let word = "é".repeat(25);
        let lines = wrap_text(&word, 20);
        assert_eq!(lines[0].chars().count(), 20);
        assert_eq!(lines[1].chars().count(), 5);

        // Mixed text from a subprocess stays panic-free and in bounds.
        let lines = wrap_text("Température: 47,3 °C über café-señor-übermäßig", 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn menu_highlights_the_selected_row() {
        let mut frame = Frame::new();
        draw_menu(&mut frame, &["Docker", "System Info", "Exit"], 1);
        // Second row (y 12..24) carries the filled highlight bar; the first
        // row does not.
        assert!(frame.get(0, 13));
        assert!(!frame.get(0, 1));
    }

    #[test]
    fn menu_window_follows_selection() {
        let labels = ["a", "b", "c", "d", "e", "f", "g"];
        let mut frame = Frame::new();
        draw_menu(&mut frame, &labels, 6);
        // Selection at the end: window is the last five rows, highlight on
        // the bottom visible row.
        assert!(frame.get(0, 4 * 12 + 1));
    }

    #[test]
    fn text_and_spinner_render_something() {
        let mut frame = Frame::new();
        draw_text(&mut frame, "Pi Control\nSystem v2.0");
        assert!(frame.lit() > 0);

        let mut frame = Frame::new();
        draw_spinner(&mut frame, "Updating...", 3);
        assert!(frame.lit() > 0);
        let mut other = Frame::new();
        draw_spinner(&mut other, "Updating...", 4);
        // Consecutive spinner frames must differ or the screen looks frozen.
        assert!(frame.bits != other.bits);
    }
}
