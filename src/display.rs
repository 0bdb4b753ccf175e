use std::io::{self, Stdout, Write};

use crossterm::cursor::{self, MoveTo};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::config::DisplayConfig;
use crate::store::{PriceEntry, Snapshot};

const LEFT_MARGIN: u16 = 1;

/// Colour category of a written cell run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
}

/// How a single row is presented.
///
/// The figure carried by `Up`/`Down` is `current / previous`, not a percent delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayState {
    Flat,
    Up { ratio: f64 },
    Down { ratio: f64 },
}

impl DisplayState {
    pub fn classify(entry: &PriceEntry) -> Self {
        if entry.previous == 0.0 || entry.previous == entry.current {
            DisplayState::Flat
        } else if entry.current > entry.previous {
            DisplayState::Up {
                ratio: entry.current / entry.previous,
            }
        } else {
            DisplayState::Down {
                ratio: entry.current / entry.previous,
            }
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            DisplayState::Flat => Tone::Neutral,
            DisplayState::Up { .. } => Tone::Positive,
            DisplayState::Down { .. } => Tone::Negative,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub text: String,
    pub tone: Tone,
}

/// Cell addressed output target.
pub trait DisplaySurface {
    fn clear(&mut self) -> io::Result<()>;
    fn put_str(&mut self, x: u16, y: u16, text: &str, tone: Tone) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    glyphs: DisplayConfig,
}

impl Renderer {
    pub fn new(glyphs: DisplayConfig) -> Self {
        Self { glyphs }
    }

    pub fn header(&self) -> String {
        format!("{:<6} {:<7} {:>11} {:<4}", "Symbol", "Price", "Change", "")
    }

    pub fn format_row(&self, symbol: &str, entry: &PriceEntry) -> Row {
        let state = DisplayState::classify(entry);
        let text = match state {
            DisplayState::Flat => {
                format!("{:<6} {:<7.2} {:>11} {:<4}", symbol, entry.current, "%", "-")
            }
            DisplayState::Up { ratio } => format!(
                "{:<6} {:<7.2} +{:.6} % {:<4}",
                symbol, entry.current, ratio, self.glyphs.up_glyph
            ),
            DisplayState::Down { ratio } => format!(
                "{:<6} {:<7.2} -{:.6} % {:<4}",
                symbol, entry.current, ratio, self.glyphs.down_glyph
            ),
        };
        Row {
            text,
            tone: state.tone(),
        }
    }

    /// Redraw the whole table: header, one row per symbol, then a status line.
    pub fn draw<S>(&self, snapshot: &Snapshot, cycle: u64, surface: &mut S) -> io::Result<()>
    where
        S: DisplaySurface + ?Sized,
    {
        surface.clear()?;
        surface.put_str(LEFT_MARGIN, 0, &self.header(), Tone::Neutral)?;

        let mut line: u16 = 1;
        for (symbol, entry) in snapshot.entries() {
            let row = self.format_row(symbol, entry);
            surface.put_str(LEFT_MARGIN, line, &row.text, row.tone)?;
            line = line.saturating_add(1);
        }

        let status = format!("cycle {cycle} · press any key to quit");
        surface.put_str(LEFT_MARGIN, line.saturating_add(1), &status, Tone::Neutral)?;
        surface.flush()
    }
}

/// Full screen terminal surface. Restores the terminal when dropped.
pub struct TerminalSurface {
    stdout: Stdout,
}

impl TerminalSurface {
    pub fn open() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(
            stdout,
            EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(Self { stdout })
    }

    fn color(tone: Tone) -> Color {
        match tone {
            Tone::Neutral => Color::White,
            Tone::Positive => Color::Green,
            Tone::Negative => Color::Red,
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn clear(&mut self) -> io::Result<()> {
        queue!(self.stdout, Clear(ClearType::All))
    }

    fn put_str(&mut self, x: u16, y: u16, text: &str, tone: Tone) -> io::Result<()> {
        queue!(
            self.stdout,
            MoveTo(x, y),
            SetForegroundColor(Self::color(tone)),
            SetBackgroundColor(Color::Reset),
            Print(text),
            ResetColor
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, ResetColor, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
