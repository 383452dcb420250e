//! Text status panel.
//!
//! Implements [`StatusDisplay`] by formatting the snapshot into five
//! fixed-width lines held in `heapless` strings.  Drawing the lines onto a
//! screen is the board support's job; on the device each changed frame is
//! also mirrored to the log at debug level.
//!
//! ```text
//!  MODE  Manual
//!  SET   -1.0C
//!  REACT 13.0C
//!  ICE   4.5C  COOL
//!  DROPS 12
//! ```

use core::fmt::Write;

use heapless::String;
use log::debug;

use crate::app::ports::StatusDisplay;
use crate::app::status::StatusSnapshot;

pub const LINES: usize = 5;
pub const LINE_WIDTH: usize = 24;

pub type Line = String<LINE_WIDTH>;

pub struct TextPanel {
    lines: [Line; LINES],
    frames: u32,
}

impl TextPanel {
    pub fn new() -> Self {
        Self {
            lines: core::array::from_fn(|_| Line::new()),
            frames: 0,
        }
    }

    pub fn lines(&self) -> &[Line; LINES] {
        &self.lines
    }

    /// Number of frames that differed from the previous one.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Default for TextPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Format into a line, truncating at capacity instead of failing.
fn format_line(args: core::fmt::Arguments<'_>) -> Line {
    struct Truncating(Line);

    impl Write for Truncating {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut out = Truncating(Line::new());
    let _ = out.write_fmt(args);
    out.0
}

fn state_tag(status: &StatusSnapshot) -> &'static str {
    match (status.running, status.thermostat.holding, status.thermostat.cooling) {
        (false, _, _) => "PAUSE",
        (true, true, _) => "HOLD",
        (true, false, true) => "COOL",
        (true, false, false) => "IDLE",
    }
}

impl StatusDisplay for TextPanel {
    fn render(&mut self, status: &StatusSnapshot) {
        let next: [Line; LINES] = [
            format_line(format_args!("MODE  {}", status.mode_label())),
            format_line(format_args!("SET   {:.1}C", status.thermostat.setpoint)),
            format_line(format_args!("REACT {:.1}C", status.thermostat.reactivate_temp)),
            format_line(format_args!("ICE   {:.1}C  {}", status.peltier_temp, state_tag(status))),
            format_line(format_args!("DROPS {}", status.drop_count)),
        ];
        if next == self.lines {
            return;
        }
        self.lines = next;
        self.frames = self.frames.wrapping_add(1);
        for line in &self.lines {
            debug!("LCD | {}", line);
        }
    }
}
