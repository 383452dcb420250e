//! DFPlayer-compatible MP3 module on UART1.
//!
//! Every command is one fixed 10-byte frame:
//!
//! ```text
//!  7E FF 06 CMD 00 P_HI P_LO CK_HI CK_LO EF
//! ```
//!
//! where the checksum is the two's complement of the sum of bytes 1..=6.
//! No acknowledgement is requested; playback is fire-and-forget.

use log::{info, warn};

use crate::app::ports::AudioSink;

#[cfg(target_os = "espidf")]
use esp_idf_hal::uart::UartDriver;

pub const FRAME_LEN: usize = 10;
pub const MAX_VOLUME: u8 = 30;

const START: u8 = 0x7E;
const VERSION: u8 = 0xFF;
const LEN: u8 = 0x06;
const NO_ACK: u8 = 0x00;
const END: u8 = 0xEF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    PlayTrack = 0x03,
    SetVolume = 0x06,
    Reset = 0x0C,
}

/// Build a complete command frame.
pub fn encode_frame(cmd: Command, param: u16) -> [u8; FRAME_LEN] {
    let [hi, lo] = param.to_be_bytes();
    let mut frame = [START, VERSION, LEN, cmd as u8, NO_ACK, hi, lo, 0, 0, END];
    let [ck_hi, ck_lo] = checksum(&frame[1..7]).to_be_bytes();
    frame[7] = ck_hi;
    frame[8] = ck_lo;
    frame
}

fn checksum(body: &[u8]) -> u16 {
    let sum = body.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));
    0u16.wrapping_sub(sum)
}

pub struct AudioPlayer {
    healthy: bool,
    volume: u8,
    track: u8,
    #[cfg(target_os = "espidf")]
    uart: Option<UartDriver<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sent: Vec<[u8; FRAME_LEN]>,
}

impl AudioPlayer {
    /// Reset the module and apply the initial volume.  `None` means the
    /// UART could not be opened; the player is then inert.
    #[cfg(target_os = "espidf")]
    pub fn new(uart: Option<UartDriver<'static>>, volume: u8, track: u8) -> Self {
        let healthy = uart.is_some();
        let mut player = Self {
            healthy,
            volume,
            track,
            uart,
        };
        player.init(volume);
        player
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(volume: u8, track: u8) -> Self {
        let mut player = Self {
            healthy: true,
            volume,
            track,
            sent: Vec::new(),
        };
        player.init(volume);
        player
    }

    fn init(&mut self, volume: u8) {
        if !self.healthy {
            warn!("Audio: player not available, sounds disabled");
            return;
        }
        self.send(Command::Reset, 0);
        self.set_volume(volume);
        info!("Audio: ready (volume {}, track {})", self.volume, self.track);
    }

    /// 0..=30, clamped.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(MAX_VOLUME);
        self.send(Command::SetVolume, u16::from(self.volume));
    }

    pub fn set_track(&mut self, track: u8) {
        self.track = track;
    }

    pub fn play_track(&mut self, track: u8) {
        self.send(Command::PlayTrack, u16::from(track));
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sent_frames(&self) -> &[[u8; FRAME_LEN]] {
        &self.sent
    }

    fn send(&mut self, cmd: Command, param: u16) {
        if !self.healthy {
            return;
        }
        let frame = encode_frame(cmd, param);
        self.platform_write(&frame);
    }

    #[cfg(target_os = "espidf")]
    fn platform_write(&mut self, frame: &[u8; FRAME_LEN]) {
        let Some(uart) = self.uart.as_ref() else {
            return;
        };
        if let Err(e) = uart.write(frame) {
            warn!("Audio: UART write failed: {e}");
            self.healthy = false;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_write(&mut self, frame: &[u8; FRAME_LEN]) {
        self.sent.push(*frame);
    }
}

impl AudioSink for AudioPlayer {
    fn play_event_sound(&mut self) {
        self.play_track(self.track);
    }

    fn audio_healthy(&self) -> bool {
        self.healthy
    }
}
