//! Console: the outer frame loop around the bus.

use crate::audio::{audio_channel, AudioConsumer, AudioProducer, Resampler};
use crate::bus::Bus;
use famicore_cart::{Cartridge, CartridgeError};

/// Errors surfaced by the console layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsoleError {
    /// The ROM image could not be loaded.
    #[error("cartridge: {0}")]
    Cartridge(#[from] CartridgeError),
}

/// NTSC timing constants.
pub mod timing {
    /// Master crystal frequency.
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock (master / 12).
    pub const CPU_CLOCK_NTSC: f64 = MASTER_CLOCK_NTSC as f64 / 12.0;
    /// PPU dot clock (master / 4).
    pub const PPU_CLOCK_NTSC: f64 = MASTER_CLOCK_NTSC as f64 / 4.0;
    /// Host audio sample rate.
    pub const SAMPLE_RATE: f64 = 44_100.0;
    /// Dots per scanline.
    pub const DOTS_PER_SCANLINE: u16 = 341;
    /// Scanlines per frame, pre-render included.
    pub const SCANLINES_PER_FRAME: u16 = 262;
    /// Nominal frame rate.
    pub const FRAME_RATE_NTSC: f64 = 60.0988;
}

/// Audio ring capacity in samples (~370 ms at 44.1 kHz).
const AUDIO_RING_CAPACITY: usize = 16 * 1024;

/// A complete NES, driven one frame at a time.
pub struct Console {
    bus: Bus,
    resampler: Resampler,
    audio_tx: AudioProducer,
    audio_rx: Option<AudioConsumer>,
    frames: u64,
}

impl Console {
    /// Load an iNES image and power on.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        let cart = Cartridge::load(rom_data)?;
        Ok(Self::with_cartridge(cart))
    }

    /// Build around an already-loaded cartridge and power on.
    #[must_use]
    pub fn with_cartridge(cart: Cartridge) -> Self {
        let mut bus = Bus::new(cart);
        bus.reset();
        let (audio_tx, audio_rx) = audio_channel(AUDIO_RING_CAPACITY);
        Self {
            bus,
            resampler: Resampler::new(timing::CPU_CLOCK_NTSC, timing::SAMPLE_RATE),
            audio_tx,
            audio_rx: Some(audio_rx),
            frames: 0,
        }
    }

    /// Reset the machine to power-on state.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.resampler.reset();
        log::debug!("console reset");
    }

    /// Run until the PPU completes the current frame, pushing audio
    /// samples into the ring as they fall due.
    pub fn run_frame(&mut self) {
        loop {
            let cpu_tick = self.bus.clock();
            if cpu_tick {
                if let Some(sample) = self.resampler.push(self.bus.io.apu.output()) {
                    // A full ring drops the sample: real time wins.
                    let _ = self.audio_tx.push(sample);
                }
            }
            if self.bus.io.ppu.take_frame_complete() {
                break;
            }
        }
        self.frames += 1;
    }

    /// Step a single CPU instruction (debug aid). Returns the CPU cycles
    /// consumed.
    pub fn step_instruction(&mut self) -> u64 {
        let start = self.bus.cpu.cycles;
        loop {
            self.bus.clock();
            if self.bus.cpu.cycles > start && self.bus.cpu.at_instruction_boundary() {
                break;
            }
        }
        self.bus.cpu.cycles - start
    }

    /// The finished 256x240 frame, packed ARGB.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u32] {
        self.bus.io.ppu.frame_buffer()
    }

    /// Hand out the audio-callback end of the ring. Yields once.
    pub fn take_audio_consumer(&mut self) -> Option<AudioConsumer> {
        self.audio_rx.take()
    }

    /// Latch controller state: bit 7 = A through bit 0 = Right.
    pub fn set_buttons(&mut self, port: usize, state: u8) {
        self.bus.set_buttons(port, state);
    }

    /// Frames completed since power-on.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total CPU cycles since power-on.
    #[must_use]
    pub fn cpu_cycles(&self) -> u64 {
        self.bus.cpu.cycles
    }

    /// Borrow the machine for inspection.
    #[must_use]
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Borrow the machine mutably (tests, tools).
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }
}
