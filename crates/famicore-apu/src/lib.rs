//! 2A03 APU core for the famicore NES emulator.
//!
//! Five channels (two pulses, triangle, noise, DMC) mixed through the
//! console's nonlinear mixer, clocked at the CPU rate with a 240 Hz frame
//! sequencer driving envelopes, sweeps and length counters. The DMC's
//! memory reader is driven by the system bus: it raises
//! [`Apu::dmc_needs_sample`] and the bus performs the fetch, paying the CPU
//! stall.

mod apu;
mod dmc;
mod envelope;
mod frame_counter;
mod length_counter;
mod mixer;
mod noise;
mod pulse;
mod sweep;
mod triangle;

pub use apu::Apu;
pub use dmc::Dmc;
pub use envelope::Envelope;
pub use frame_counter::{FrameClock, FrameCounter};
pub use length_counter::LengthCounter;
pub use mixer::mix;
pub use noise::Noise;
pub use pulse::{Pulse, PulseChannel};
pub use sweep::Sweep;
pub use triangle::Triangle;
