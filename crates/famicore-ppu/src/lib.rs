//! 2C02 PPU core for the famicore NES emulator.
//!
//! The PPU runs at three dots per CPU cycle and produces one 256x240 frame
//! of packed ARGB pixels per 262 scanlines. All pattern-table and nametable
//! traffic goes through the [`PpuPort`] trait so the cartridge sees every
//! fetch: scanline-counting mappers watch A12 there, and MMC5 shadows the
//! nametables entirely.

mod oam;
mod palette;
mod ppu;
mod registers;
mod scroll;

pub use oam::{Oam, SecondaryOam, Sprite};
pub use palette::{PaletteRam, MASTER_PALETTE};
pub use ppu::{Ppu, PpuPort, FRAME_HEIGHT, FRAME_WIDTH};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::Scroll;
