//! Cartridge bus and mapper implementations for the famicore NES emulator.
//!
//! The [`Cartridge`] owns PRG-ROM and CHR-ROM/RAM and routes every CPU and
//! PPU bus access through its [`MapperChip`], a tagged variant over the
//! supported mappers:
//!
//! | Mapper | Name | Highlights |
//! |--------|------|------------|
//! | 0 | NROM | fixed mapping |
//! | 1 | MMC1 | serial shift register, PRG/CHR modes |
//! | 2 | UxROM | 16 KiB PRG switching |
//! | 4 | MMC3 | fine banking, A12-clocked scanline IRQ |
//! | 5 | MMC5 | ExRAM, nametable map, fetch-type banking, multiplier |
//! | 69 | FME-7 | command/parameter banking, cycle-counting IRQ |
//!
//! Decode results are sum types ([`PrgRead`], [`ChrRead`], ...) rather than
//! sentinel offsets, so "this access hit RAM, not ROM" is a variant, not a
//! magic number.

mod cartridge;
mod fme7;
mod mapper;
mod mmc1;
mod mmc3;
mod mmc5;
mod nrom;
mod rom;
mod uxrom;

pub use cartridge::Cartridge;
pub use fme7::Fme7;
pub use mapper::{ChrRead, ChrWrite, Mapper, MapperChip, Mirroring, PrgRead, PrgWrite};
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use mmc5::Mmc5;
pub use nrom::Nrom;
pub use rom::{CartridgeError, Rom, RomHeader};
pub use uxrom::Uxrom;
