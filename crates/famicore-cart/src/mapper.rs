//! The mapper capability surface and the tagged variant over all
//! supported chips.

use crate::fme7::Fme7;
use crate::mmc1::Mmc1;
use crate::mmc3::Mmc3;
use crate::mmc5::Mmc5;
use crate::nrom::Nrom;
use crate::rom::{CartridgeError, Rom};
use crate::uxrom::Uxrom;

/// Nametable mirroring as seen by the PPU's CIRAM decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirroring {
    /// Quadrants (0,1) share page A, (2,3) page B.
    #[default]
    Horizontal,
    /// Quadrants (0,2) share page A, (1,3) page B.
    Vertical,
    /// Everything maps to the first page.
    OneScreenLo,
    /// Everything maps to the second page.
    OneScreenHi,
    /// Board-supplied VRAM for all four quadrants.
    FourScreen,
}

/// Outcome of decoding a CPU-bus read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrgRead {
    /// PRG-ROM byte offset; the cartridge supplies the data.
    Rom(usize),
    /// Cartridge-resident RAM or a mapper register supplied the byte.
    Data(u8),
    /// Not decoded; the bus sees open bus.
    Miss,
}

/// Outcome of decoding a CPU-bus write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrgWrite {
    /// Absorbed by cartridge RAM or a control register.
    Handled,
    /// Not decoded.
    Miss,
}

/// Outcome of decoding a PPU-bus read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChrRead {
    /// CHR byte offset; the cartridge supplies the data.
    Rom(usize),
    /// The mapper synthesized the byte itself (ExRAM, fill mode,
    /// shadowed nametables).
    Data(u8),
    /// Not decoded; nametable traffic falls through to CIRAM.
    Miss,
}

/// Outcome of decoding a PPU-bus write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChrWrite {
    /// CHR-RAM byte offset; the cartridge performs the write.
    Ram(usize),
    /// Absorbed by the mapper.
    Handled,
    /// Not decoded; nametable traffic falls through to CIRAM.
    Miss,
}

/// Capabilities every mapper chip implements.
///
/// `chr_read`/`chr_write` see every PPU fetch below $3F00, which is how
/// the traffic-observing mappers work: MMC3 watches A12 transitions and
/// MMC5 watches the nametable fetch pattern.
pub trait Mapper {
    /// Decode a CPU read, $4020-$FFFF.
    fn prg_read(&mut self, addr: u16) -> PrgRead;

    /// Decode a CPU write. Writes landing on ROM are register pokes.
    fn prg_write(&mut self, addr: u16, value: u8) -> PrgWrite;

    /// Decode a PPU read, $0000-$3EFF.
    fn chr_read(&mut self, addr: u16) -> ChrRead;

    /// Decode a PPU write, $0000-$3EFF.
    fn chr_write(&mut self, addr: u16, value: u8) -> ChrWrite;

    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;

    /// Level-sampled IRQ output.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Deassert the IRQ output.
    fn irq_clear(&mut self) {}

    /// The PPU reported rendering activity on a scanline (dot 260).
    fn on_scanline(&mut self) {}

    /// One CPU cycle elapsed (cycle-counting IRQ sources).
    fn on_cpu_cycle(&mut self) {}

    /// Return to power-on state. ROM contents are untouched.
    fn reset(&mut self);
}

/// Tagged variant over the supported mapper chips.
///
/// Chip-specific state (PRG-RAM, ExRAM, counters) lives inside the arm;
/// shared behavior goes through the [`Mapper`] trait, so nothing ever
/// needs a downcast.
#[allow(clippy::large_enum_variant)] // MMC5 carries its RAM banks inline
pub enum MapperChip {
    /// Mapper 0.
    Nrom(Nrom),
    /// Mapper 1.
    Mmc1(Mmc1),
    /// Mapper 2.
    Uxrom(Uxrom),
    /// Mapper 4.
    Mmc3(Mmc3),
    /// Mapper 5.
    Mmc5(Mmc5),
    /// Mapper 69.
    Fme7(Fme7),
}

impl MapperChip {
    /// Build the chip named by a ROM header.
    pub fn from_rom(rom: &Rom) -> Result<Self, CartridgeError> {
        let prg_len = rom.prg_rom.len();
        let chr_len = if rom.chr_rom.is_empty() {
            8 * 1024
        } else {
            rom.chr_rom.len()
        };
        let mirroring = rom.header.mirroring;

        match rom.header.mapper {
            0 => Ok(Self::Nrom(Nrom::new(prg_len, mirroring))),
            1 => Ok(Self::Mmc1(Mmc1::new(prg_len, chr_len, mirroring))),
            2 => Ok(Self::Uxrom(Uxrom::new(prg_len, mirroring))),
            4 => Ok(Self::Mmc3(Mmc3::new(prg_len, chr_len, mirroring))),
            5 => Ok(Self::Mmc5(Mmc5::new(prg_len, chr_len))),
            69 => Ok(Self::Fme7(Fme7::new(prg_len, chr_len))),
            n => Err(CartridgeError::UnsupportedMapper(n)),
        }
    }

    /// iNES number of the selected chip.
    #[must_use]
    pub fn number(&self) -> u16 {
        match self {
            Self::Nrom(_) => 0,
            Self::Mmc1(_) => 1,
            Self::Uxrom(_) => 2,
            Self::Mmc3(_) => 4,
            Self::Mmc5(_) => 5,
            Self::Fme7(_) => 69,
        }
    }

    /// Board name of the selected chip.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nrom(_) => "NROM",
            Self::Mmc1(_) => "MMC1",
            Self::Uxrom(_) => "UxROM",
            Self::Mmc3(_) => "MMC3",
            Self::Mmc5(_) => "MMC5",
            Self::Fme7(_) => "FME-7",
        }
    }

    fn ops(&self) -> &dyn Mapper {
        match self {
            Self::Nrom(m) => m,
            Self::Mmc1(m) => m,
            Self::Uxrom(m) => m,
            Self::Mmc3(m) => m,
            Self::Mmc5(m) => m,
            Self::Fme7(m) => m,
        }
    }

    fn ops_mut(&mut self) -> &mut dyn Mapper {
        match self {
            Self::Nrom(m) => m,
            Self::Mmc1(m) => m,
            Self::Uxrom(m) => m,
            Self::Mmc3(m) => m,
            Self::Mmc5(m) => m,
            Self::Fme7(m) => m,
        }
    }
}

impl Mapper for MapperChip {
    fn prg_read(&mut self, addr: u16) -> PrgRead {
        self.ops_mut().prg_read(addr)
    }

    fn prg_write(&mut self, addr: u16, value: u8) -> PrgWrite {
        self.ops_mut().prg_write(addr, value)
    }

    fn chr_read(&mut self, addr: u16) -> ChrRead {
        self.ops_mut().chr_read(addr)
    }

    fn chr_write(&mut self, addr: u16, value: u8) -> ChrWrite {
        self.ops_mut().chr_write(addr, value)
    }

    fn mirroring(&self) -> Mirroring {
        self.ops().mirroring()
    }

    fn irq_pending(&self) -> bool {
        self.ops().irq_pending()
    }

    fn irq_clear(&mut self) {
        self.ops_mut().irq_clear();
    }

    fn on_scanline(&mut self) {
        self.ops_mut().on_scanline();
    }

    fn on_cpu_cycle(&mut self) {
        self.ops_mut().on_cpu_cycle();
    }

    fn reset(&mut self) {
        self.ops_mut().reset();
    }
}
