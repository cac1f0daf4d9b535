//! The cartridge: ROM storage plus the mapper that decodes every access.

use crate::mapper::{ChrRead, ChrWrite, Mapper, MapperChip, Mirroring, PrgRead, PrgWrite};
use crate::rom::{CartridgeError, Rom};

/// A loaded cartridge. Owns PRG-ROM and CHR memory; the mapper owns its
/// own registers and any cartridge-resident RAM.
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_writable: bool,
    chip: MapperChip,
}

impl Cartridge {
    /// Parse an iNES image and build the board it describes.
    pub fn load(data: &[u8]) -> Result<Self, CartridgeError> {
        Self::from_rom(Rom::load(data)?)
    }

    /// Build from an already-parsed image.
    pub fn from_rom(rom: Rom) -> Result<Self, CartridgeError> {
        let chip = MapperChip::from_rom(&rom)?;
        let chr_writable = rom.chr_rom.is_empty();
        let chr = if chr_writable {
            vec![0; 8 * 1024]
        } else {
            rom.chr_rom
        };
        log::info!(
            "cartridge: mapper {} ({}), {} KiB PRG, {} KiB CHR{}",
            chip.number(),
            chip.name(),
            rom.prg_rom.len() / 1024,
            chr.len() / 1024,
            if chr_writable { "-RAM" } else { "-ROM" },
        );
        Ok(Self {
            prg_rom: rom.prg_rom,
            chr,
            chr_writable,
            chip,
        })
    }

    /// CPU read, $4020-$FFFF. `None` leaves the bus open.
    pub fn cpu_read(&mut self, addr: u16) -> Option<u8> {
        match self.chip.prg_read(addr) {
            PrgRead::Rom(offset) => {
                debug_assert!(offset < self.prg_rom.len(), "PRG decode out of range");
                Some(self.prg_rom[offset % self.prg_rom.len()])
            }
            PrgRead::Data(value) => Some(value),
            PrgRead::Miss => None,
        }
    }

    /// CPU write. Returns whether the cartridge claimed it.
    pub fn cpu_write(&mut self, addr: u16, value: u8) -> bool {
        self.chip.prg_write(addr, value) == PrgWrite::Handled
    }

    /// PPU read, $0000-$3EFF. `None` falls through to console CIRAM.
    pub fn ppu_read(&mut self, addr: u16) -> Option<u8> {
        match self.chip.chr_read(addr) {
            ChrRead::Rom(offset) => {
                debug_assert!(offset < self.chr.len(), "CHR decode out of range");
                Some(self.chr[offset % self.chr.len()])
            }
            ChrRead::Data(value) => Some(value),
            ChrRead::Miss => None,
        }
    }

    /// PPU write. Returns whether the cartridge claimed it.
    pub fn ppu_write(&mut self, addr: u16, value: u8) -> bool {
        match self.chip.chr_write(addr, value) {
            ChrWrite::Ram(offset) => {
                if self.chr_writable {
                    debug_assert!(offset < self.chr.len(), "CHR decode out of range");
                    let len = self.chr.len();
                    self.chr[offset % len] = value;
                }
                true
            }
            ChrWrite::Handled => true,
            ChrWrite::Miss => false,
        }
    }

    /// Current nametable mirroring.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.chip.mirroring()
    }

    /// Level-sampled mapper IRQ.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.chip.irq_pending()
    }

    /// Deassert the mapper IRQ.
    pub fn irq_clear(&mut self) {
        self.chip.irq_clear();
    }

    /// PPU scanline notification (dot 260 of rendering lines).
    pub fn on_scanline(&mut self) {
        self.chip.on_scanline();
    }

    /// CPU cycle notification.
    pub fn on_cpu_cycle(&mut self) {
        self.chip.on_cpu_cycle();
    }

    /// Reset the mapper to power-on state. ROM contents are untouched.
    pub fn reset(&mut self) {
        self.chip.reset();
    }

    /// The decoded mapper chip.
    #[must_use]
    pub fn chip(&self) -> &MapperChip {
        &self.chip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nrom_image(prg_banks: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, prg_banks, 1, 0x00, 0x00];
        data.extend_from_slice(&[0; 8]);
        for bank in 0..prg_banks {
            data.extend(std::iter::repeat(bank + 1).take(16 * 1024));
        }
        data.extend((0..8 * 1024).map(|i| (i & 0xFF) as u8));
        data
    }

    #[test]
    fn load_and_read_prg() {
        let mut cart = Cartridge::load(&nrom_image(2)).unwrap();
        assert_eq!(cart.cpu_read(0x8000), Some(1));
        assert_eq!(cart.cpu_read(0xC000), Some(2));
        assert_eq!(cart.cpu_read(0x5000), None);
    }

    #[test]
    fn chr_rom_rejects_writes() {
        let mut cart = Cartridge::load(&nrom_image(1)).unwrap();
        assert_eq!(cart.ppu_read(0x0010), Some(0x10));
        cart.ppu_write(0x0010, 0xFF);
        assert_eq!(cart.ppu_read(0x0010), Some(0x10));
    }

    #[test]
    fn chr_ram_accepts_writes() {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, 1, 0, 0x00, 0x00];
        data.extend_from_slice(&[0; 8]);
        data.extend(std::iter::repeat(0).take(16 * 1024));
        let mut cart = Cartridge::load(&data).unwrap();
        cart.ppu_write(0x0123, 0x77);
        assert_eq!(cart.ppu_read(0x0123), Some(0x77));
    }

    #[test]
    fn nametable_space_misses_on_simple_boards() {
        let mut cart = Cartridge::load(&nrom_image(1)).unwrap();
        assert_eq!(cart.ppu_read(0x2000), None);
        assert!(!cart.ppu_write(0x2000, 0x12));
    }

    #[test]
    fn unsupported_mapper_fails_loading() {
        let mut data = nrom_image(1);
        data[6] = 0xF0; // mapper 15
        assert!(matches!(
            Cartridge::load(&data),
            Err(CartridgeError::UnsupportedMapper(15))
        ));
    }
}
