//! Mapper 4 (MMC3): fine-grained banking and the scanline IRQ.
//!
//! Eight bank registers selected through $8000: R0/R1 pick 2 KiB CHR
//! pages, R2-R5 pick 1 KiB CHR pages, R6/R7 pick 8 KiB PRG banks. The PRG
//! mode bit swaps which of $8000/$C000 is fixed; the CHR inversion bit
//! swaps the 2 KiB and 1 KiB halves of the pattern space.
//!
//! The IRQ counter clocks on PPU A12 rising edges observed in the PPU bus
//! traffic flowing through `chr_read`/`chr_write`. A rise only counts
//! after A12 has been seen low on at least two fetches, standing in for
//! the hardware's M2 low-time filter.

use crate::mapper::{ChrRead, ChrWrite, Mapper, Mirroring, PrgRead, PrgWrite};

/// MMC3 board state.
pub struct Mmc3 {
    prg_len: usize,
    chr_len: usize,
    prg_ram: Vec<u8>,

    bank_select: u8,
    prg_mode: bool,
    chr_inversion: bool,
    /// R0..R7.
    banks: [u8; 8],

    mirroring: Mirroring,
    prg_ram_enabled: bool,
    prg_ram_protect: bool,

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,

    a12_state: bool,
    a12_low_fetches: u8,
}

impl Mmc3 {
    /// Build from memory geometry and header mirroring.
    #[must_use]
    pub fn new(prg_len: usize, chr_len: usize, mirroring: Mirroring) -> Self {
        Self {
            prg_len,
            chr_len,
            prg_ram: vec![0; 8 * 1024],
            bank_select: 0,
            prg_mode: false,
            chr_inversion: false,
            banks: [0, 2, 4, 5, 6, 7, 0, 1],
            mirroring,
            prg_ram_enabled: true,
            prg_ram_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            a12_state: false,
            a12_low_fetches: 0,
        }
    }

    fn prg_banks(&self) -> usize {
        (self.prg_len / (8 * 1024)).max(1)
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let banks = self.prg_banks();
        let bank = match (addr, self.prg_mode) {
            (0x8000..=0x9FFF, false) => usize::from(self.banks[6]),
            (0x8000..=0x9FFF, true) => banks - 2,
            (0xA000..=0xBFFF, _) => usize::from(self.banks[7]),
            (0xC000..=0xDFFF, false) => banks - 2,
            (0xC000..=0xDFFF, true) => usize::from(self.banks[6]),
            _ => banks - 1,
        };
        (bank % banks) * 8 * 1024 + (addr as usize & 0x1FFF)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        // With inversion the 2 KiB pages move to $1000-$1FFF.
        let addr = usize::from(if self.chr_inversion {
            addr ^ 0x1000
        } else {
            addr
        });
        let offset = match addr {
            0x0000..=0x07FF => usize::from(self.banks[0] & 0xFE) * 1024 + (addr & 0x07FF),
            0x0800..=0x0FFF => usize::from(self.banks[1] & 0xFE) * 1024 + (addr & 0x07FF),
            0x1000..=0x13FF => usize::from(self.banks[2]) * 1024 + (addr & 0x03FF),
            0x1400..=0x17FF => usize::from(self.banks[3]) * 1024 + (addr & 0x03FF),
            0x1800..=0x1BFF => usize::from(self.banks[4]) * 1024 + (addr & 0x03FF),
            _ => usize::from(self.banks[5]) * 1024 + (addr & 0x03FF),
        };
        offset % self.chr_len.max(1)
    }

    /// Watch PPU address line 12 for filtered rising edges.
    fn observe_a12(&mut self, addr: u16) {
        let high = addr & 0x1000 != 0;
        if high {
            if !self.a12_state && self.a12_low_fetches >= 2 {
                self.clock_irq_counter();
            }
            self.a12_low_fetches = 0;
        } else {
            self.a12_low_fetches = self.a12_low_fetches.saturating_add(1);
        }
        self.a12_state = high;
    }

    fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }
}

impl Mapper for Mmc3 {
    fn prg_read(&mut self, addr: u16) -> PrgRead {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled {
                    PrgRead::Data(self.prg_ram[(addr as usize) & 0x1FFF])
                } else {
                    PrgRead::Miss
                }
            }
            0x8000..=0xFFFF => PrgRead::Rom(self.prg_offset(addr)),
            _ => PrgRead::Miss,
        }
    }

    fn prg_write(&mut self, addr: u16, value: u8) -> PrgWrite {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled && !self.prg_ram_protect {
                    self.prg_ram[(addr as usize) & 0x1FFF] = value;
                }
                PrgWrite::Handled
            }
            0x8000..=0x9FFF => {
                if addr & 0x01 == 0 {
                    self.bank_select = value & 0x07;
                    self.prg_mode = value & 0x40 != 0;
                    self.chr_inversion = value & 0x80 != 0;
                } else {
                    let index = usize::from(self.bank_select);
                    self.banks[index] = if index >= 6 { value & 0x3F } else { value };
                }
                PrgWrite::Handled
            }
            0xA000..=0xBFFF => {
                if addr & 0x01 == 0 {
                    if self.mirroring != Mirroring::FourScreen {
                        self.mirroring = if value & 0x01 != 0 {
                            Mirroring::Horizontal
                        } else {
                            Mirroring::Vertical
                        };
                    }
                } else {
                    self.prg_ram_enabled = value & 0x80 != 0;
                    self.prg_ram_protect = value & 0x40 != 0;
                }
                PrgWrite::Handled
            }
            0xC000..=0xDFFF => {
                if addr & 0x01 == 0 {
                    self.irq_latch = value;
                } else {
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
                PrgWrite::Handled
            }
            0xE000..=0xFFFF => {
                if addr & 0x01 == 0 {
                    self.irq_enabled = false;
                    self.irq_pending = false;
                } else {
                    self.irq_enabled = true;
                }
                PrgWrite::Handled
            }
            _ => PrgWrite::Miss,
        }
    }

    fn chr_read(&mut self, addr: u16) -> ChrRead {
        self.observe_a12(addr);
        if addr < 0x2000 {
            ChrRead::Rom(self.chr_offset(addr))
        } else {
            ChrRead::Miss
        }
    }

    fn chr_write(&mut self, addr: u16, _value: u8) -> ChrWrite {
        self.observe_a12(addr);
        if addr < 0x2000 {
            ChrWrite::Ram(self.chr_offset(addr))
        } else {
            ChrWrite::Miss
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn irq_clear(&mut self) {
        self.irq_pending = false;
    }

    fn reset(&mut self) {
        self.bank_select = 0;
        self.prg_mode = false;
        self.chr_inversion = false;
        self.banks = [0, 2, 4, 5, 6, 7, 0, 1];
        self.prg_ram_enabled = true;
        self.prg_ram_protect = false;
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_pending = false;
        self.a12_state = false;
        self.a12_low_fetches = 0;
    }
}
