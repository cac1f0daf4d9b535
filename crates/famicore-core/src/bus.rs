//! The system bus: master clock, memory map, OAM DMA and interrupt wiring.
//!
//! One master tick is one PPU dot. Every third tick the CPU-rate devices
//! run, in a fixed order: APU, then the CPU (or one OAM-DMA micro-step),
//! then the mapper's cycle hook, then level-sampled IRQ wiring; the PPU's
//! NMI edge is delivered last. A CPU write that enables NMI on the same
//! master tick vblank rises is therefore seen at the next instruction
//! boundary, never the current one.

use famicore_apu::Apu;
use famicore_cart::{Cartridge, Mirroring};
use famicore_cpu::{Cpu, CpuBus};
use famicore_ppu::{Ppu, PpuPort};

/// Controller button masks, MSB first on the wire: A is read first.
pub mod buttons {
    /// A button.
    pub const A: u8 = 0x80;
    /// B button.
    pub const B: u8 = 0x40;
    /// Select.
    pub const SELECT: u8 = 0x20;
    /// Start.
    pub const START: u8 = 0x10;
    /// D-pad up.
    pub const UP: u8 = 0x08;
    /// D-pad down.
    pub const DOWN: u8 = 0x04;
    /// D-pad left.
    pub const LEFT: u8 = 0x02;
    /// D-pad right.
    pub const RIGHT: u8 = 0x01;
}

/// In-flight OAM DMA transfer.
struct OamDma {
    page: u8,
    offset: u16,
    latch: u8,
    aligned: bool,
}

/// Everything the CPU can address, plus the PPU-side CIRAM.
pub struct BusIo {
    /// 2 KiB work RAM, mirrored four times.
    pub ram: [u8; 2048],
    /// 2 KiB nametable RAM, mirrored per the mapper.
    pub ciram: [u8; 2048],
    /// Picture processor.
    pub ppu: Ppu,
    /// Audio processor.
    pub apu: Apu,
    /// The inserted cartridge.
    pub cart: Cartridge,

    /// Live pad state per port.
    pads: [u8; 2],
    shift: [u8; 2],
    strobe: bool,

    dma: Option<OamDma>,
    open_bus: u8,
}

/// Map a nametable address onto the 2 KiB CIRAM.
fn ciram_index(mirroring: Mirroring, addr: u16) -> usize {
    let addr = usize::from(addr) & 0x0FFF;
    let offset = addr & 0x03FF;
    match mirroring {
        Mirroring::Horizontal => ((addr >> 11) & 0x01) * 0x400 + offset,
        // Four-screen boards supply their own VRAM through the mapper;
        // anything that still lands here behaves like vertical.
        Mirroring::Vertical | Mirroring::FourScreen => ((addr >> 10) & 0x01) * 0x400 + offset,
        Mirroring::OneScreenLo => offset,
        Mirroring::OneScreenHi => 0x400 + offset,
    }
}

/// Short-lived PPU-side view over the cartridge and CIRAM. The cartridge
/// sees every access first; only unclaimed nametable traffic reaches
/// CIRAM.
struct PpuCartPort<'a> {
    cart: &'a mut Cartridge,
    ciram: &'a mut [u8; 2048],
}

impl PpuPort for PpuCartPort<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        if let Some(value) = self.cart.ppu_read(addr) {
            return value;
        }
        match addr {
            0x2000..=0x3EFF => self.ciram[ciram_index(self.cart.mirroring(), addr)],
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;
        if self.cart.ppu_write(addr, value) {
            return;
        }
        if let 0x2000..=0x3EFF = addr {
            self.ciram[ciram_index(self.cart.mirroring(), addr)] = value;
        }
    }
}

impl BusIo {
    fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 2048],
            ciram: [0; 2048],
            ppu: Ppu::new(),
            apu: Apu::new(),
            cart,
            pads: [0; 2],
            shift: [0; 2],
            strobe: false,
            dma: None,
            open_bus: 0,
        }
    }

    fn read_controller(&mut self, port: usize) -> u8 {
        if self.strobe {
            self.shift = self.pads;
        }
        let bit = self.shift[port] >> 7;
        self.shift[port] <<= 1;
        // Only D0 is driven; the rest is open bus.
        bit | (self.open_bus & 0xE0)
    }

    fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 0x01 != 0;
        if self.strobe {
            self.shift = self.pads;
        }
    }

    /// One OAM DMA micro-step: a leading dummy cycle aligns the transfer
    /// to an even CPU cycle, then reads and writes alternate. The whole
    /// transfer spans 513 or 514 CPU cycles depending on start parity.
    fn dma_step(&mut self, master_clock: u64) {
        let Some(mut dma) = self.dma.take() else {
            return;
        };

        if !dma.aligned {
            if master_clock % 2 == 1 {
                dma.aligned = true;
            }
            self.dma = Some(dma);
            return;
        }

        if master_clock % 2 == 0 {
            let addr = (u16::from(dma.page) << 8) | dma.offset;
            dma.latch = self.read(addr);
            self.dma = Some(dma);
        } else {
            self.ppu.oam_dma_write(dma.latch);
            dma.offset += 1;
            if dma.offset < 256 {
                self.dma = Some(dma);
            }
        }
    }

    fn dma_active(&self) -> bool {
        self.dma.is_some()
    }
}

impl CpuBus for BusIo {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr) & 0x07FF],
            0x2000..=0x3FFF => {
                let mut port = PpuCartPort {
                    cart: &mut self.cart,
                    ciram: &mut self.ciram,
                };
                self.ppu.read_register(addr, &mut port)
            }
            0x4015 => self.apu.read_status(),
            0x4016 => self.read_controller(0),
            0x4017 => self.read_controller(1),
            // Write-only APU/IO registers read back as open bus.
            0x4000..=0x401F => self.open_bus,
            0x4020..=0xFFFF => self.cart.cpu_read(addr).unwrap_or(self.open_bus),
        };
        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr) & 0x07FF] = value,
            0x2000..=0x3FFF => {
                let mut port = PpuCartPort {
                    cart: &mut self.cart,
                    ciram: &mut self.ciram,
                };
                self.ppu.write_register(addr, value, &mut port);
            }
            0x4014 => {
                self.dma = Some(OamDma {
                    page: value,
                    offset: 0,
                    latch: 0,
                    aligned: false,
                });
            }
            0x4016 => self.write_strobe(value),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, value),
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => {
                self.cart.cpu_write(addr, value);
            }
        }
    }
}

/// The assembled machine: CPU plus everything it talks to.
pub struct Bus {
    /// The 2A03 CPU core.
    pub cpu: Cpu,
    /// The rest of the machine.
    pub io: BusIo,
    master_clock: u64,
}

impl Bus {
    /// Wire a machine around a cartridge. Call [`Bus::reset`] before
    /// clocking.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        Self {
            cpu: Cpu::new(),
            io: BusIo::new(cart),
            master_clock: 0,
        }
    }

    /// Power-on/reset for every component. Never blocks, never allocates.
    pub fn reset(&mut self) {
        self.io.ram = [0; 2048];
        self.io.ciram = [0; 2048];
        self.io.cart.reset();
        self.io.ppu.reset();
        self.io.apu.reset();
        self.io.shift = [0; 2];
        self.io.strobe = false;
        self.io.dma = None;
        self.io.open_bus = 0;
        self.master_clock = 0;
        self.cpu.reset(&mut self.io);
        log::debug!("bus reset");
    }

    /// Advance one master tick (one PPU dot). Returns `true` on ticks
    /// that carried a CPU-rate step, for audio pacing.
    pub fn clock(&mut self) -> bool {
        let io = &mut self.io;

        {
            let mut port = PpuCartPort {
                cart: &mut io.cart,
                ciram: &mut io.ciram,
            };
            io.ppu.clock(&mut port);
        }

        // Rendering-activity notification for scanline-counting mappers,
        // just past dot 260 of the pre-render and visible lines.
        if io.ppu.dot() == 261 && io.ppu.scanline() < 240 && io.ppu.rendering_enabled() {
            io.cart.on_scanline();
        }

        let cpu_tick = self.master_clock % 3 == 0;
        if cpu_tick {
            io.apu.clock();

            // DMC DMA: the bus fetches the byte and the CPU pays a coarse
            // four-cycle stall.
            if io.apu.dmc_needs_sample() {
                let addr = io.apu.dmc_sample_address();
                let value = io.read(addr);
                io.apu.dmc_load_sample(value);
                self.cpu.stall += 4;
            }

            if io.dma_active() {
                io.dma_step(self.master_clock);
            } else {
                self.cpu.clock(io);
            }

            io.cart.on_cpu_cycle();

            // Level-sampled IRQ wiring: the asserting device deasserts.
            self.cpu
                .set_irq(io.cart.irq_pending() || io.apu.irq_pending());
        }

        // NMI edge delivered after the CPU step of this tick.
        if io.ppu.take_nmi() {
            self.cpu.nmi();
        }

        self.master_clock = self.master_clock.wrapping_add(1);
        cpu_tick
    }

    /// Master ticks elapsed (3 per CPU cycle).
    #[must_use]
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Latch the live button state for a controller port.
    pub fn set_buttons(&mut self, port: usize, state: u8) {
        self.io.pads[port & 0x01] = state;
    }
}
