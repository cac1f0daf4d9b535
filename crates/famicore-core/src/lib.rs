//! famicore: the assembled NES core.
//!
//! [`Bus`] interleaves the three clock domains (PPU every master tick,
//! CPU and APU every third tick) over one shared memory map, with OAM
//! DMA, controller latches and the IRQ/NMI wiring in between. [`Console`]
//! drives the bus frame by frame and resamples audio into a lock-free
//! ring for the playback thread.
//!
//! ```no_run
//! use famicore_core::Console;
//!
//! let rom = std::fs::read("game.nes").expect("read ROM");
//! let mut console = Console::new(&rom).expect("load ROM");
//! let audio = console.take_audio_consumer().expect("audio ring");
//! loop {
//!     console.run_frame();
//!     let frame: &[u32] = console.frame_buffer();
//!     // hand `frame` to the display, let the audio callback drain `audio`
//!     # let _ = (frame, &audio);
//!     # break;
//! }
//! ```

mod audio;
mod bus;
mod console;

pub use audio::{audio_channel, AudioConsumer, AudioProducer, Resampler};
pub use bus::{buttons, Bus, BusIo};
pub use console::{timing, Console, ConsoleError};

pub use famicore_apu::Apu;
pub use famicore_cart::{Cartridge, CartridgeError, Mirroring};
pub use famicore_cpu::{Cpu, CpuBus};
pub use famicore_ppu::{Ppu, FRAME_HEIGHT, FRAME_WIDTH};
