//! PPU register file: PPUCTRL, PPUMASK and PPUSTATUS.

use bitflags::bitflags;

bitflags! {
    /// $2000 PPUCTRL.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuCtrl: u8 {
        /// Base nametable select, bit 0.
        const NAMETABLE_X = 0x01;
        /// Base nametable select, bit 1.
        const NAMETABLE_Y = 0x02;
        /// VRAM address increment: 0 = +1 across, 1 = +32 down.
        const INCREMENT = 0x04;
        /// Sprite pattern table for 8x8 sprites.
        const SPRITE_TABLE = 0x08;
        /// Background pattern table.
        const BG_TABLE = 0x10;
        /// Sprite size: 0 = 8x8, 1 = 8x16.
        const SPRITE_SIZE = 0x20;
        /// PPU master/slave select (unused in the NES).
        const MASTER_SLAVE = 0x40;
        /// Generate NMI at the start of vertical blank.
        const NMI_ENABLE = 0x80;
    }
}

impl PpuCtrl {
    /// $2007 address increment.
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(PpuCtrl::INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Pattern table base for 8x8 sprites.
    #[must_use]
    pub fn sprite_table(self) -> u16 {
        if self.contains(PpuCtrl::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Pattern table base for background tiles.
    #[must_use]
    pub fn bg_table(self) -> u16 {
        if self.contains(PpuCtrl::BG_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in scanlines (8 or 16).
    #[must_use]
    pub fn sprite_height(self) -> i16 {
        if self.contains(PpuCtrl::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }

    /// NMI on vblank enabled.
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(PpuCtrl::NMI_ENABLE)
    }
}

bitflags! {
    /// $2001 PPUMASK.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuMask: u8 {
        /// Grayscale: AND palette indices with $30.
        const GRAYSCALE = 0x01;
        /// Show background in the leftmost 8 pixels.
        const BG_LEFT = 0x02;
        /// Show sprites in the leftmost 8 pixels.
        const SPRITES_LEFT = 0x04;
        /// Enable background rendering.
        const SHOW_BG = 0x08;
        /// Enable sprite rendering.
        const SHOW_SPRITES = 0x10;
        /// Emphasize red.
        const EMPHASIZE_RED = 0x20;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 0x40;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 0x80;
    }
}

impl PpuMask {
    /// Either background or sprite rendering is on.
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(PpuMask::SHOW_BG | PpuMask::SHOW_SPRITES)
    }

    /// Emphasis bits as a 3-bit value (R=1, G=2, B=4).
    #[must_use]
    pub fn emphasis(self) -> u8 {
        self.bits() >> 5
    }
}

bitflags! {
    /// $2002 PPUSTATUS. The low five bits are open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuStatus: u8 {
        /// More than eight sprites on a scanline.
        const SPRITE_OVERFLOW = 0x20;
        /// Opaque sprite-0 pixel overlapped an opaque background pixel.
        const SPRITE_ZERO_HIT = 0x40;
        /// Currently in vertical blank.
        const VBLANK = 0x80;
    }
}
