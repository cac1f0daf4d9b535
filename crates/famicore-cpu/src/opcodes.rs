//! 6502 opcode decode table.
//!
//! Each of the 256 opcodes maps to an [`OpInfo`] tuple of operation,
//! addressing mode, base cycle count and whether a crossed page adds a cycle.
//! Slots not covered by the documented set or the stable undocumented set
//! decode as NOPs of the correct length so that no byte stream can jam the
//! core.

/// Addressing modes of the 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// No operand.
    Implied,
    /// Operates on the accumulator.
    Accumulator,
    /// Operand is the next byte.
    Immediate,
    /// One-byte address in page zero.
    ZeroPage,
    /// Zero-page address indexed by X (wraps within page zero).
    ZeroPageX,
    /// Zero-page address indexed by Y (wraps within page zero).
    ZeroPageY,
    /// Two-byte absolute address.
    Absolute,
    /// Absolute address indexed by X.
    AbsoluteX,
    /// Absolute address indexed by Y.
    AbsoluteY,
    /// JMP ($xxxx) with the page-wrap bug on the high byte fetch.
    Indirect,
    /// ($zp,X) indexed indirect.
    IndirectX,
    /// ($zp),Y indirect indexed.
    IndirectY,
    /// Signed branch offset.
    Relative,
}

/// Operations, documented and the stable undocumented set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // Mnemonics are their own documentation
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // Undocumented
    Lax, Sax, Dcp, Isc, Slo, Rla, Sre, Rra, Anc, Alr, Arr, Axs, Las,
}

/// One decode table entry.
#[derive(Debug, Clone, Copy)]
pub struct OpInfo {
    /// Operation to perform.
    pub op: Op,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count.
    pub cycles: u8,
    /// Whether a page cross on an indexed read adds one cycle.
    pub page_penalty: bool,
}

const fn e(op: Op, mode: AddrMode, cycles: u8, page_penalty: bool) -> OpInfo {
    OpInfo {
        op,
        mode,
        cycles,
        page_penalty,
    }
}

/// The 256-entry decode table.
pub const OPCODE_TABLE: [OpInfo; 256] = {
    use AddrMode::{
        Absolute as Abs, AbsoluteX as AbX, AbsoluteY as AbY, Accumulator as Acc,
        Immediate as Imm, Implied as Imp, Indirect as Ind, IndirectX as InX,
        IndirectY as InY, Relative as Rel, ZeroPage as Zp, ZeroPageX as ZpX,
        ZeroPageY as ZpY,
    };
    use Op::*;

    // Unlisted opcodes (the unstable/jamming ones) fall through to a
    // two-cycle implied NOP: harmless and never a deadlock.
    let mut t = [e(Nop, Imp, 2, false); 256];

    // Loads / stores
    t[0xA9] = e(Lda, Imm, 2, false);
    t[0xA5] = e(Lda, Zp, 3, false);
    t[0xB5] = e(Lda, ZpX, 4, false);
    t[0xAD] = e(Lda, Abs, 4, false);
    t[0xBD] = e(Lda, AbX, 4, true);
    t[0xB9] = e(Lda, AbY, 4, true);
    t[0xA1] = e(Lda, InX, 6, false);
    t[0xB1] = e(Lda, InY, 5, true);
    t[0xA2] = e(Ldx, Imm, 2, false);
    t[0xA6] = e(Ldx, Zp, 3, false);
    t[0xB6] = e(Ldx, ZpY, 4, false);
    t[0xAE] = e(Ldx, Abs, 4, false);
    t[0xBE] = e(Ldx, AbY, 4, true);
    t[0xA0] = e(Ldy, Imm, 2, false);
    t[0xA4] = e(Ldy, Zp, 3, false);
    t[0xB4] = e(Ldy, ZpX, 4, false);
    t[0xAC] = e(Ldy, Abs, 4, false);
    t[0xBC] = e(Ldy, AbX, 4, true);
    t[0x85] = e(Sta, Zp, 3, false);
    t[0x95] = e(Sta, ZpX, 4, false);
    t[0x8D] = e(Sta, Abs, 4, false);
    t[0x9D] = e(Sta, AbX, 5, false);
    t[0x99] = e(Sta, AbY, 5, false);
    t[0x81] = e(Sta, InX, 6, false);
    t[0x91] = e(Sta, InY, 6, false);
    t[0x86] = e(Stx, Zp, 3, false);
    t[0x96] = e(Stx, ZpY, 4, false);
    t[0x8E] = e(Stx, Abs, 4, false);
    t[0x84] = e(Sty, Zp, 3, false);
    t[0x94] = e(Sty, ZpX, 4, false);
    t[0x8C] = e(Sty, Abs, 4, false);

    // Arithmetic
    t[0x69] = e(Adc, Imm, 2, false);
    t[0x65] = e(Adc, Zp, 3, false);
    t[0x75] = e(Adc, ZpX, 4, false);
    t[0x6D] = e(Adc, Abs, 4, false);
    t[0x7D] = e(Adc, AbX, 4, true);
    t[0x79] = e(Adc, AbY, 4, true);
    t[0x61] = e(Adc, InX, 6, false);
    t[0x71] = e(Adc, InY, 5, true);
    t[0xE9] = e(Sbc, Imm, 2, false);
    t[0xE5] = e(Sbc, Zp, 3, false);
    t[0xF5] = e(Sbc, ZpX, 4, false);
    t[0xED] = e(Sbc, Abs, 4, false);
    t[0xFD] = e(Sbc, AbX, 4, true);
    t[0xF9] = e(Sbc, AbY, 4, true);
    t[0xE1] = e(Sbc, InX, 6, false);
    t[0xF1] = e(Sbc, InY, 5, true);
    t[0xEB] = e(Sbc, Imm, 2, false); // undocumented alias

    // Logic
    t[0x29] = e(And, Imm, 2, false);
    t[0x25] = e(And, Zp, 3, false);
    t[0x35] = e(And, ZpX, 4, false);
    t[0x2D] = e(And, Abs, 4, false);
    t[0x3D] = e(And, AbX, 4, true);
    t[0x39] = e(And, AbY, 4, true);
    t[0x21] = e(And, InX, 6, false);
    t[0x31] = e(And, InY, 5, true);
    t[0x09] = e(Ora, Imm, 2, false);
    t[0x05] = e(Ora, Zp, 3, false);
    t[0x15] = e(Ora, ZpX, 4, false);
    t[0x0D] = e(Ora, Abs, 4, false);
    t[0x1D] = e(Ora, AbX, 4, true);
    t[0x19] = e(Ora, AbY, 4, true);
    t[0x01] = e(Ora, InX, 6, false);
    t[0x11] = e(Ora, InY, 5, true);
    t[0x49] = e(Eor, Imm, 2, false);
    t[0x45] = e(Eor, Zp, 3, false);
    t[0x55] = e(Eor, ZpX, 4, false);
    t[0x4D] = e(Eor, Abs, 4, false);
    t[0x5D] = e(Eor, AbX, 4, true);
    t[0x59] = e(Eor, AbY, 4, true);
    t[0x41] = e(Eor, InX, 6, false);
    t[0x51] = e(Eor, InY, 5, true);
    t[0x24] = e(Bit, Zp, 3, false);
    t[0x2C] = e(Bit, Abs, 4, false);

    // Compares
    t[0xC9] = e(Cmp, Imm, 2, false);
    t[0xC5] = e(Cmp, Zp, 3, false);
    t[0xD5] = e(Cmp, ZpX, 4, false);
    t[0xCD] = e(Cmp, Abs, 4, false);
    t[0xDD] = e(Cmp, AbX, 4, true);
    t[0xD9] = e(Cmp, AbY, 4, true);
    t[0xC1] = e(Cmp, InX, 6, false);
    t[0xD1] = e(Cmp, InY, 5, true);
    t[0xE0] = e(Cpx, Imm, 2, false);
    t[0xE4] = e(Cpx, Zp, 3, false);
    t[0xEC] = e(Cpx, Abs, 4, false);
    t[0xC0] = e(Cpy, Imm, 2, false);
    t[0xC4] = e(Cpy, Zp, 3, false);
    t[0xCC] = e(Cpy, Abs, 4, false);

    // Shifts / rotates
    t[0x0A] = e(Asl, Acc, 2, false);
    t[0x06] = e(Asl, Zp, 5, false);
    t[0x16] = e(Asl, ZpX, 6, false);
    t[0x0E] = e(Asl, Abs, 6, false);
    t[0x1E] = e(Asl, AbX, 7, false);
    t[0x4A] = e(Lsr, Acc, 2, false);
    t[0x46] = e(Lsr, Zp, 5, false);
    t[0x56] = e(Lsr, ZpX, 6, false);
    t[0x4E] = e(Lsr, Abs, 6, false);
    t[0x5E] = e(Lsr, AbX, 7, false);
    t[0x2A] = e(Rol, Acc, 2, false);
    t[0x26] = e(Rol, Zp, 5, false);
    t[0x36] = e(Rol, ZpX, 6, false);
    t[0x2E] = e(Rol, Abs, 6, false);
    t[0x3E] = e(Rol, AbX, 7, false);
    t[0x6A] = e(Ror, Acc, 2, false);
    t[0x66] = e(Ror, Zp, 5, false);
    t[0x76] = e(Ror, ZpX, 6, false);
    t[0x6E] = e(Ror, Abs, 6, false);
    t[0x7E] = e(Ror, AbX, 7, false);

    // Increments / decrements
    t[0xE6] = e(Inc, Zp, 5, false);
    t[0xF6] = e(Inc, ZpX, 6, false);
    t[0xEE] = e(Inc, Abs, 6, false);
    t[0xFE] = e(Inc, AbX, 7, false);
    t[0xC6] = e(Dec, Zp, 5, false);
    t[0xD6] = e(Dec, ZpX, 6, false);
    t[0xCE] = e(Dec, Abs, 6, false);
    t[0xDE] = e(Dec, AbX, 7, false);
    t[0xE8] = e(Inx, Imp, 2, false);
    t[0xC8] = e(Iny, Imp, 2, false);
    t[0xCA] = e(Dex, Imp, 2, false);
    t[0x88] = e(Dey, Imp, 2, false);

    // Control flow
    t[0x4C] = e(Jmp, Abs, 3, false);
    t[0x6C] = e(Jmp, Ind, 5, false);
    t[0x20] = e(Jsr, Abs, 6, false);
    t[0x60] = e(Rts, Imp, 6, false);
    t[0x40] = e(Rti, Imp, 6, false);
    t[0x00] = e(Brk, Imp, 7, false);
    t[0x10] = e(Bpl, Rel, 2, false);
    t[0x30] = e(Bmi, Rel, 2, false);
    t[0x50] = e(Bvc, Rel, 2, false);
    t[0x70] = e(Bvs, Rel, 2, false);
    t[0x90] = e(Bcc, Rel, 2, false);
    t[0xB0] = e(Bcs, Rel, 2, false);
    t[0xD0] = e(Bne, Rel, 2, false);
    t[0xF0] = e(Beq, Rel, 2, false);

    // Stack / transfers
    t[0x48] = e(Pha, Imp, 3, false);
    t[0x08] = e(Php, Imp, 3, false);
    t[0x68] = e(Pla, Imp, 4, false);
    t[0x28] = e(Plp, Imp, 4, false);
    t[0xAA] = e(Tax, Imp, 2, false);
    t[0xA8] = e(Tay, Imp, 2, false);
    t[0xBA] = e(Tsx, Imp, 2, false);
    t[0x8A] = e(Txa, Imp, 2, false);
    t[0x9A] = e(Txs, Imp, 2, false);
    t[0x98] = e(Tya, Imp, 2, false);

    // Flags
    t[0x18] = e(Clc, Imp, 2, false);
    t[0x38] = e(Sec, Imp, 2, false);
    t[0x58] = e(Cli, Imp, 2, false);
    t[0x78] = e(Sei, Imp, 2, false);
    t[0xB8] = e(Clv, Imp, 2, false);
    t[0xD8] = e(Cld, Imp, 2, false);
    t[0xF8] = e(Sed, Imp, 2, false);
    t[0xEA] = e(Nop, Imp, 2, false);

    // Undocumented NOPs with real operand fetches
    t[0x1A] = e(Nop, Imp, 2, false);
    t[0x3A] = e(Nop, Imp, 2, false);
    t[0x5A] = e(Nop, Imp, 2, false);
    t[0x7A] = e(Nop, Imp, 2, false);
    t[0xDA] = e(Nop, Imp, 2, false);
    t[0xFA] = e(Nop, Imp, 2, false);
    t[0x80] = e(Nop, Imm, 2, false);
    t[0x82] = e(Nop, Imm, 2, false);
    t[0x89] = e(Nop, Imm, 2, false);
    t[0xC2] = e(Nop, Imm, 2, false);
    t[0xE2] = e(Nop, Imm, 2, false);
    t[0x04] = e(Nop, Zp, 3, false);
    t[0x44] = e(Nop, Zp, 3, false);
    t[0x64] = e(Nop, Zp, 3, false);
    t[0x14] = e(Nop, ZpX, 4, false);
    t[0x34] = e(Nop, ZpX, 4, false);
    t[0x54] = e(Nop, ZpX, 4, false);
    t[0x74] = e(Nop, ZpX, 4, false);
    t[0xD4] = e(Nop, ZpX, 4, false);
    t[0xF4] = e(Nop, ZpX, 4, false);
    t[0x0C] = e(Nop, Abs, 4, false);
    t[0x1C] = e(Nop, AbX, 4, true);
    t[0x3C] = e(Nop, AbX, 4, true);
    t[0x5C] = e(Nop, AbX, 4, true);
    t[0x7C] = e(Nop, AbX, 4, true);
    t[0xDC] = e(Nop, AbX, 4, true);
    t[0xFC] = e(Nop, AbX, 4, true);

    // Undocumented combined operations
    t[0xA7] = e(Lax, Zp, 3, false);
    t[0xB7] = e(Lax, ZpY, 4, false);
    t[0xAF] = e(Lax, Abs, 4, false);
    t[0xBF] = e(Lax, AbY, 4, true);
    t[0xA3] = e(Lax, InX, 6, false);
    t[0xB3] = e(Lax, InY, 5, true);
    t[0x87] = e(Sax, Zp, 3, false);
    t[0x97] = e(Sax, ZpY, 4, false);
    t[0x8F] = e(Sax, Abs, 4, false);
    t[0x83] = e(Sax, InX, 6, false);
    t[0xC7] = e(Dcp, Zp, 5, false);
    t[0xD7] = e(Dcp, ZpX, 6, false);
    t[0xCF] = e(Dcp, Abs, 6, false);
    t[0xDF] = e(Dcp, AbX, 7, false);
    t[0xDB] = e(Dcp, AbY, 7, false);
    t[0xC3] = e(Dcp, InX, 8, false);
    t[0xD3] = e(Dcp, InY, 8, false);
    t[0xE7] = e(Isc, Zp, 5, false);
    t[0xF7] = e(Isc, ZpX, 6, false);
    t[0xEF] = e(Isc, Abs, 6, false);
    t[0xFF] = e(Isc, AbX, 7, false);
    t[0xFB] = e(Isc, AbY, 7, false);
    t[0xE3] = e(Isc, InX, 8, false);
    t[0xF3] = e(Isc, InY, 8, false);
    t[0x07] = e(Slo, Zp, 5, false);
    t[0x17] = e(Slo, ZpX, 6, false);
    t[0x0F] = e(Slo, Abs, 6, false);
    t[0x1F] = e(Slo, AbX, 7, false);
    t[0x1B] = e(Slo, AbY, 7, false);
    t[0x03] = e(Slo, InX, 8, false);
    t[0x13] = e(Slo, InY, 8, false);
    t[0x27] = e(Rla, Zp, 5, false);
    t[0x37] = e(Rla, ZpX, 6, false);
    t[0x2F] = e(Rla, Abs, 6, false);
    t[0x3F] = e(Rla, AbX, 7, false);
    t[0x3B] = e(Rla, AbY, 7, false);
    t[0x23] = e(Rla, InX, 8, false);
    t[0x33] = e(Rla, InY, 8, false);
    t[0x47] = e(Sre, Zp, 5, false);
    t[0x57] = e(Sre, ZpX, 6, false);
    t[0x4F] = e(Sre, Abs, 6, false);
    t[0x5F] = e(Sre, AbX, 7, false);
    t[0x5B] = e(Sre, AbY, 7, false);
    t[0x43] = e(Sre, InX, 8, false);
    t[0x53] = e(Sre, InY, 8, false);
    t[0x67] = e(Rra, Zp, 5, false);
    t[0x77] = e(Rra, ZpX, 6, false);
    t[0x6F] = e(Rra, Abs, 6, false);
    t[0x7F] = e(Rra, AbX, 7, false);
    t[0x7B] = e(Rra, AbY, 7, false);
    t[0x63] = e(Rra, InX, 8, false);
    t[0x73] = e(Rra, InY, 8, false);
    t[0x0B] = e(Anc, Imm, 2, false);
    t[0x2B] = e(Anc, Imm, 2, false);
    t[0x4B] = e(Alr, Imm, 2, false);
    t[0x6B] = e(Arr, Imm, 2, false);
    t[0xCB] = e(Axs, Imm, 2, false);
    t[0xBB] = e(Las, AbY, 4, true);

    // Unstable store-high ops decode to NOPs of the documented shape
    t[0x8B] = e(Nop, Imm, 2, false);
    t[0xAB] = e(Nop, Imm, 2, false);
    t[0x93] = e(Nop, InY, 6, false);
    t[0x9B] = e(Nop, AbY, 5, false);
    t[0x9C] = e(Nop, AbX, 5, false);
    t[0x9E] = e(Nop, AbY, 5, false);
    t[0x9F] = e(Nop, AbY, 5, false);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_entries() {
        let lda = &OPCODE_TABLE[0xA9];
        assert_eq!(lda.op, Op::Lda);
        assert_eq!(lda.mode, AddrMode::Immediate);
        assert_eq!(lda.cycles, 2);

        let sta = &OPCODE_TABLE[0x9D];
        assert_eq!(sta.op, Op::Sta);
        assert_eq!(sta.cycles, 5);
        assert!(!sta.page_penalty, "stores always pay the worst case");
    }

    #[test]
    fn no_zero_cycle_entries() {
        for (i, info) in OPCODE_TABLE.iter().enumerate() {
            assert!(info.cycles >= 2, "opcode {i:02X} has < 2 cycles");
        }
    }
}
