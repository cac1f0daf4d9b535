//! CPU validation against the nestest reference log.
//!
//! Place `nestest.nes` and `nestest.log` under `tests/roms/` to enable
//! this suite; without them the test passes vacuously so CI does not need
//! the ROM checked in. In automated mode execution starts at $C000 and
//! the trace must match the log's registers and cycle counts exactly.

use famicore_core::{Bus, Cartridge};

/// One reference line: PC, A, X, Y, P, SP, CPU cycle.
struct LogLine {
    pc: u16,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    sp: u8,
    cycles: u64,
}

fn parse_line(line: &str) -> Option<LogLine> {
    // Format: "C000  4C F5 C5  JMP ... A:00 X:00 Y:00 P:24 SP:FD PPU:...,CYC:7"
    let pc = u16::from_str_radix(line.get(0..4)?, 16).ok()?;
    let field = |tag: &str| -> Option<u8> {
        let at = line.find(tag)? + tag.len();
        u8::from_str_radix(line.get(at..at + 2)?, 16).ok()
    };
    let cyc_at = line.find("CYC:")? + 4;
    let cycles = line[cyc_at..].trim().parse().ok()?;
    Some(LogLine {
        pc,
        a: field("A:")?,
        x: field("X:")?,
        y: field("Y:")?,
        p: field("P:")?,
        sp: field("SP:")?,
        cycles,
    })
}

#[test]
fn nestest_automated_trace() {
    let rom_path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/roms/nestest.nes");
    let log_path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/roms/nestest.log");
    let (Ok(rom), Ok(log)) = (std::fs::read(rom_path), std::fs::read_to_string(log_path)) else {
        eprintln!("nestest.nes/log not present, skipping trace comparison");
        return;
    };

    let mut bus = Bus::new(Cartridge::load(&rom).unwrap());
    bus.reset();
    // Automated mode: execution starts at $C000 with 7 cycles on the
    // clock, as the reference log assumes.
    bus.cpu.pc = 0xC000;

    for (index, line) in log.lines().take(8991).enumerate() {
        let Some(expected) = parse_line(line) else {
            panic!("unparseable log line {index}");
        };

        assert_eq!(bus.cpu.pc, expected.pc, "PC at line {index}");
        assert_eq!(bus.cpu.a, expected.a, "A at line {index}");
        assert_eq!(bus.cpu.x, expected.x, "X at line {index}");
        assert_eq!(bus.cpu.y, expected.y, "Y at line {index}");
        assert_eq!(bus.cpu.status.bits(), expected.p, "P at line {index}");
        assert_eq!(bus.cpu.sp, expected.sp, "SP at line {index}");
        assert_eq!(bus.cpu.cycles, expected.cycles, "cycles at line {index}");

        // Step exactly one instruction.
        let start = bus.cpu.cycles;
        loop {
            bus.clock();
            if bus.cpu.cycles > start && bus.cpu.at_instruction_boundary() {
                break;
            }
        }
    }
}
