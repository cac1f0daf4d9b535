//! APU register file and channel wiring.

use bitflags::bitflags;

use crate::dmc::Dmc;
use crate::frame_counter::FrameCounter;
use crate::mixer;
use crate::noise::Noise;
use crate::pulse::{Pulse, PulseChannel};
use crate::triangle::Triangle;

bitflags! {
    /// $4015 status layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct ApuStatus: u8 {
        const PULSE_1 = 0x01;
        const PULSE_2 = 0x02;
        const TRIANGLE = 0x04;
        const NOISE = 0x08;
        const DMC = 0x10;
        const FRAME_IRQ = 0x40;
        const DMC_IRQ = 0x80;
    }
}

/// The 2A03 audio processor, clocked at the CPU rate.
#[derive(Debug, Clone)]
pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame_counter: FrameCounter,
    cycle: u64,
}

impl Apu {
    /// Power-on state: everything silent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pulse1: Pulse::new(PulseChannel::One),
            pulse2: Pulse::new(PulseChannel::Two),
            triangle: Triangle::new(),
            noise: Noise::new(),
            dmc: Dmc::new(),
            frame_counter: FrameCounter::new(),
            cycle: 0,
        }
    }

    /// Return to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
        log::trace!("apu reset");
    }

    /// Register write, $4000-$4013, $4015 or $4017.
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000 => self.pulse1.write_ctrl(value),
            0x4001 => self.pulse1.write_sweep(value),
            0x4002 => self.pulse1.write_timer_lo(value),
            0x4003 => self.pulse1.write_timer_hi(value),

            0x4004 => self.pulse2.write_ctrl(value),
            0x4005 => self.pulse2.write_sweep(value),
            0x4006 => self.pulse2.write_timer_lo(value),
            0x4007 => self.pulse2.write_timer_hi(value),

            0x4008 => self.triangle.write_linear(value),
            0x400A => self.triangle.write_timer_lo(value),
            0x400B => self.triangle.write_timer_hi(value),

            0x400C => self.noise.write_ctrl(value),
            0x400E => self.noise.write_period(value),
            0x400F => self.noise.write_length(value),

            0x4010 => self.dmc.write_ctrl(value),
            0x4011 => self.dmc.write_direct(value),
            0x4012 => self.dmc.write_address(value),
            0x4013 => self.dmc.write_length(value),

            0x4015 => {
                self.pulse1.set_enabled(value & 0x01 != 0);
                self.pulse2.set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }

            0x4017 => {
                // The sequence restarts immediately; mode 1 also applies a
                // quarter+half clock right away.
                if self.frame_counter.write(value) {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
            }

            _ => {}
        }
    }

    /// $4015 read: channel activity plus the two IRQ flags. Clears the
    /// frame IRQ (the DMC IRQ is only cleared by $4010/$4015 writes).
    pub fn read_status(&mut self) -> u8 {
        let status = self.peek_status();
        self.frame_counter.clear_irq();
        status
    }

    /// $4015 value without side effects.
    #[must_use]
    pub fn peek_status(&self) -> u8 {
        let mut status = ApuStatus::empty();
        status.set(ApuStatus::PULSE_1, self.pulse1.active());
        status.set(ApuStatus::PULSE_2, self.pulse2.active());
        status.set(ApuStatus::TRIANGLE, self.triangle.active());
        status.set(ApuStatus::NOISE, self.noise.active());
        status.set(ApuStatus::DMC, self.dmc.active());
        status.set(ApuStatus::FRAME_IRQ, self.frame_counter.irq_pending());
        status.set(ApuStatus::DMC_IRQ, self.dmc.irq_pending());
        status.bits()
    }

    /// Advance one CPU cycle. The triangle and DMC timers run every cycle,
    /// pulse and noise every other one.
    pub fn clock(&mut self) {
        self.triangle.clock_timer();
        self.dmc.clock_timer();

        if self.cycle % 2 == 1 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
        }

        let frame = self.frame_counter.clock();
        if frame.quarter {
            self.clock_quarter_frame();
        }
        if frame.half {
            self.clock_half_frame();
        }

        self.cycle = self.cycle.wrapping_add(1);
    }

    fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.triangle.clock_linear();
        self.noise.clock_envelope();
    }

    fn clock_half_frame(&mut self) {
        self.pulse1.clock_length();
        self.pulse2.clock_length();
        self.pulse1.clock_sweep();
        self.pulse2.clock_sweep();
        self.triangle.clock_length();
        self.noise.clock_length();
    }

    /// Current mixed sample.
    #[must_use]
    pub fn output(&self) -> f32 {
        mixer::mix(
            self.pulse1.output(),
            self.pulse2.output(),
            self.triangle.output(),
            self.noise.output(),
            self.dmc.output(),
        )
    }

    /// DMC wants a byte fetched over the CPU bus.
    #[must_use]
    pub fn dmc_needs_sample(&self) -> bool {
        self.dmc.needs_sample()
    }

    /// Address of the pending DMC fetch.
    #[must_use]
    pub fn dmc_sample_address(&self) -> u16 {
        self.dmc.sample_address()
    }

    /// Hand the fetched byte to the DMC.
    pub fn dmc_load_sample(&mut self, value: u8) {
        self.dmc.load_sample(value);
    }

    /// Frame counter or DMC IRQ asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.frame_counter.irq_pending() || self.dmc.irq_pending()
    }

    /// CPU cycles seen.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycle
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reflects_length_counters() {
        let mut apu = Apu::new();
        assert_eq!(apu.read_status(), 0);

        apu.write(0x4015, 0x0F);
        apu.write(0x4003, 0x08); // load pulse 1 length
        apu.write(0x4007, 0x08);
        apu.write(0x400B, 0x08);
        apu.write(0x400F, 0x08);
        assert_eq!(apu.read_status() & 0x0F, 0x0F);

        // Disabling zeroes the counters at once.
        apu.write(0x4015, 0x00);
        assert_eq!(apu.read_status() & 0x0F, 0x00);
    }

    #[test]
    fn frame_irq_fires_and_clears_on_read() {
        let mut apu = Apu::new();
        for _ in 0..29830 {
            apu.clock();
        }
        assert!(apu.irq_pending());
        let status = apu.read_status();
        assert_eq!(status & 0x40, 0x40);
        assert!(!apu.irq_pending());
    }

    #[test]
    fn five_step_mode_suppresses_irq() {
        let mut apu = Apu::new();
        apu.write(0x4017, 0xC0);
        for _ in 0..40000 {
            apu.clock();
        }
        assert!(!apu.irq_pending());
    }

    #[test]
    fn dmc_requests_samples_when_enabled() {
        let mut apu = Apu::new();
        apu.write(0x4012, 0x00);
        apu.write(0x4013, 0x01);
        apu.write(0x4015, 0x10);
        assert!(apu.dmc_needs_sample());
        assert_eq!(apu.dmc_sample_address(), 0xC000);
        apu.dmc_load_sample(0xFF);
        assert!(!apu.dmc_needs_sample() || apu.dmc_sample_address() == 0xC001);
    }

    #[test]
    fn pulse_tone_produces_signal() {
        let mut apu = Apu::new();
        apu.write(0x4015, 0x01);
        apu.write(0x4000, 0x9F); // duty 2, constant volume 15
        apu.write(0x4002, 0xA9);
        apu.write(0x4003, 0x01); // period $1A9, length loaded

        // Run ~60 ms of CPU time and accumulate the squared output.
        let mut sum_sq = 0.0f64;
        let mut n = 0u32;
        for _ in 0..107_000 {
            apu.clock();
            let s = f64::from(apu.output());
            sum_sq += s * s;
            n += 1;
        }
        let rms = (sum_sq / f64::from(n)).sqrt();
        // Duty 50% square at volume 15: expected RMS ~ 0.1493 / sqrt(2).
        let expected = 0.149_38 / std::f64::consts::SQRT_2;
        assert!(
            (rms - expected).abs() / expected < 0.10,
            "rms {rms} vs expected {expected}"
        );
    }

    #[test]
    fn output_is_bounded() {
        let apu = Apu::new();
        let sample = apu.output();
        assert!((-1.0..=1.0).contains(&sample));
    }
}
