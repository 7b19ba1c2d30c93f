use core::convert::TryFrom;

use heapless::{consts::U64, Vec};
use log::{debug, error, trace, warn};

use crate::context::Context;
use crate::error::Error;
use crate::frame::{Frame, FrameView, HEIGHT, WIDTH};
use crate::memory::{Memory, FONT_START, GLYPH_SIZE, PROGRAM_START};
use crate::opcode::OpCode;
use crate::pacer::{Pacer, DEFAULT_RATE};
use crate::timer::{Timer, TimerState};

/// The CHIP-8 interpreter
///
/// Owns the whole machine state together with the platform `Context` it talks to.
/// Drive it by calling `tick` once per display refresh with the time elapsed since
/// the previous call.
pub struct Ember8<C: Context + Sized> {
    pub ctx: C,
    v: [u8; 16],
    i: u16,
    pc: u16,
    frame: Frame,
    memory: Memory,
    stack: Vec<u16, U64>,
    delay_timer: Timer,
    sound_timer: Timer,
    keys: [bool; 16],
    pacer: Pacer,
    rate: f64,
    sound_playing: bool,
}

impl<C: Context + Sized> Ember8<C> {
    pub fn new(ctx: C) -> Self {
        Self {
            ctx,
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            frame: Frame::new(),
            memory: Memory::new(),
            stack: Vec::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            keys: [false; 16],
            pacer: Pacer::new(),
            rate: DEFAULT_RATE,
            sound_playing: false,
        }
    }

    /// Create interpreter with program loaded at 0x200 (_start address)
    pub fn load(ctx: C, prog: &[u8]) -> Result<Self, Error> {
        let mut chip = Self::new(ctx);
        chip.load_program(prog)?;
        Ok(chip)
    }

    /// Load program from slice of bytes to memory from 0x200 (_start address)
    pub fn load_program(&mut self, prog: &[u8]) -> Result<(), Error> {
        self.memory.load(PROGRAM_START, prog)
    }

    /// Set the execution rate in instructions per second
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Advance the machine by one tick that lasted `elapsed_seconds`
    ///
    /// Refreshes the keypad, runs as many instructions as the configured rate allows,
    /// decrements both timers once and hands the frame over to the context. Unknown
    /// instructions are logged and skipped, any other error is fatal and returned.
    pub fn tick(&mut self, elapsed_seconds: f64) -> Result<(), Error> {
        self.keys = *self.ctx.get_keys();
        let count = self.pacer.instructions_for(elapsed_seconds, self.rate);
        self.tick_chip(count)?;
        self.tick_timers();
        self.ctx.on_frame(self.frame.view());
        Ok(())
    }

    /// Run up to `count` instructions, returns how many were completed
    ///
    /// Stops early when the program waits for a key, as nothing can change the
    /// keypad state before the next tick.
    pub fn tick_chip(&mut self, count: u32) -> Result<u32, Error> {
        for executed in 0..count {
            match self.step() {
                Ok(()) => {}
                Err(nb::Error::WouldBlock) => return Ok(executed),
                Err(nb::Error::Other(Error::UnknownInstruction(raw))) => {
                    warn!("skipping unknown instruction {:#06x} at {:#05x}", raw, self.pc - 2);
                }
                Err(nb::Error::Other(err)) => {
                    error!("{} (pc: {:#05x})", err, self.pc);
                    return Err(err);
                }
            }
        }
        Ok(count)
    }

    /// Decrement both timers and update the sound gate
    pub fn tick_timers(&mut self) {
        if self.delay_timer.decrement() == TimerState::Finished {
            trace!("delay timer finished");
        }
        self.sound_timer.decrement();

        let active = self.sound_timer.is_active();
        if active != self.sound_playing {
            self.sound_playing = active;
            if active {
                debug!("sound on");
                self.ctx.sound_on();
            } else {
                debug!("sound off");
                self.ctx.sound_off();
            }
        }
    }

    /// Fetch, decode and execute a single instruction
    ///
    /// Returns `WouldBlock` when the instruction waits for a key, in which case `pc`
    /// still points at it and it will be retried by the next step.
    pub fn step(&mut self) -> nb::Result<(), Error> {
        let raw = self.fetch()?;
        let opcode = OpCode::try_from(raw)?;
        trace!("{:#05x}: {:04X} {:?}", self.pc - 2, raw, opcode);
        self.execute(opcode)
    }

    fn fetch(&mut self) -> Result<u16, Error> {
        let raw = self.memory.read_word(self.pc as usize)?;
        self.pc += 2;
        Ok(raw)
    }

    fn pc_increment(&mut self) {
        self.pc += 2;
    }

    pub fn frame(&self) -> FrameView<'_> {
        self.frame.view()
    }

    /// Whether sound should be playing
    pub fn is_sound_on(&self) -> bool {
        self.sound_timer.is_active()
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn stack_pointer(&self) -> usize {
        self.stack.len()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.load()
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.load()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Keypad state as seen by the last tick
    pub fn keys(&self) -> &[bool; 16] {
        &self.keys
    }

    /// Fraction of an instruction carried over to the next tick
    pub fn pending_instruction_fraction(&self) -> f64 {
        self.pacer.pending()
    }
}

// OpCodes impls
impl<C: Context + Sized> Ember8<C> {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> nb::Result<(), Error> {
        match opcode {
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => self.subroutine_return(),
            OpCode::_1NNN { nnn }     => self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, .. }   => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, .. }   => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => return self.assign_vx_wait_for_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
        }
        .map_err(nb::Error::Other)
    }

    /// Clear the screen
    /// 00E0,
    fn clear_screen(&mut self) -> Result<(), Error> {
        self.frame.clear();
        Ok(())
    }

    /// Return from a subroutine
    /// 00EE,
    fn subroutine_return(&mut self) -> Result<(), Error> {
        self.stack
            .pop()
            .ok_or(Error::StackUnderflow)
            .map(|addr| self.pc = addr)
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 },
    fn jump_to(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn;
        Ok(())
    }

    /// Execute subroutine starting at address NNN
    /// 2NNN { nnn: u16 },
    fn exec_subroutine_at(&mut self, nnn: u16) -> Result<(), Error> {
        self.stack
            .push(self.pc)
            .or(Err(Error::StackOverflow))
            .map(|_| self.pc = nnn)
    }

    /// Skip the following instruction if the value of register VX equals NN
    /// 3XNN { x: u8, nn: u8 },
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] == nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 },
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] != nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    /// 5XY0 { x: u8, y: u8 },
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] == self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store number NN in register VX
    /// 6XNN { x: u8, nn: u8 },
    fn assign_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = nn;
        Ok(())
    }

    /// Add the value NN to register VX
    /// 7XNN { x: u8, nn: u8 },
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
        Ok(())
    }

    /// Store the value of register VY in register VX
    /// 8XY0 { x: u8, y: u8 },
    fn assign_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 },
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] |= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 },
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] &= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 },
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] ^= self.v[y as usize];
        Ok(())
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    /// 8XY4 { x: u8, y: u8 },
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let sum = self.v[x as usize] as u16 + self.v[y as usize] as u16;
        self.v[15] = (sum > 0xFF) as u8;
        self.v[x as usize] = sum as u8;
        Ok(())
    }

    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY5 { x: u8, y: u8 },
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let diff = self.v[x as usize] as i16 - self.v[y as usize] as i16;
        self.v[15] = (diff >= 0) as u8;
        self.v[x as usize] = diff as u8;
        Ok(())
    }

    /// Shift VX right one bit, Set register VF to the least significant bit prior to the shift
    /// 8XY6 { x: u8, y: u8 },
    fn assign_vx_shifted_r(&mut self, x: u8) -> Result<(), Error> {
        let value = self.v[x as usize];
        self.v[15] = value & 1u8;
        self.v[x as usize] = value >> 1;
        Ok(())
    }

    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY7 { x: u8, y: u8 },
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let diff = self.v[y as usize] as i16 - self.v[x as usize] as i16;
        self.v[15] = (diff >= 0) as u8;
        self.v[x as usize] = diff as u8;
        Ok(())
    }

    /// Shift VX left one bit, Set register VF to the most significant bit prior to the shift
    /// 8XYE { x: u8, y: u8 },
    fn assign_vx_shifted_l(&mut self, x: u8) -> Result<(), Error> {
        let value = self.v[x as usize];
        self.v[15] = value >> 7;
        self.v[x as usize] = value << 1;
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    /// 9XY0 { x: u8, y: u8 },
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] != self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store memory address NNN in register I
    /// ANNN { nnn: u16 },
    fn assign_i_nnn(&mut self, nnn: u16) -> Result<(), Error> {
        self.i = nnn;
        Ok(())
    }

    /// Jump to address NNN + V0
    /// BNNN { nnn: u16 },
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn + self.v[0] as u16;
        Ok(())
    }

    /// Set VX to a random number with a mask of NN
    /// CXNN { x: u8, nn: u8 },
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.ctx.gen_random() & nn;
        Ok(())
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    /// DXYN { x: u8, y: u8, n: u8 },
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) -> Result<(), Error> {
        let origin_x = self.v[x as usize] as usize % WIDTH;
        let origin_y = self.v[y as usize] as usize % HEIGHT;
        self.v[15] = 0;
        for row in 0..n as usize {
            if origin_y + row >= HEIGHT {
                break;
            }
            let sprite = self.memory.read(self.i as usize + row)?;
            if self.frame.xor_sprite_row(origin_x, origin_y + row, sprite) {
                self.v[15] = 1;
            }
        }
        Ok(())
    }

    fn is_key_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    /// EX9E { x: u8 },
    fn skip_if_vx_in_keys(&mut self, x: u8) -> Result<(), Error> {
        if self.is_key_pressed(self.v[x as usize]) {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    /// EXA1 { x: u8 },
    fn skip_if_vx_not_in_keys(&mut self, x: u8) -> Result<(), Error> {
        if !self.is_key_pressed(self.v[x as usize]) {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store the current value of the delay timer in register VX
    /// FX07 { x: u8 },
    fn assign_vx_delay_t(&mut self, x: u8) -> Result<(), Error> {
        self.v[x as usize] = self.delay_timer.load();
        Ok(())
    }

    /// Wait for a keypress and store the result in register VX
    /// FX0A { x: u8 },
    ///
    /// Waiting doesn't block, pc is moved back onto this instruction so it runs again
    /// until some key is down.
    fn assign_vx_wait_for_key(&mut self, x: u8) -> nb::Result<(), Error> {
        match self.keys.iter().position(|&pressed| pressed) {
            Some(key) => {
                debug!("key {:X} pressed, stored in V{:X}", key, x);
                self.v[x as usize] = key as u8;
                Ok(())
            }
            None => {
                self.pc -= 2;
                Err(nb::Error::WouldBlock)
            }
        }
    }

    /// Set the delay timer to the value of register VX
    /// FX15 { x: u8 },
    fn assign_delay_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.delay_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Set the sound timer to the value of register VX
    /// FX18 { x: u8 },
    fn assign_sound_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.sound_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Add the value stored in register VX to register I, Set VF to 01 if I leaves the address space
    /// FX1E { x: u8 },
    fn assign_add_i_vx(&mut self, x: u8) -> Result<(), Error> {
        let addr = self.i as u32 + self.v[x as usize] as u32;
        self.v[15] = (addr > 0x0FFF) as u8;
        self.i = addr as u16;
        Ok(())
    }

    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    /// FX29 { x: u8 },
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = FONT_START + GLYPH_SIZE * self.v[x as usize] as u16;
        Ok(())
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    /// FX33 { x: u8 },
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) -> Result<(), Error> {
        let value = self.v[x as usize];
        self.memory
            .slice_mut(self.i as usize, 3)?
            .copy_from_slice(&[value / 100u8, (value % 100) / 10u8, value % 10u8]);
        Ok(())
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    /// FX55 { x: u8 },
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) -> Result<(), Error> {
        let len = x as usize + 1;
        self.memory
            .slice_mut(self.i as usize, len)?
            .copy_from_slice(&self.v[..len]);
        Ok(())
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    /// FX65 { x: u8 },
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) -> Result<(), Error> {
        let len = x as usize + 1;
        self.v[..len].copy_from_slice(self.memory.slice(self.i as usize, len)?);
        Ok(())
    }
}


#[cfg(test)]
mod opcodes_execution_tests {
    use super::*;
    use crate::assert_eq_2d;
    use crate::context::testing::TestingContext;
    use crate::utils::testing::ToMask;

    fn new_chip() -> Ember8<TestingContext> {
        Ember8::new(TestingContext::new(0))
    }

    fn exec(chip: &mut Ember8<TestingContext>, raw: u16) {
        let opcode = OpCode::try_from(raw).unwrap();
        chip.execute(opcode).unwrap();
    }

    /// Clear the screen
    #[test]
    fn execute_00e0_clear_screen() {
        let mut chip = new_chip();
        chip.i = 0x000;
        exec(&mut chip, 0xD005);
        exec(&mut chip, 0x6A20);
        exec(&mut chip, 0xDA05);
        assert!(chip.frame().count_lit() > 0);

        exec(&mut chip, 0x00E0);
        assert_eq!(chip.frame().count_lit(), 0);

        exec(&mut chip, 0x00E0);
        assert_eq!(chip.frame().count_lit(), 0);
    }

    /// Return from a subroutine
    #[test]
    fn execute_00ee_subroutine_return() {
        let mut chip = new_chip();
        let opcode = OpCode::try_from(0x00EEu16).unwrap();
        let jumps = [0x260u16, 0x7F1u16, 0xFA2u16, 0x000u16];
        jumps
            .iter()
            .map(|&addr| OpCode::_2NNN { nnn: addr })
            .for_each(|op| chip.execute(op).unwrap());
        assert_eq!(chip.pc, 0x000u16);
        assert_eq!(chip.stack_pointer(), 4);

        for &addr in jumps.iter().rev().skip(1) {
            chip.execute(opcode).unwrap();
            assert_eq!(chip.pc, addr);
        }
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, 0x200u16);
        assert_eq!(chip.stack_pointer(), 0);

        assert!(matches!(
            chip.execute(opcode),
            Err(nb::Error::Other(Error::StackUnderflow))
        ));
        assert_eq!(chip.pc, 0x200u16);
    }

    /// Call followed by return resumes right after the call
    #[test]
    fn call_then_return() {
        let mut chip = Ember8::load(TestingContext::new(0), &[0x23, 0x00]).unwrap();
        chip.memory.write(0x300, 0x00).unwrap();
        chip.memory.write(0x301, 0xEE).unwrap();
        chip.step().unwrap();
        assert_eq!(chip.pc, 0x300u16);
        chip.step().unwrap();
        assert_eq!(chip.pc, 0x202u16);

        chip.pc = 0x0A02;
        chip.memory.write(0x0A02, 0x23).unwrap();
        chip.memory.write(0x0A03, 0x00).unwrap();
        chip.step().unwrap();
        chip.step().unwrap();
        assert_eq!(chip.pc, 0x0A04u16);
    }

    /// Jump to address NNN
    #[test]
    fn execute_1nnn_jump_to() {
        let mut chip = new_chip();
        exec(&mut chip, 0x1220);
        assert_eq!(chip.pc, 0x220u16);
        exec(&mut chip, 0x1FFF);
        assert_eq!(chip.pc, 0xFFFu16);
        exec(&mut chip, 0x1000);
        assert_eq!(chip.pc, 0x000u16);
    }

    /// Execute subroutine starting at address NNN
    #[test]
    fn execute_2nnn_exec_subroutine_at() {
        let mut chip = new_chip();
        let subr_addr = 0x222u16;
        let opcode = OpCode::_2NNN { nnn: subr_addr };
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, subr_addr);
        assert_eq!(chip.stack.len(), 1);
        assert_eq!(chip.stack.pop().unwrap(), 0x200u16);

        for _ in 0..64 {
            chip.execute(opcode).unwrap();
        }
        assert_eq!(chip.stack_pointer(), 64);
        assert!(matches!(
            chip.execute(opcode),
            Err(nb::Error::Other(Error::StackOverflow))
        ));
        assert_eq!(chip.stack_pointer(), 64);
    }

    /// Skip the following instruction if the value of register VX equals NN
    #[test]
    fn execute_3xnn_skip_if_vx_eq_nn() {
        let mut chip = new_chip();
        let pc = chip.pc;
        let opcode = OpCode::_3XNN { x: 0, nn: 0x22u8 };
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc);

        chip.assign_vx_nn(0, 0x22u8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc + 2);
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    #[test]
    fn execute_4xnn_skip_if_vx_ne_nn() {
        let mut chip = new_chip();
        let pc = chip.pc;
        let opcode = OpCode::_4XNN { x: 0, nn: 0x22u8 };
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc + 2);

        chip.assign_vx_nn(0, 0x22u8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc + 2);
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    #[test]
    fn execute_5xy0_skip_if_vx_eq_vy() {
        let mut chip = new_chip();
        let pc = chip.pc;
        let opcode = OpCode::_5XY0 { x: 0, y: 1 };
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc + 2);

        chip.assign_vx_nn(0, 0x22u8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc + 2);
    }

    /// Store number NN in register VX
    #[test]
    fn execute_6xnn_assign_vx_nn() {
        let mut chip = new_chip();
        exec(&mut chip, 0x6122);
        assert_eq!(chip.v[1], 0x22u8);

        exec(&mut chip, 0x6FFF);
        assert_eq!(chip.v[15], 0xFFu8);
    }

    /// Add the value NN to register VX
    #[test]
    fn execute_7xnn_assign_add_vx_nn() {
        let mut chip = new_chip();
        let value = 0x09u8;
        let opcode = OpCode::_7XNN { x: 0, nn: value };
        // no flag should be set in VF during this execution
        chip.assign_vx_nn(0xFu8, value).unwrap();

        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[0], value);
        assert_eq!(chip.v[15], value);

        chip.assign_vx_nn(0, 0xFAu8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[0], 0x03u8);
        assert_eq!(chip.v[15], value);
    }

    /// Store the value of register VY in register VX
    #[test]
    fn execute_8xy0_assign_vx_vy() {
        let mut chip = new_chip();
        let vx = 0x02u8;
        let vy = 0x04u8;
        let value = 0x09u8;

        chip.assign_vx_nn(vy, value).unwrap();

        let opcode = OpCode::_8XY0 { x: vx, y: vy };
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], value);
    }

    /// Set VX to VX OR VY, VX AND VY, VX XOR VY
    #[test]
    fn execute_8xy1_8xy2_8xy3_bitwise() {
        let mut chip = new_chip();
        let vx = 0x02u8;
        let vy = 0x04u8;
        let value_x = 0xF1u8;
        let value_y = 0x1Fu8;

        let ops = [
            (OpCode::_8XY1 { x: vx, y: vy }, value_x | value_y),
            (OpCode::_8XY2 { x: vx, y: vy }, value_x & value_y),
            (OpCode::_8XY3 { x: vx, y: vy }, value_x ^ value_y),
        ];
        for &(opcode, expected) in &ops {
            chip.assign_vx_nn(vx, value_x).unwrap();
            chip.assign_vx_nn(vy, value_y).unwrap();
            chip.execute(opcode).unwrap();
            assert_eq!(chip.v[vx as usize], expected);
            assert_eq!(chip.v[vy as usize], value_y);
        }
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    #[test]
    fn execute_8xy4_assign_add_vx_vy() {
        let mut chip = new_chip();
        let opcode = OpCode::_8XY4 { x: 2, y: 4 };

        chip.assign_vx_nn(2, 250).unwrap();
        chip.assign_vx_nn(4, 10).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[2], 4);
        assert_eq!(chip.v[15], 1);

        chip.assign_vx_nn(2, 10).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[2], 20);
        assert_eq!(chip.v[15], 0);

        chip.assign_vx_nn(2, 246).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[2], 0);
        assert_eq!(chip.v[15], 1);
    }

    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    #[test]
    fn execute_8xy5_assign_sub_vx_vy() {
        let mut chip = new_chip();
        let opcode = OpCode::_8XY5 { x: 2, y: 4 };

        chip.assign_vx_nn(2, 5).unwrap();
        chip.assign_vx_nn(4, 10).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[2], 251);
        assert_eq!(chip.v[15], 0);

        chip.assign_vx_nn(2, 10).unwrap();
        chip.assign_vx_nn(4, 4).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[2], 6);
        assert_eq!(chip.v[15], 1);

        chip.assign_vx_nn(2, 4).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[2], 0);
        assert_eq!(chip.v[15], 1);
    }

    /// Shift VX right one bit, Set register VF to the least significant bit prior to the shift
    #[test]
    fn execute_8xy6_assign_vx_shifted_r() {
        let mut chip = new_chip();
        let vx = 0x02u8;
        let vy = 0x04u8;
        let value = 0b1111_1110u8;

        chip.assign_vx_nn(vx, value).unwrap();
        chip.assign_vx_nn(vy, 0x55u8).unwrap();

        let opcode = OpCode::_8XY6 { x: vx, y: vy };

        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], value >> 1);
        assert_eq!(chip.v[vy as usize], 0x55u8);
        assert_eq!(chip.v[15], 0x00u8);

        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], value >> 2);
        assert_eq!(chip.v[15], 0x01u8);
    }

    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    #[test]
    fn execute_8xy7_assign_vx_vy_sub_vx() {
        let mut chip = new_chip();
        let vx = 0x02u8;
        let vy = 0x04u8;

        chip.assign_vx_nn(vx, 0x04u8).unwrap();
        chip.assign_vx_nn(vy, 0x05u8).unwrap();

        let opcode = OpCode::_8XY7 { x: vx, y: vy };

        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], 0x01u8);
        assert_eq!(chip.v[15], 0x01u8);

        // negative results wrap around exactly: 5 - 10 = 256 - 5
        chip.assign_vx_nn(vx, 10).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], 251);
        assert_eq!(chip.v[15], 0x00u8);

        chip.assign_vx_nn(vx, 0xFF).unwrap();
        chip.assign_vx_nn(vy, 0x00).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], 0x01u8);
        assert_eq!(chip.v[15], 0x00u8);
    }

    /// Shift VX left one bit, Set register VF to the most significant bit prior to the shift
    #[test]
    fn execute_8xye_assign_vx_shifted_l() {
        let mut chip = new_chip();
        let vx = 0x02u8;
        let vy = 0x04u8;
        let value = 0b0111_1111u8;

        chip.assign_vx_nn(vx, value).unwrap();
        chip.assign_vx_nn(vy, 0x01u8).unwrap();

        let opcode = OpCode::_8XYE { x: vx, y: vy };

        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], value << 1);
        assert_eq!(chip.v[vy as usize], 0x01u8);
        assert_eq!(chip.v[15], 0x00u8);

        chip.execute(opcode).unwrap();
        assert_eq!(chip.v[vx as usize], value << 2);
        assert_eq!(chip.v[15], 0x01u8);
    }

    /// Flag is written before the result, so VF as a target keeps the result
    #[test]
    fn flag_ops_on_vf() {
        let mut chip = new_chip();
        chip.assign_vx_nn(0xF, 200).unwrap();
        chip.assign_vx_nn(0x1, 100).unwrap();
        exec(&mut chip, 0x8F14);
        assert_eq!(chip.v[15], 44);

        chip.assign_vx_nn(0xF, 0b1000_0001).unwrap();
        exec(&mut chip, 0x8F06);
        assert_eq!(chip.v[15], 0b0100_0000);
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    #[test]
    fn execute_9xy0_skip_if_vx_ne_vy() {
        let mut chip = new_chip();
        let pc = chip.pc;
        let opcode = OpCode::_9XY0 { x: 0, y: 1 };
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc);

        chip.assign_vx_nn(0, 0x22u8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.pc, pc + 2);
    }

    /// Store memory address NNN in register I
    #[test]
    fn execute_annn_assign_i_nnn() {
        let mut chip = new_chip();
        let opcode = OpCode::_ANNN { nnn: 0x0FFFu16 };
        assert_eq!(chip.i, 0x0000u16);
        chip.execute(opcode).unwrap();
        assert_eq!(chip.i, 0x0FFFu16);
    }

    /// Jump to address NNN + V0
    #[test]
    fn execute_bnnn_jump_to_nnn_add_v0() {
        let mut chip = new_chip();
        exec(&mut chip, 0xB220);
        assert_eq!(chip.pc, 0x220u16);

        chip.assign_vx_nn(0, 0xFFu8).unwrap();
        chip.assign_vx_nn(3, 0x01u8).unwrap();
        exec(&mut chip, 0xBF00);
        assert_eq!(chip.pc, 0xFFFu16);

        exec(&mut chip, 0xBFFB);
        assert_eq!(chip.pc, 0x10FAu16);
        assert_eq!(
            chip.fetch(),
            Err(Error::OutOfBounds { address: 0x10FA }),
        );
    }

    /// Set VX to a random number with a mask of NN
    #[test]
    fn execute_cxnn_assign_vx_random_and_nn() {
        let mut chip = new_chip();
        for _ in 0..32 {
            exec(&mut chip, 0xC10F);
            assert_eq!(chip.v[1] & 0xF0, 0);
        }
        exec(&mut chip, 0xC100);
        assert_eq!(chip.v[1], 0);

        let mut a = new_chip();
        let mut b = new_chip();
        for _ in 0..8 {
            exec(&mut a, 0xC2FF);
            exec(&mut b, 0xC2FF);
            assert_eq!(a.v[2], b.v[2]);
        }
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    #[test]
    fn execute_dxyn_draw_n_at_vx_vy() {
        let mut chip = new_chip();
        // glyph "0" at (1, 2)
        exec(&mut chip, 0x6001);
        exec(&mut chip, 0x6102);
        exec(&mut chip, 0xA000);
        exec(&mut chip, 0xD015);
        assert_eq!(chip.v[15], 0);

        let expected = "
            ......
            ......
            .####.
            .#..#.
            .#..#.
            .#..#.
            .####.
            ......
        "
        .to_mask();
        assert_eq_2d!(x_range: 0..6, y_range: 0..8; chip.frame().to_mask(), expected);
        assert_eq!(chip.frame().count_lit(), 14);
    }

    /// Drawing the same sprite twice erases it and reports a collision
    #[test]
    fn draw_collision() {
        let mut chip = new_chip();
        chip.memory.write(0x300, 0xFF).unwrap();
        exec(&mut chip, 0xA300);
        exec(&mut chip, 0x6A08);
        exec(&mut chip, 0x6B03);

        exec(&mut chip, 0xDAB1);
        assert_eq!(chip.v[15], 0);
        assert_eq!(chip.frame().count_lit(), 8);

        exec(&mut chip, 0xDAB1);
        assert_eq!(chip.v[15], 1);
        assert_eq!(chip.frame().count_lit(), 0);

        exec(&mut chip, 0xDAB1);
        assert_eq!(chip.v[15], 0);
    }

    /// Sprites are clipped at the edges of the screen, never wrapped
    #[test]
    fn draw_clipping() {
        let mut chip = new_chip();
        chip.memory.slice_mut(0x300, 4).unwrap().copy_from_slice(&[0xFF; 4]);
        exec(&mut chip, 0xA300);
        exec(&mut chip, 0x603C); // x = 60
        exec(&mut chip, 0x611E); // y = 30
        exec(&mut chip, 0xD014);
        assert_eq!(chip.v[15], 0);
        assert_eq!(chip.frame().count_lit(), 8);
        for y in 30..32 {
            for x in 60..64 {
                assert_eq!(chip.frame().get_bit(x, y), Some(&true));
            }
            for x in 0..4 {
                assert_eq!(chip.frame().get_bit(x, y), Some(&false));
            }
        }
        for x in 60..64 {
            assert_eq!(chip.frame().get_bit(x, 0), Some(&false));
        }
    }

    /// Origin coordinates wrap, the sprite itself doesn't
    #[test]
    fn draw_origin_wraps() {
        let mut chip = new_chip();
        chip.memory.write(0x300, 0x80).unwrap();
        exec(&mut chip, 0xA300);
        exec(&mut chip, 0x6045); // 69 % 64 = 5
        exec(&mut chip, 0x6122); // 34 % 32 = 2
        exec(&mut chip, 0xD011);
        assert_eq!(chip.frame().get_bit(5, 2), Some(&true));
        assert_eq!(chip.frame().count_lit(), 1);
    }

    #[test]
    fn draw_out_of_address_space() {
        let mut chip = new_chip();
        exec(&mut chip, 0xAFFE);
        assert!(matches!(
            chip.execute(OpCode::_DXYN { x: 0, y: 0, n: 3 }),
            Err(nb::Error::Other(Error::OutOfBounds { address: 0x1000 }))
        ));
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    #[test]
    fn execute_ex9e_skip_if_vx_in_keys() {
        let mut chip = new_chip();
        let pc = chip.pc;
        exec(&mut chip, 0x6005);
        exec(&mut chip, 0xE09E);
        assert_eq!(chip.pc, pc);

        chip.keys[5] = true;
        exec(&mut chip, 0xE09E);
        assert_eq!(chip.pc, pc + 2);

        exec(&mut chip, 0x60FF);
        exec(&mut chip, 0xE09E);
        assert_eq!(chip.pc, pc + 2);
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    #[test]
    fn execute_exa1_skip_if_vx_not_in_keys() {
        let mut chip = new_chip();
        let pc = chip.pc;
        exec(&mut chip, 0x600F);
        exec(&mut chip, 0xE0A1);
        assert_eq!(chip.pc, pc + 2);

        chip.keys[0xF] = true;
        exec(&mut chip, 0xE0A1);
        assert_eq!(chip.pc, pc + 2);
    }

    /// Store the current value of the delay timer in register VX
    #[test]
    fn execute_fx07_assign_vx_delay_t() {
        let mut chip = new_chip();
        let opcode = OpCode::_FX07 { x: 0 };
        chip.delay_timer.store(0xFFu8);

        chip.execute(opcode).unwrap();
        assert_eq!(chip.delay_timer.load(), chip.v[0]);
    }

    /// Wait for a keypress and store the result in register VX
    #[test]
    fn execute_fx0a_assign_vx_wait_for_key() {
        let mut chip = chip_with_wait();
        assert!(matches!(chip.step(), Err(nb::Error::WouldBlock)));
        assert_eq!(chip.pc, 0x200u16);
        assert!(matches!(chip.step(), Err(nb::Error::WouldBlock)));
        assert_eq!(chip.pc, 0x200u16);

        chip.keys[0xC] = true;
        chip.keys[0x7] = true;
        chip.step().unwrap();
        assert_eq!(chip.v[3], 0x7u8);
        assert_eq!(chip.pc, 0x202u16);
    }

    fn chip_with_wait() -> Ember8<TestingContext> {
        Ember8::load(TestingContext::new(0), &[0xF3, 0x0A]).unwrap()
    }

    /// Set the delay timer to the value of register VX
    #[test]
    fn execute_fx15_assign_delay_t_vx() {
        let mut chip = new_chip();
        let opcode = OpCode::_FX15 { x: 0 };
        chip.assign_vx_nn(0, 0xFFu8).unwrap();

        chip.execute(opcode).unwrap();
        assert_eq!(chip.delay_timer.load(), chip.v[0]);
    }

    /// Set the sound timer to the value of register VX
    #[test]
    fn execute_fx18_assign_sound_t_vx() {
        let mut chip = new_chip();
        let opcode = OpCode::_FX18 { x: 0 };
        chip.assign_vx_nn(0, 0xFFu8).unwrap();

        chip.execute(opcode).unwrap();
        assert_eq!(chip.sound_timer.load(), chip.v[0]);
        assert!(chip.is_sound_on());
    }

    /// Add the value stored in register VX to register I
    #[test]
    fn execute_fx1e_assign_add_i_vx() {
        let mut chip = new_chip();
        let opcode = OpCode::_FX1E { x: 0 };

        chip.execute(opcode).unwrap();
        assert_eq!(chip.i, 0x0000u16);
        assert_eq!(chip.v[15], 0);

        chip.assign_vx_nn(0, 0xFFu8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.i, 0x00FFu16);
        assert_eq!(chip.v[15], 0);

        chip.assign_i_nnn(0x0FFBu16).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.i, 0x10FAu16);
        assert_eq!(chip.v[15], 1);
    }

    /// I keeps growing past 16 bits without trapping the interpreter
    #[test]
    fn fx1e_in_a_loop_wraps_i() {
        // V0 = 0xFF, then I += V0 forever
        let mut chip = Ember8::load(TestingContext::new(0), &[0x60, 0xFF, 0xF0, 0x1E, 0x12, 0x02])
            .unwrap();
        for _ in 0..1000 {
            chip.step().unwrap();
        }
        // V0 load, then 500 additions of 0xFF
        assert_eq!(chip.i, (500u32 * 0xFF % 0x1_0000) as u16);
        assert_eq!(chip.v[15], 1);

        chip.assign_i_nnn(0xFFFF).unwrap();
        chip.execute(OpCode::_FX1E { x: 0 }).unwrap();
        assert_eq!(chip.i, 0x00FEu16);
        assert_eq!(chip.v[15], 1);
    }

    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    #[test]
    fn execute_fx29_assign_i_addr_of_sprite_vx() {
        let mut chip = new_chip();
        let opcode = OpCode::_FX29 { x: 4 };

        chip.execute(opcode).unwrap();
        assert_eq!(chip.i, 0x0000u16);

        chip.assign_vx_nn(4, 0xAu8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.i, 0x0032u16);
        assert_eq!(
            chip.memory.slice(chip.i as usize, 5).unwrap(),
            &[0xF0, 0x90, 0xF0, 0x90, 0x90],
        );
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    #[test]
    fn execute_fx33_assign_mem_at_i_bcd_of_vx() {
        let mut chip = new_chip();
        let opcode = OpCode::_FX33 { x: 0 };
        chip.assign_i_nnn(0x300).unwrap();

        chip.execute(opcode).unwrap();
        assert_eq!(chip.memory.slice(0x300, 3).unwrap(), &[0, 0, 0]);

        chip.assign_vx_nn(0, 157).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.memory.slice(0x300, 3).unwrap(), &[1, 5, 7]);

        chip.assign_vx_nn(0, 0xFFu8).unwrap();
        chip.execute(opcode).unwrap();
        assert_eq!(chip.memory.slice(0x300, 3).unwrap(), &[2, 5, 5]);
        assert_eq!(chip.i, 0x300u16);

        chip.assign_i_nnn(0x0FFEu16).unwrap();
        assert!(matches!(
            chip.execute(opcode),
            Err(nb::Error::Other(Error::OutOfBounds { .. }))
        ));
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    #[test]
    fn execute_fx55_assign_mem_at_i_v0_to_vx() {
        let mut chip = new_chip();
        chip.assign_i_nnn(0x300).unwrap();

        chip.assign_vx_nn(0, 0xDEu8).unwrap();
        chip.assign_vx_nn(1, 0xADu8).unwrap();
        chip.assign_vx_nn(2, 0xBEu8).unwrap();
        chip.assign_vx_nn(3, 0xEFu8).unwrap();
        chip.assign_vx_nn(4, 0x11u8).unwrap();

        let opcode = OpCode::_FX55 { x: 3 };
        chip.execute(opcode).unwrap();
        assert_eq!(
            chip.memory.slice(0x300, 5).unwrap(),
            &[0xDE, 0xAD, 0xBE, 0xEF, 0x00],
        );
        assert_eq!(chip.i, 0x300u16);

        let opcode = OpCode::_FX55 { x: 0x0Fu8 };
        chip.assign_i_nnn(0x0FF1u16).unwrap();
        assert!(matches!(
            chip.execute(opcode),
            Err(nb::Error::Other(Error::OutOfBounds { .. }))
        ));
        chip.assign_i_nnn(0x0FF0u16).unwrap();
        chip.execute(opcode).unwrap();
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    #[test]
    fn execute_fx65_assign_v0_to_vx_mem_at_i() {
        let mut chip = new_chip();
        chip.assign_i_nnn(0x300).unwrap();
        chip.memory
            .slice_mut(0x300, 5)
            .unwrap()
            .copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0x11]);

        let opcode = OpCode::_FX65 { x: 3 };
        chip.execute(opcode).unwrap();
        assert_eq!(&chip.v[..5], &[0xDE, 0xAD, 0xBE, 0xEF, 0x00]);
        assert_eq!(chip.i, 0x300u16);

        let opcode = OpCode::_FX65 { x: 0x0Fu8 };
        chip.assign_i_nnn(0x0FF1u16).unwrap();
        assert!(matches!(
            chip.execute(opcode),
            Err(nb::Error::Other(Error::OutOfBounds { .. }))
        ));
    }
}
