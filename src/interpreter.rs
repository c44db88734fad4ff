use nanorand::{BufferedRng, Rng, WyRand};

use super::machine::{Error, Machine, DISPLAY_HEIGHT, DISPLAY_WIDTH, MEM_SIZE, STACK_DEPTH};

/// Edge-triggered tone transitions, raised exactly once per sound-timer
/// edge: `Start` when ST goes from zero to non-zero, `Stop` when it
/// reaches (or is overwritten with) zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneSignal {
    Start,
    Stop,
}

/// The fetch-decode-execute engine. Owns the machine state; the driving
/// loop alternates bursts of `step` with `tick` at a fixed cadence and
/// forwards the returned tone signals to the audio device.
pub struct Interpreter {
    pub machine: Machine,

    // random number generator for Cxkk
    rng: BufferedRng<WyRand, 8>,
}

impl Interpreter {
    pub fn new(machine: Machine) -> Self {
        Interpreter {
            machine,
            rng: BufferedRng::new(WyRand::new()),
        }
    }

    /// Execute a single instruction.
    ///
    /// On failure PC is left pointing past the faulting instruction and
    /// the error names the faulting address, so the driver can choose
    /// between halting the session and skipping the instruction.
    pub fn step(&mut self) -> Result<Option<ToneSignal>, Error> {
        let m = &mut self.machine;

        // fetch the big-endian opcode
        let at = m.PC;
        if at as usize + 1 >= MEM_SIZE {
            return Err(Error::OutOfBoundsFetch(at));
        }
        let opcode = u16::from(m.memory[at as usize]) << 8 | u16::from(m.memory[at as usize + 1]);
        m.PC += 2;

        // decode the fixed bit-fields
        let x = ((opcode >> 8) & 0xF) as usize;
        let y = ((opcode >> 4) & 0xF) as usize;
        let n = opcode & 0xF;
        let kk = (opcode & 0xFF) as u8;
        let nnn = opcode & 0xFFF;

        let mut tone = None;

        // dispatch on the leading nibble plus sub-opcode selector
        match opcode >> 12 {
            // 00E0 - clear the screen
            0x0 if opcode == 0x00E0 => {
                m.clear_framebuffer();
            }
            // 00EE - return from subroutine
            0x0 if opcode == 0x00EE => {
                m.PC = m.stack.pop().ok_or(Error::StackUnderflow(at))?;
            }
            // 1NNN - jump to address NNN
            0x1 => {
                m.PC = nnn;
            }
            // 2NNN - call subroutine at NNN, saving the address of the
            // next instruction
            0x2 => {
                if m.stack.len() == STACK_DEPTH {
                    return Err(Error::StackOverflow(at));
                }
                m.stack.push(m.PC);
                m.PC = nnn;
            }
            // 3XKK - skip next if VX == KK
            0x3 => {
                if m.V[x] == kk {
                    m.PC += 2;
                }
            }
            // 4XKK - skip next if VX != KK
            0x4 => {
                if m.V[x] != kk {
                    m.PC += 2;
                }
            }
            // 5XY0 - skip next if VX == VY
            0x5 if n == 0x0 => {
                if m.V[x] == m.V[y] {
                    m.PC += 2;
                }
            }
            // 6XKK - set VX = KK
            0x6 => {
                m.V[x] = kk;
            }
            // 7XKK - set VX = VX + KK (no flag change)
            0x7 => {
                m.V[x] = m.V[x].wrapping_add(kk);
            }
            // 8XY0 - set VX = VY
            0x8 if n == 0x0 => {
                m.V[x] = m.V[y];
            }
            // 8XY1 - set VX = VX | VY
            0x8 if n == 0x1 => {
                m.V[x] |= m.V[y];
            }
            // 8XY2 - set VX = VX & VY
            0x8 if n == 0x2 => {
                m.V[x] &= m.V[y];
            }
            // 8XY3 - set VX = VX ^ VY
            0x8 if n == 0x3 => {
                m.V[x] ^= m.V[y];
            }
            // 8XY4 - set VX = VX + VY, VF = 1 on carry
            0x8 if n == 0x4 => {
                let (result, carry) = m.V[x].overflowing_add(m.V[y]);
                m.V[x] = result;
                m.V[0xF] = carry as u8;
            }
            // 8XY5 - set VX = VX - VY, VF = 1 when VX > VY beforehand
            0x8 if n == 0x5 => {
                let flag = (m.V[x] > m.V[y]) as u8;
                m.V[x] = m.V[x].wrapping_sub(m.V[y]);
                m.V[0xF] = flag;
            }
            // 8XY6 - set VF to the low bit of VX, then VX = VX >> 1
            0x8 if n == 0x6 => {
                let flag = m.V[x] & 0x1;
                m.V[x] >>= 1;
                m.V[0xF] = flag;
            }
            // 8XY7 - set VX = VY - VX, VF = 1 when VY > VX beforehand
            0x8 if n == 0x7 => {
                let flag = (m.V[y] > m.V[x]) as u8;
                m.V[x] = m.V[y].wrapping_sub(m.V[x]);
                m.V[0xF] = flag;
            }
            // 8XYE - set VF to the high bit of VX, then VX = VX << 1
            0x8 if n == 0xE => {
                let flag = m.V[x] >> 7;
                m.V[x] <<= 1;
                m.V[0xF] = flag;
            }
            // 9XY0 - skip next if VX != VY
            0x9 if n == 0x0 => {
                if m.V[x] != m.V[y] {
                    m.PC += 2;
                }
            }
            // ANNN - set I = NNN
            0xA => {
                m.I = nnn;
            }
            // BNNN - jump to address NNN + V0
            0xB => {
                m.PC = nnn.wrapping_add(u16::from(m.V[0x0]));
            }
            // CXKK - set VX to a random byte masked with KK
            0xC => {
                let mut byte = [0u8; 1];
                self.rng.fill(&mut byte);
                m.V[x] = byte[0] & kk;
            }
            // DXYN - draw the N-byte sprite at I at coords (VX, VY),
            // VF = 1 when any lit pixel is toggled off
            0xD => {
                let origin_x = m.V[x] as usize % DISPLAY_WIDTH;
                let origin_y = m.V[y] as usize % DISPLAY_HEIGHT;
                let mut collision = false;

                for row in 0..n as usize {
                    let byte = m.read(m.I.wrapping_add(row as u16));
                    for col in 0..8 {
                        if byte & (0x80 >> col) != 0 {
                            collision |= m.toggle_pixel(origin_x + col, origin_y + row);
                        }
                    }
                }
                m.V[0xF] = collision as u8;
            }
            // EX9E - skip next if the key named by VX is pressed
            0xE if kk == 0x9E => {
                if m.key_pressed(m.V[x]) {
                    m.PC += 2;
                }
            }
            // EXA1 - skip next if the key named by VX is NOT pressed
            0xE if kk == 0xA1 => {
                if !m.key_pressed(m.V[x]) {
                    m.PC += 2;
                }
            }
            // FX07 - set VX = DT
            0xF if kk == 0x07 => {
                m.V[x] = m.DT;
            }
            // FX0A - wait for a key press and store its index in VX;
            // realized by re-issuing the instruction until a key is seen
            0xF if kk == 0x0A => {
                if let Some(key) = m.pressed_key() {
                    m.V[x] = key;
                } else {
                    m.PC -= 2;
                }
            }
            // FX15 - set DT = VX
            0xF if kk == 0x15 => {
                m.DT = m.V[x];
            }
            // FX18 - set ST = VX, raising the tone edge signals
            0xF if kk == 0x18 => {
                let before = m.ST;
                m.ST = m.V[x];
                tone = match (before, m.ST) {
                    (0, after) if after > 0 => Some(ToneSignal::Start),
                    (before, 0) if before > 0 => Some(ToneSignal::Stop),
                    _ => None,
                };
            }
            // FX1E - set I = I + VX, wrapping at 16 bits
            0xF if kk == 0x1E => {
                m.I = m.I.wrapping_add(u16::from(m.V[x]));
            }
            // FX29 - set I to the glyph sprite address of the digit in VX
            0xF if kk == 0x29 => {
                m.I = u16::from(m.V[x] & 0xF) * 5;
            }
            // FX33 - store the BCD of VX at I, I+1 and I+2
            0xF if kk == 0x33 => {
                let value = m.V[x];
                m.write(m.I, value / 100);
                m.write(m.I.wrapping_add(1), value / 10 % 10);
                m.write(m.I.wrapping_add(2), value % 10);
            }
            // FX55 - store V0..=VX into memory starting at I
            0xF if kk == 0x55 => {
                for offset in 0..=x {
                    m.write(m.I.wrapping_add(offset as u16), m.V[offset]);
                }
            }
            // FX65 - load V0..=VX from memory starting at I
            0xF if kk == 0x65 => {
                for offset in 0..=x {
                    m.V[offset] = m.read(m.I.wrapping_add(offset as u16));
                }
            }
            _ => return Err(Error::IllegalInstruction { opcode, addr: at }),
        }

        Ok(tone)
    }

    /// Advance the delay and sound timers by one tick. Invoked by the
    /// driver at a fixed 60 Hz cadence, independently of `step`.
    pub fn tick(&mut self) -> Option<ToneSignal> {
        let m = &mut self.machine;

        if m.DT > 0 {
            m.DT -= 1;
        }
        if m.ST > 0 {
            m.ST -= 1;
            if m.ST == 0 {
                return Some(ToneSignal::Stop);
            }
        }
        None
    }
}
