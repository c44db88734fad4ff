use std::io::Read;

use thiserror::Error;

// memory size
pub const MEM_SIZE: usize = 4096;

// display dimensions, in pixels
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

// fixed depth of the subroutine stack
pub const STACK_DEPTH: usize = 16;

// start of the free area for user programs
pub const ADDR_START: usize = 0x200;

// maximum rom size
pub const MAX_ROM_SIZE: usize = MEM_SIZE - ADDR_START;

// start of the sprite data
const SPRITE_DATA_START: usize = 0;

// built-in hexadecimal digit sprites, 5 bytes per digit
const SPRITE_DATA: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[derive(Error, Debug)]
pub enum Error {
    #[error("instruction fetch at {0:#05X} falls outside addressable memory")]
    OutOfBoundsFetch(u16),
    #[error("illegal instruction {opcode:04X} at address {addr:#05X}")]
    IllegalInstruction { opcode: u16, addr: u16 },
    #[error("call at address {0:#05X} exceeded the 16 available stack frames")]
    StackOverflow(u16),
    #[error("return at address {0:#05X} with no saved frame")]
    StackUnderflow(u16),
    #[error("program image does not fit in the 3584 bytes above 0x200")]
    ImageTooLarge,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// All mutable VM state: memory, registers, stack, timers, framebuffer
/// and keypad. Holds no execution logic beyond bounds-safe accessors;
/// the interpreter mutates it through `step` and `tick`.
#[allow(non_snake_case)]
pub struct Machine {
    // program counter
    pub PC: u16,

    // full memory
    pub memory: [u8; MEM_SIZE],

    // data registers: V0 - VF
    pub V: [u8; 16],

    // address register
    pub I: u16,

    // subroutine stack, at most STACK_DEPTH frames
    pub stack: Vec<u16>,

    // delay timer
    pub DT: u8,

    // sound timer
    pub ST: u8,

    // monochrome framebuffer, row-major
    pub framebuffer: [bool; DISPLAY_WIDTH * DISPLAY_HEIGHT],

    // which keys are pressed
    keys: [bool; 16],
}

impl Machine {
    /// Load a chip-8 rom. The machine starts zeroed except for the digit
    /// sprites in low memory; the image is copied verbatim to 0x200.
    pub fn load_rom<T>(rom: T) -> Result<Self, Error>
    where
        T: Read,
    {
        let mut machine = Machine {
            PC: ADDR_START as u16,
            memory: [0u8; MEM_SIZE],
            V: [0u8; 16],
            I: 0,
            stack: Vec::with_capacity(STACK_DEPTH),
            DT: 0,
            ST: 0,
            framebuffer: [false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            keys: [false; 16],
        };

        // load the sprite data
        let sprite_area =
            &mut machine.memory[SPRITE_DATA_START..SPRITE_DATA_START + SPRITE_DATA.len()];
        sprite_area.copy_from_slice(&SPRITE_DATA[..]);

        // load the rom itself; reading one byte past the limit means
        // the image cannot fit
        let mut image = Vec::with_capacity(MAX_ROM_SIZE);
        rom.take(MAX_ROM_SIZE as u64 + 1).read_to_end(&mut image)?;
        if image.len() > MAX_ROM_SIZE {
            return Err(Error::ImageTooLarge);
        }
        machine.memory[ADDR_START..ADDR_START + image.len()].copy_from_slice(&image);

        Ok(machine)
    }

    pub fn set_key(&mut self, key: u8, state: bool) {
        self.keys[(key & 0xF) as usize] = state;
    }

    pub fn key_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// Lowest-numbered key currently held down, if any.
    pub fn pressed_key(&self) -> Option<u8> {
        for (index, state) in self.keys.iter().enumerate() {
            if *state {
                return Some(index as u8);
            }
        }
        None
    }

    /// Read a memory cell. Addresses are masked to 12 bits, so reads
    /// through an index register near the top of memory wrap around.
    pub fn read(&self, addr: u16) -> u8 {
        self.memory[(addr & 0xFFF) as usize]
    }

    /// Write a memory cell, with the same 12-bit address mask.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.memory[(addr & 0xFFF) as usize] = value;
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.framebuffer[y * DISPLAY_WIDTH + x]
    }

    pub fn clear_framebuffer(&mut self) {
        self.framebuffer = [false; DISPLAY_WIDTH * DISPLAY_HEIGHT];
    }

    /// XOR-toggle the pixel at (x, y), wrapping both coordinates into
    /// the screen. Returns true when a lit pixel was turned off.
    pub fn toggle_pixel(&mut self, x: usize, y: usize) -> bool {
        let offset = (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + (x % DISPLAY_WIDTH);
        let collision = self.framebuffer[offset];
        self.framebuffer[offset] = !self.framebuffer[offset];
        collision
    }
}
