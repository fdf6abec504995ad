//! HD44780 20x4 character LCD behind a PCF8574 I2C backpack.
//!
//! The expander drives the controller in 4-bit mode: each byte goes out
//! as two nibbles on P4..P7, strobed by EN (P2).  P3 keeps the backlight
//! on, P0 selects data (RS).

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Default backpack address.
pub const LCD_I2C_ADDR: u8 = 0x27;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INC: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start of each row on a 20x4 panel.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub struct Lcd<I, D> {
    i2c: I,
    delay: D,
    addr: u8,
}

impl<I: I2c, D: DelayNs> Lcd<I, D> {
    pub fn new(i2c: I, delay: D, addr: u8) -> Self {
        Self { i2c, delay, addr }
    }

    /// Power-on sequence: force 8-bit mode three times, then switch to 4-bit.
    pub fn init(&mut self) -> Result<(), I::Error> {
        self.delay.delay_ms(50);
        for wait_us in [4500, 150, 150] {
            self.write_nibble(0x30, 0)?;
            self.delay.delay_us(wait_us);
        }
        self.write_nibble(0x20, 0)?;
        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.clear()?;
        self.command(CMD_ENTRY_MODE_INC)
    }

    pub fn clear(&mut self) -> Result<(), I::Error> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), I::Error> {
        let offset = ROW_OFFSETS[usize::from(row) % ROW_OFFSETS.len()];
        self.command(CMD_SET_DDRAM | (offset + col))
    }

    /// Prints ASCII; anything else shows as `?`.
    pub fn print(&mut self, text: &str) -> Result<(), I::Error> {
        for c in text.chars() {
            let b = if c.is_ascii() { c as u8 } else { b'?' };
            self.send(b, RS)?;
        }
        Ok(())
    }

    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, cmd: u8) -> Result<(), I::Error> {
        self.send(cmd, 0)
    }

    fn send(&mut self, byte: u8, mode: u8) -> Result<(), I::Error> {
        self.write_nibble(byte & 0xF0, mode)?;
        self.write_nibble((byte << 4) & 0xF0, mode)
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), I::Error> {
        let bits = nibble | mode | BACKLIGHT;
        self.i2c.write(self.addr, &[bits | EN])?;
        self.delay.delay_us(1);
        self.i2c.write(self.addr, &[bits])?;
        self.delay.delay_us(50);
        Ok(())
    }
}
