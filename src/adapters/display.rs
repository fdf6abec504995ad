//! Display adapters for [`DisplayPort`].
//!
//! [`LcdDisplay`] shows both status pages on the 20x4 panel, one after the
//! other.  [`LogDisplay`] writes the same pages to the log for boards
//! without a panel and for host runs.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, warn};

use crate::app::ports::DisplayPort;
use crate::app::status::{display_pages, LcdPage};
use crate::drivers::lcd::Lcd;
use crate::state::StateSnapshot;

/// How long the first page stays up before the second replaces it.
pub const PAGE_HOLD_MS: u32 = 500;

pub struct LcdDisplay<I, D> {
    lcd: Lcd<I, D>,
    hold: D,
    ready: bool,
}

impl<I: I2c, D: DelayNs + Clone> LcdDisplay<I, D> {
    pub fn new(i2c: I, delay: D, addr: u8) -> Self {
        let mut lcd = Lcd::new(i2c, delay.clone(), addr);
        let ready = match lcd.init() {
            Ok(()) => true,
            Err(_) => {
                warn!("LCD at 0x{addr:02X} not responding");
                false
            }
        };
        Self {
            lcd,
            hold: delay,
            ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn show(&mut self, page: &LcdPage) -> Result<(), I::Error> {
        self.lcd.clear()?;
        for (row, text) in page.iter().enumerate() {
            self.lcd.set_cursor(0, row as u8)?;
            self.lcd.print(text)?;
        }
        Ok(())
    }
}

impl<I: I2c, D: DelayNs + Clone> DisplayPort for LcdDisplay<I, D> {
    fn render(&mut self, snapshot: &StateSnapshot) {
        if !self.ready {
            // Panel may have been plugged in after boot.
            self.ready = self.lcd.init().is_ok();
            if !self.ready {
                return;
            }
        }
        let [first, second] = display_pages(snapshot);
        let shown = self.show(&first).and_then(|()| {
            self.hold.delay_ms(PAGE_HOLD_MS);
            self.show(&second)
        });
        if shown.is_err() {
            warn!("LCD write failed");
            self.ready = false;
        }
    }
}

#[derive(Debug, Default)]
pub struct LogDisplay;

impl DisplayPort for LogDisplay {
    fn render(&mut self, snapshot: &StateSnapshot) {
        for page in display_pages(snapshot) {
            debug!("[LCD] {} | {} | {} | {}", page[0], page[1], page[2], page[3]);
        }
    }
}
