//! Error signal adapter.
//!
//! The panel driver lives outside the network core; this adapter only
//! records that the error screen was requested and logs it, which is what
//! the serial console shows on boards without a panel.

use log::error;

use crate::app::ports::DisplayPort;

#[derive(Default)]
pub struct LogDisplay {
    errors_shown: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of error signals raised since boot.
    pub fn errors_shown(&self) -> u32 {
        self.errors_shown
    }
}

impl DisplayPort for LogDisplay {
    fn show_error(&mut self) {
        self.errors_shown = self.errors_shown.saturating_add(1);
        error!("DISPLAY | error screen");
    }
}
