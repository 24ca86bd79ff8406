//! Device restart.
//!
//! - **`target_os = "espidf"`**: `esp_restart()`, which never returns.
//! - **all other targets**: exits the simulation process.

use log::warn;

use crate::app::ports::PowerPort;

/// Short pause so the last log lines reach the UART before reset.
const LOG_FLUSH_MS: u64 = 100;

#[derive(Default)]
pub struct PowerAdapter;

impl PowerAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl PowerPort for PowerAdapter {
    #[cfg(target_os = "espidf")]
    #[allow(unreachable_code)]
    fn restart(&mut self) -> ! {
        warn!("POWER | restarting");
        std::thread::sleep(std::time::Duration::from_millis(LOG_FLUSH_MS));
        unsafe { esp_idf_svc::sys::esp_restart() };
        loop {
            std::thread::park();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) -> ! {
        warn!("POWER | restart requested, exiting simulation");
        std::thread::sleep(std::time::Duration::from_millis(LOG_FLUSH_MS));
        std::process::exit(0)
    }
}
