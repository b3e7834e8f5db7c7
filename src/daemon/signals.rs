use crate::error::{Error, Result};

#[cfg(unix)]
pub fn setup_signal_handlers() -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGTERM, SIGINT])
        .map_err(|e| Error::Daemon(format!("Failed to setup signal handlers: {}", e)))?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            if sig == SIGTERM || sig == SIGINT {
                log::info!("Received termination signal, stopping after the current batch");
                super::set_stop_flag();
            }
        }
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn setup_signal_handlers() -> Result<()> {
    log::warn!("Signal handling unavailable on this platform; stop the watcher with Ctrl+C");
    Ok(())
}
