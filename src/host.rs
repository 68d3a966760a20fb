//! Host application interface.
//!
//! The desktop process that embeds the web view is started and owned by an
//! external launcher. The engine only needs to know that the top-level window
//! is ready and that the UI is in online mode before it attaches to the
//! embedded browser.

use crate::error::{Error, Result};

/// UI mode of the host application's main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Offline,
    Online,
}

/// Signals exposed by the external host application launcher.
pub trait HostApplication: Send + Sync {
    /// Whether the top-level window exists and accepts interaction.
    fn is_window_ready(&self) -> bool;
    /// Current UI mode, used to skip redundant mode-switch work.
    fn current_ui_mode(&self) -> UiMode;
    /// Switch to online mode. Idempotent; the caller re-checks the mode.
    fn switch_to_online_mode(&self) -> bool;
}

/// Ensure the host window is ready and in online mode.
pub fn ensure_online(host: &dyn HostApplication) -> Result<()> {
    if !host.is_window_ready() {
        return Err(Error::HostNotReady);
    }
    if host.current_ui_mode() == UiMode::Online {
        tracing::debug!("host already in online mode");
        return Ok(());
    }
    if !host.switch_to_online_mode() || host.current_ui_mode() != UiMode::Online {
        return Err(Error::ModeSwitch);
    }
    tracing::info!("host switched to online mode");
    Ok(())
}

/// Host stand-in for runs against a window that is already prepared
/// (launched, focused, online) by other means.
pub struct DetachedHost;

impl HostApplication for DetachedHost {
    fn is_window_ready(&self) -> bool {
        true
    }
    fn current_ui_mode(&self) -> UiMode {
        UiMode::Online
    }
    fn switch_to_online_mode(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeHost {
        ready: bool,
        online: AtomicBool,
        switch_works: bool,
        switch_calls: AtomicUsize,
    }

    impl HostApplication for FakeHost {
        fn is_window_ready(&self) -> bool {
            self.ready
        }
        fn current_ui_mode(&self) -> UiMode {
            if self.online.load(Ordering::SeqCst) {
                UiMode::Online
            } else {
                UiMode::Offline
            }
        }
        fn switch_to_online_mode(&self) -> bool {
            self.switch_calls.fetch_add(1, Ordering::SeqCst);
            if self.switch_works {
                self.online.store(true, Ordering::SeqCst);
            }
            self.switch_works
        }
    }

    fn host(ready: bool, online: bool, switch_works: bool) -> FakeHost {
        FakeHost {
            ready,
            online: AtomicBool::new(online),
            switch_works,
            switch_calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn skips_switch_when_already_online() {
        let h = host(true, true, true);
        ensure_online(&h).unwrap();
        assert_eq!(h.switch_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn switches_and_verifies() {
        let h = host(true, false, true);
        ensure_online(&h).unwrap();
        assert_eq!(h.switch_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn window_not_ready_is_fatal() {
        assert!(matches!(
            ensure_online(&host(false, false, true)),
            Err(Error::HostNotReady)
        ));
    }

    #[test]
    fn failed_switch_is_reported() {
        assert!(matches!(
            ensure_online(&host(true, false, false)),
            Err(Error::ModeSwitch)
        ));
    }
}
