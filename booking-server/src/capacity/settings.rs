//! 运行时容量配置 (operator-mutable, process lifetime only)

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use shared::ServiceWindow;
use thiserror::Error;

use super::classifier;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unknown service window: {0}")]
    UnknownWindow(String),

    #[error("Capacity must be a positive integer")]
    InvalidCapacity,
}

/// Service windows plus the global online-booking switch.
///
/// Last write wins; changes come from operators and are rare.
#[derive(Debug)]
pub struct CapacitySettings {
    windows: RwLock<Vec<ServiceWindow>>,
    online_booking_blocked: AtomicBool,
}

impl CapacitySettings {
    pub fn new(windows: Vec<ServiceWindow>) -> Self {
        for (a, b) in classifier::overlapping_windows(&windows) {
            tracing::warn!(first = %a, second = %b, "Service windows overlap, first match wins");
        }
        Self {
            windows: RwLock::new(windows),
            online_booking_blocked: AtomicBool::new(false),
        }
    }

    /// Snapshot in configuration order
    pub fn windows(&self) -> Vec<ServiceWindow> {
        self.windows.read().clone()
    }

    pub fn window(&self, name: &str) -> Option<ServiceWindow> {
        self.windows.read().iter().find(|w| w.name == name).cloned()
    }

    /// Window covering a local hour
    pub fn classify(&self, hour: u32) -> Option<ServiceWindow> {
        classifier::classify(&self.windows.read(), hour).cloned()
    }

    /// Flip a window's blocked flag, returning the new value
    pub fn toggle_blocked(&self, name: &str) -> Result<bool, SettingsError> {
        self.update(name, |w| {
            w.blocked = !w.blocked;
            w.blocked
        })
    }

    pub fn set_blocked(&self, name: &str, blocked: bool) -> Result<(), SettingsError> {
        self.update(name, |w| w.blocked = blocked)
    }

    /// Replace a window's capacity, returning the previous one
    pub fn set_max_capacity(&self, name: &str, capacity: u32) -> Result<u32, SettingsError> {
        if capacity == 0 {
            return Err(SettingsError::InvalidCapacity);
        }
        self.update(name, |w| std::mem::replace(&mut w.max_capacity, capacity))
    }

    pub fn online_booking_blocked(&self) -> bool {
        self.online_booking_blocked.load(Ordering::SeqCst)
    }

    pub fn set_online_booking_blocked(&self, blocked: bool) {
        self.online_booking_blocked.store(blocked, Ordering::SeqCst);
    }

    /// Flip the global switch, returning the new value
    pub fn toggle_online_booking(&self) -> bool {
        !self.online_booking_blocked.fetch_xor(true, Ordering::SeqCst)
    }

    fn update<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut ServiceWindow) -> T,
    ) -> Result<T, SettingsError> {
        let mut windows = self.windows.write();
        let window = windows
            .iter_mut()
            .find(|w| w.name == name)
            .ok_or_else(|| SettingsError::UnknownWindow(name.to_string()))?;
        Ok(f(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CapacitySettings {
        CapacitySettings::new(vec![
            ServiceWindow::new("lunch", 12, 14, 60),
            ServiceWindow::new("dinner", 19, 22, 70),
        ])
    }

    #[test]
    fn test_toggle_blocked() {
        let settings = settings();
        assert_eq!(settings.toggle_blocked("lunch"), Ok(true));
        assert!(settings.window("lunch").unwrap().blocked);
        assert!(!settings.window("dinner").unwrap().blocked);
        assert_eq!(settings.toggle_blocked("lunch"), Ok(false));
        assert_eq!(
            settings.toggle_blocked("brunch"),
            Err(SettingsError::UnknownWindow("brunch".into()))
        );
    }

    #[test]
    fn test_set_max_capacity() {
        let settings = settings();
        assert_eq!(settings.set_max_capacity("dinner", 80), Ok(70));
        assert_eq!(settings.window("dinner").unwrap().max_capacity, 80);
        assert_eq!(
            settings.set_max_capacity("dinner", 0),
            Err(SettingsError::InvalidCapacity)
        );
        assert_eq!(settings.window("dinner").unwrap().max_capacity, 80);
    }

    #[test]
    fn test_online_booking_switch() {
        let settings = settings();
        assert!(!settings.online_booking_blocked());
        assert!(settings.toggle_online_booking());
        assert!(settings.online_booking_blocked());
        assert!(!settings.toggle_online_booking());
        settings.set_online_booking_blocked(true);
        assert!(settings.online_booking_blocked());
    }
}
