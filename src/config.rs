//! # Action configuration.
//!
//! Provides [`Config`], the settings shared by every [`Action`](crate::Action)
//! and [`InterruptibleAction`](crate::InterruptibleAction) constructor.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 (a broadcast channel needs room for one event)

use std::borrow::Cow;

/// Configuration for an action instance.
///
/// ## Field semantics
/// - `name`: label attached to every log record of this action
/// - `bus_capacity`: ring buffer size of each lifecycle bus (min 1; clamped)
///
/// ## Notes
/// All fields are public for flexibility. Prefer [`Config::bus_capacity_clamped`]
/// over reading `bus_capacity` directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Human-readable action name used in logs.
    ///
    /// An [`InterruptibleAction`](crate::InterruptibleAction) names its inner
    /// action `name` and its interrupt action `"{name}.interrupt"`.
    pub name: Cow<'static, str>,

    /// Capacity of each broadcast bus (`events`, `values`, `errors`, ...).
    ///
    /// Receivers that lag behind more than `bus_capacity` messages observe
    /// `RecvError::Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a default configuration with the given name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the configuration used for the interrupt half of an interruptible action.
    pub(crate) fn interrupt(&self) -> Self {
        Self {
            name: Cow::Owned(format!("{}.interrupt", self.name)),
            bus_capacity: self.bus_capacity,
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "action"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("action"),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn interrupt_config_derives_name() {
        let cfg = Config::named("search");
        let interrupt = cfg.interrupt();
        assert_eq!(interrupt.name, "search.interrupt");
        assert_eq!(interrupt.bus_capacity, cfg.bus_capacity);
    }
}
