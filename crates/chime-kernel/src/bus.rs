//! Output buses.
//!
//! Every sound is routed to a named bus. The master bus always exists and
//! catches anything addressed to a bus that does not.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chime_common::{ChimeConfig, MASTER_BUS_NAME};
use parking_lot::RwLock;
use tracing::debug;

/// Bus layout shared between an engine and the voices it creates.
pub type SharedBuses = Arc<RwLock<BusLayout>>;

/// Convert a decibel offset to a linear amplitude multiplier.
#[must_use]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude multiplier to decibels.
#[must_use]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Name of an output bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusName(Arc<str>);

impl BusName {
    /// Create a bus name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The master bus.
    #[must_use]
    pub fn master() -> Self {
        Self::new(MASTER_BUS_NAME)
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this names the master bus.
    #[must_use]
    pub fn is_master(&self) -> bool {
        &*self.0 == MASTER_BUS_NAME
    }
}

impl Default for BusName {
    fn default() -> Self {
        Self::master()
    }
}

impl From<&str> for BusName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BusName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for BusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A mixing bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    /// Bus name.
    pub name: BusName,
    /// Gain offset in decibels.
    pub volume_db: f32,
    /// Whether the bus is silenced.
    pub mute: bool,
}

impl Bus {
    /// Create an unmuted bus with the given gain.
    #[must_use]
    pub fn new(name: impl Into<BusName>, volume_db: f32) -> Self {
        Self {
            name: name.into(),
            volume_db,
            mute: false,
        }
    }
}

/// The set of buses known to an engine.
#[derive(Debug, Clone)]
pub struct BusLayout {
    master: Bus,
    buses: HashMap<BusName, Bus>,
}

impl Default for BusLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl BusLayout {
    /// Create a layout containing only the master bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            master: Bus::new(BusName::master(), 0.0),
            buses: HashMap::new(),
        }
    }

    /// Build a layout from configuration.
    #[must_use]
    pub fn from_config(config: &ChimeConfig) -> Self {
        let mut layout = Self::new();
        layout.master.volume_db = config.master_volume_db;
        for bus in &config.buses {
            layout.add(Bus {
                name: BusName::new(&bus.name),
                volume_db: bus.volume_db,
                mute: bus.mute,
            });
        }
        layout
    }

    /// Wrap the layout for sharing with voices.
    #[must_use]
    pub fn into_shared(self) -> SharedBuses {
        Arc::new(RwLock::new(self))
    }

    /// Add or replace a bus.
    pub fn add(&mut self, bus: Bus) {
        if bus.name.is_master() {
            self.master = bus;
        } else {
            self.buses.insert(bus.name.clone(), bus);
        }
    }

    /// Get a bus by name.
    #[must_use]
    pub fn get(&self, name: &BusName) -> Option<&Bus> {
        if name.is_master() {
            Some(&self.master)
        } else {
            self.buses.get(name)
        }
    }

    fn get_mut(&mut self, name: &BusName) -> Option<&mut Bus> {
        if name.is_master() {
            Some(&mut self.master)
        } else {
            self.buses.get_mut(name)
        }
    }

    /// Check if a bus exists.
    #[must_use]
    pub fn contains(&self, name: &BusName) -> bool {
        self.get(name).is_some()
    }

    /// Number of buses, master included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buses.len() + 1
    }

    /// Always false; the master bus cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Set a bus gain. Returns false if the bus does not exist.
    pub fn set_volume_db(&mut self, name: &BusName, volume_db: f32) -> bool {
        match self.get_mut(name) {
            Some(bus) => {
                bus.volume_db = volume_db;
                true
            },
            None => false,
        }
    }

    /// Mute or unmute a bus. Returns false if the bus does not exist.
    pub fn set_mute(&mut self, name: &BusName, mute: bool) -> bool {
        match self.get_mut(name) {
            Some(bus) => {
                bus.mute = mute;
                true
            },
            None => false,
        }
    }

    /// Resolve a bus by name, falling back to master when it does not exist.
    #[must_use]
    pub fn resolve(&self, name: &BusName) -> &Bus {
        match self.get(name) {
            Some(bus) => bus,
            None => {
                debug!("Bus '{}' not found, falling back to {}", name, MASTER_BUS_NAME);
                &self.master
            },
        }
    }

    /// Linear gain applied to sounds routed to `name`, master included.
    #[must_use]
    pub fn output_gain(&self, name: &BusName) -> f32 {
        let bus = self.resolve(name);
        let master = &self.master;
        if bus.mute || master.mute {
            return 0.0;
        }

        let db = if bus.name.is_master() {
            bus.volume_db
        } else {
            bus.volume_db + master.volume_db
        };
        db_to_linear(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_common::BusConfig;

    #[test]
    fn test_db_conversion() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
        assert!((linear_to_db(1.0)).abs() < 1e-6);
        assert!(linear_to_db(0.0).is_infinite());
    }

    #[test]
    fn test_layout_always_has_master() {
        let layout = BusLayout::new();
        assert!(layout.contains(&BusName::master()));
        assert_eq!(layout.len(), 1);
        assert!(!layout.is_empty());
    }

    #[test]
    fn test_unknown_bus_falls_back_to_master() {
        let layout = BusLayout::new();
        let bus = layout.resolve(&BusName::new("Nope"));
        assert!(bus.name.is_master());
    }

    #[test]
    fn test_output_gain_includes_master() {
        let mut layout = BusLayout::new();
        layout.add(Bus::new("Sfx", -6.0));
        layout.set_volume_db(&BusName::master(), -14.0);

        let gain = layout.output_gain(&BusName::new("Sfx"));
        assert!((gain - db_to_linear(-20.0)).abs() < 1e-6);

        let master_gain = layout.output_gain(&BusName::master());
        assert!((master_gain - db_to_linear(-14.0)).abs() < 1e-6);
    }

    #[test]
    fn test_muted_bus_is_silent() {
        let mut layout = BusLayout::new();
        layout.add(Bus::new("Ui", 0.0));
        assert!(layout.set_mute(&BusName::new("Ui"), true));
        assert!(layout.output_gain(&BusName::new("Ui")).abs() < f32::EPSILON);

        assert!(!layout.set_mute(&BusName::new("Missing"), true));
    }

    #[test]
    fn test_muted_master_silences_everything() {
        let mut layout = BusLayout::new();
        layout.add(Bus::new("Sfx", 0.0));
        layout.set_mute(&BusName::master(), true);
        assert!(layout.output_gain(&BusName::new("Sfx")).abs() < f32::EPSILON);
    }

    #[test]
    fn test_layout_from_config() {
        let mut config = ChimeConfig::default().with_bus(BusConfig::new("Music", -3.0));
        config.master_volume_db = -1.0;

        let layout = BusLayout::from_config(&config);
        assert_eq!(layout.len(), 2);
        let master = layout.resolve(&BusName::master());
        assert!((master.volume_db + 1.0).abs() < f32::EPSILON);
    }
}
