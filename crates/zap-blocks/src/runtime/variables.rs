use std::collections::BTreeMap;

/// Variables every run starts with, and their starting values.
pub const DEFAULT_VARIABLES: &[(&str, f64)] = &[
    ("score", 0.0),
    ("health", 100.0),
    ("lives", 3.0),
    ("coins", 0.0),
    ("timer", 0.0),
    ("level", 1.0),
];

/// Numeric variables of one run, by name.
/// Unknown names read as 0 and are created on first write.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableStore {
    values: BTreeMap<String, f64>,
}

impl VariableStore {
    pub fn new() -> Self {
        let mut store = Self {
            values: BTreeMap::new(),
        };
        store.reset_all();
        store
    }

    /// Restore the default set and forget everything else.
    pub fn reset_all(&mut self) {
        self.values = DEFAULT_VARIABLES
            .iter()
            .map(|&(name, value)| (name.to_string(), value))
            .collect();
    }

    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &str, value: f64) -> f64 {
        self.values.insert(name.to_string(), value);
        value
    }

    /// Add `amount` and return the new value.
    pub fn change(&mut self, name: &str, amount: f64) -> f64 {
        let value = self.get(name) + amount;
        self.set(name, value)
    }

    /// Back to the starting value (0 for names outside the default set).
    pub fn reset(&mut self, name: &str) -> f64 {
        self.set(name, default_value(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_value(name: &str) -> f64 {
    DEFAULT_VARIABLES
        .iter()
        .find(|(n, _)| *n == name)
        .map_or(0.0, |&(_, v)| v)
}
