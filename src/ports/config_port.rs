//! Configuration access port trait.
//!
//! Values come back as raw strings; typing and range checks live in
//! [`crate::domain::config_validation`] so every adapter reports bad values
//! the same way.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn has_section(&self, section: &str) -> bool;

    /// Comma-separated value, trimmed, with empty items dropped.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
