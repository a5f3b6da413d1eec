//! Configuration access port trait.

/// Sectioned key/value configuration with typed lookups.
///
/// Typed getters fall back to `default` when a key is missing or does not
/// parse; `get_string` exposes the raw value so callers can tell the two apart.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
