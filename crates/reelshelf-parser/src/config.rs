//! Parser configuration.

use chrono::Datelike;

/// Earliest year accepted as a release year.
pub const EARLIEST_YEAR: u16 = 1880;

/// Configuration for the parser.
///
/// Use the builder pattern to create a configuration:
///
/// ```
/// use reelshelf_parser::config::ParserConfig;
///
/// let config = ParserConfig::builder()
///     .current_year(2024)
///     .build();
/// assert_eq!(config.latest_year(), 2025);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfig {
    /// Year treated as "now" when validating release years.
    /// Default: the system clock's current year.
    pub current_year: Option<u16>,
}

impl ParserConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder.
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::default()
    }

    /// Latest year accepted as a release year (current year + 1).
    pub fn latest_year(&self) -> u16 {
        let now = self.current_year.unwrap_or_else(|| {
            u16::try_from(chrono::Utc::now().year()).unwrap_or(u16::MAX - 1)
        });
        now.saturating_add(1)
    }

    /// Whether `year` falls inside the accepted release-year window.
    pub fn accepts_year(&self, year: u16) -> bool {
        (EARLIEST_YEAR..=self.latest_year()).contains(&year)
    }
}

/// Builder for `ParserConfig`.
#[derive(Debug, Clone, Default)]
pub struct ParserConfigBuilder {
    current_year: Option<u16>,
}

impl ParserConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the current year instead of reading the clock.
    pub fn current_year(mut self, year: u16) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ParserConfig {
        ParserConfig {
            current_year: self.current_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_window() {
        let config = ParserConfig::builder().current_year(2024).build();
        assert!(config.accepts_year(1880));
        assert!(config.accepts_year(2025));
        assert!(!config.accepts_year(1879));
        assert!(!config.accepts_year(2026));
    }

    #[test]
    fn test_default_uses_clock() {
        let config = ParserConfig::default();
        assert!(config.latest_year() > 2020);
    }
}
