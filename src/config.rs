//! Playlist filtering and classification settings.

/// Which playlists count as valid.
///
/// Use the builder to change individual settings:
///
/// ```
/// use bdplaylist::config::PlaylistFilter;
///
/// let filter = PlaylistFilter::builder()
///     .min_duration(60.0)
///     .filter_looping(false)
///     .build();
/// assert!(filter.filter_short);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaylistFilter {
    /// Reject playlists shorter than `min_duration`.
    /// Default: true
    pub filter_short: bool,

    /// Minimum playlist length in seconds.
    /// Default: 20
    pub min_duration: f64,

    /// Reject playlists that play the same clip from the same point twice.
    /// Default: true
    pub filter_looping: bool,
}

impl Default for PlaylistFilter {
    fn default() -> Self {
        Self {
            filter_short: true,
            min_duration: 20.0,
            filter_looping: true,
        }
    }
}

impl PlaylistFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> PlaylistFilterBuilder {
        PlaylistFilterBuilder::default()
    }
}

/// Builder for `PlaylistFilter`.
#[derive(Debug, Clone, Default)]
pub struct PlaylistFilterBuilder {
    filter_short: Option<bool>,
    min_duration: Option<f64>,
    filter_looping: Option<bool>,
}

impl PlaylistFilterBuilder {
    pub fn filter_short(mut self, enabled: bool) -> Self {
        self.filter_short = Some(enabled);
        self
    }

    pub fn min_duration(mut self, seconds: f64) -> Self {
        self.min_duration = Some(seconds);
        self
    }

    pub fn filter_looping(mut self, enabled: bool) -> Self {
        self.filter_looping = Some(enabled);
        self
    }

    pub fn build(self) -> PlaylistFilter {
        let defaults = PlaylistFilter::default();
        PlaylistFilter {
            filter_short: self.filter_short.unwrap_or(defaults.filter_short),
            min_duration: self.min_duration.unwrap_or(defaults.min_duration),
            filter_looping: self.filter_looping.unwrap_or(defaults.filter_looping),
        }
    }
}

/// Thresholds for the default disc classification policy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifierPolicy {
    /// Playlists at least this long, in seconds, are feature length.
    /// Default: 600
    pub feature_length: f64,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            feature_length: 600.0,
        }
    }
}
