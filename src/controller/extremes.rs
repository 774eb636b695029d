use serde::{Deserialize, Serialize};

/// Running bounds of the values a track has observed.
///
/// Observations only ever widen the bounds, which keeps the y-axis scale
/// stable across rounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremesCache {
    maximum_value_seen: f64,
    minimum_value_seen: f64,
}

impl ExtremesCache {
    #[must_use]
    pub fn from_observation(minimum: f64, maximum: f64) -> Self {
        Self {
            maximum_value_seen: minimum.max(maximum),
            minimum_value_seen: minimum.min(maximum),
        }
    }

    /// Widens the bounds to include `[minimum, maximum]`. Non-finite values
    /// are ignored.
    pub fn observe(&mut self, minimum: f64, maximum: f64) {
        if maximum.is_finite() {
            self.maximum_value_seen = self.maximum_value_seen.max(maximum);
        }
        if minimum.is_finite() {
            self.minimum_value_seen = self.minimum_value_seen.min(minimum);
        }
    }

    #[must_use]
    pub fn maximum_value_seen(self) -> f64 {
        self.maximum_value_seen
    }

    #[must_use]
    pub fn minimum_value_seen(self) -> f64 {
        self.minimum_value_seen
    }

    /// Reported axis maximum: the configured override when it is larger.
    #[must_use]
    pub fn effective_maximum(self, configured: Option<f64>) -> f64 {
        configured.unwrap_or(0.0).max(self.maximum_value_seen)
    }

    #[must_use]
    pub fn effective_minimum(self, configured: Option<f64>) -> f64 {
        configured.unwrap_or(0.0).min(self.minimum_value_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::ExtremesCache;

    #[test]
    fn observations_never_narrow_the_range() {
        let mut cache = ExtremesCache::from_observation(1.0, 5.0);
        cache.observe(2.0, 3.0);
        assert_eq!(cache.maximum_value_seen(), 5.0);
        assert_eq!(cache.minimum_value_seen(), 1.0);

        cache.observe(-4.0, 9.0);
        assert_eq!(cache.maximum_value_seen(), 9.0);
        assert_eq!(cache.minimum_value_seen(), -4.0);
    }

    #[test]
    fn configured_override_wins_only_when_more_extreme() {
        let cache = ExtremesCache::from_observation(-1.0, 100.0);
        assert_eq!(cache.effective_maximum(Some(250.0)), 250.0);
        assert_eq!(cache.effective_maximum(Some(50.0)), 100.0);
        assert_eq!(cache.effective_minimum(Some(-10.0)), -10.0);
        assert_eq!(cache.effective_minimum(None), -1.0);
    }

    #[test]
    fn non_finite_observations_are_ignored() {
        let mut cache = ExtremesCache::from_observation(0.0, 1.0);
        cache.observe(f64::NAN, f64::INFINITY);
        assert_eq!(cache.maximum_value_seen(), 1.0);
        assert_eq!(cache.minimum_value_seen(), 0.0);
    }
}
