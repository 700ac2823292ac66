//! Small shared helpers.

use std::time::Duration;

use rand::Rng;

/// Sleep for a uniformly random duration between `min` and `max` seconds.
/// Used as the politeness delay between network-touching operations so the
/// request rate stays bounded and slightly irregular.
pub async fn jitter_sleep(min: f64, max: f64) {
    let secs = if max > min {
        rand::rng().random_range(min..max)
    } else {
        min
    };
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}
