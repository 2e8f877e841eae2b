use std::time::Duration;

use geo::Rect;
use tracing::{debug, warn};

use crate::types::{FeatureCollection, LayerDescriptor};

use super::{CancellationToken, FeatureSource, FetchError};

/// Fetch one layer, bounded by `deadline` and `token`.
pub async fn fetch_with_deadline<S: FeatureSource>(
    source: &S,
    descriptor: &LayerDescriptor,
    envelope: Rect<f64>,
    deadline: Duration,
    token: &CancellationToken,
) -> Result<FeatureCollection, FetchError> {
    if token.is_cancelled() { return Err(FetchError::Cancelled) }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FetchError::Cancelled),
        result = tokio::time::timeout(deadline, source.fetch_features(descriptor, envelope)) => {
            result.unwrap_or(Err(FetchError::Timeout(deadline)))
        }
    }
}

/// Like [`fetch_with_deadline`], but any failure becomes an empty layer.
pub async fn fetch_or_empty<S: FeatureSource>(
    source: &S,
    descriptor: &LayerDescriptor,
    envelope: Rect<f64>,
    deadline: Duration,
    token: &CancellationToken,
) -> FeatureCollection {
    match fetch_with_deadline(source, descriptor, envelope, deadline, token).await {
        Ok(collection) => {
            debug!(layer = %descriptor.layer, features = collection.len(), "[acquire] fetched layer");
            collection
        }
        Err(err) => {
            warn!(layer = %descriptor.layer, "[acquire] layer unavailable, skipping: {err}");
            FeatureCollection::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, Point};
    use crate::types::{Feature, Layer};

    struct Slow(Duration);

    impl FeatureSource for Slow {
        async fn fetch_features(&self, _: &LayerDescriptor, _: Rect<f64>) -> Result<FeatureCollection, FetchError> {
            tokio::time::sleep(self.0).await;
            Ok(FeatureCollection::new(vec![Feature::new(Point::new(0.0, 0.0))]))
        }
    }

    struct Broken;

    impl FeatureSource for Broken {
        async fn fetch_features(&self, _: &LayerDescriptor, _: Rect<f64>) -> Result<FeatureCollection, FetchError> {
            Err(FetchError::Http("503 Service Unavailable".into()))
        }
    }

    fn envelope() -> Rect<f64> {
        Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 })
    }

    fn descriptor() -> LayerDescriptor { LayerDescriptor::new(Layer::Flood, 1.0) }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let token = CancellationToken::new();
        let result = fetch_with_deadline(&Slow(Duration::from_secs(30)), &descriptor(), envelope(), Duration::from_secs(10), &token).await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_source_returns_features() {
        let token = CancellationToken::new();
        let collection = fetch_or_empty(&Slow(Duration::from_millis(5)), &descriptor(), envelope(), Duration::from_secs(10), &token).await;
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let result = fetch_with_deadline(&Slow(Duration::ZERO), &descriptor(), envelope(), Duration::from_secs(10), &token).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn errors_become_empty_layers() {
        let token = CancellationToken::new();
        let collection = fetch_or_empty(&Broken, &descriptor(), envelope(), Duration::from_secs(10), &token).await;
        assert!(collection.is_empty());
    }
}
