use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use tracing::debug;

use crate::error::DriverError;
use crate::geo::Coordinate;

use super::{CoordinateKey, DirectionsProvider, RawRouteResponse, RouteOptions};

type CacheKey = (CoordinateKey, CoordinateKey, RouteOptions);

/// LRU-cached wrapper around any [`DirectionsProvider`].
///
/// Cache key is origin and destination rounded to 1e-5 degrees plus the
/// request options (directional). Only successful responses are stored.
pub struct CachedDirections {
    inner: Box<dyn DirectionsProvider>,
    cache: Mutex<LruCache<CacheKey, RawRouteResponse>>,
}

impl CachedDirections {
    pub fn new(inner: Box<dyn DirectionsProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DirectionsProvider for CachedDirections {
    fn calculate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        options: &RouteOptions,
    ) -> Result<RawRouteResponse, DriverError> {
        let key = (origin.into(), destination.into(), options.clone());

        // Fast path: cache hit
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&key) {
                debug!("directions cache hit");
                return Ok(cached.clone());
            }
        }

        let response = self.inner.calculate_route(origin, destination, options)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, response.clone());
        }
        Ok(response)
    }
}
