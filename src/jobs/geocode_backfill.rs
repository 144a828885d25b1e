// ==================== GEOCODE BACKFILL ====================
// Job de manutenção: preenche coordenadas de listings salvos com [0, 0]
// (geocoding indisponível na criação ou MAP_TOKEN ausente)

use tokio::time::{sleep, Duration};

use crate::{
    database::{ListingFilter, ListingOrder, ListingRepository},
    services::{GeocodeOutcome, Geocoder},
    state::AppState,
    utils::AppError,
};

/// Pause between provider calls, keeps us under the Mapbox rate limit.
pub const PROVIDER_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillReport {
    /// Listings in the collection when the job started.
    pub total: u64,
    pub scanned: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Geocodes `"{location}, {country}"` for every listing without usable coordinates.
pub async fn backfill_locations(
    listings: &dyn ListingRepository,
    geocoder: &dyn Geocoder,
    pause: Duration,
) -> Result<BackfillReport, AppError> {
    let total = listings.count_listings().await?;
    let pending = listings
        .find_listings(&ListingFilter::Unlocated, ListingOrder::Natural)
        .await?;

    log::info!("📊 Total listings: {}", total);
    log::info!("📋 Found {} listings without coordinates", pending.len());
    for listing in &pending {
        log::info!(
            "   📍 {} ({}, {}) -> [{}, {}]",
            listing.title,
            listing.location,
            listing.country,
            listing.geometry.coordinates[0],
            listing.geometry.coordinates[1]
        );
    }

    let mut report = BackfillReport {
        total,
        scanned: pending.len(),
        ..Default::default()
    };

    for (index, listing) in pending.iter().enumerate() {
        let Some(id) = listing.id else {
            continue;
        };
        if index > 0 {
            sleep(pause).await;
        }

        let address = format!("{}, {}", listing.location, listing.country);
        match geocoder.forward(&address).await {
            GeocodeOutcome::Located(geometry) if geometry.is_located() => {
                match listings.set_geometry(&id, geometry).await {
                    Ok(true) => {
                        log::info!(
                            "   ✅ {} updated with coordinates [{}, {}]",
                            listing.title,
                            geometry.coordinates[0],
                            geometry.coordinates[1]
                        );
                        report.updated += 1;
                    }
                    Ok(false) => {
                        log::warn!("   ⚠️  {} was deleted during the backfill", listing.title);
                        report.failed += 1;
                    }
                    Err(e) => {
                        log::error!("   ❌ Error updating {}: {}", listing.title, e);
                        report.failed += 1;
                    }
                }
            }
            GeocodeOutcome::Located(_) => {
                log::warn!("   ⚠️  Provider returned [0, 0] for {}", address);
                report.failed += 1;
            }
            GeocodeOutcome::Unavailable(reason) => {
                log::warn!("   ⚠️  No coordinates found for {}: {}", address, reason);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Runs the backfill once in the background.
pub fn spawn_geocode_backfill(state: AppState) {
    log::info!("🗺️  Starting geocode backfill job");

    tokio::spawn(async move {
        match backfill_locations(state.listings.as_ref(), state.geocoder.as_ref(), PROVIDER_PAUSE).await {
            Ok(report) => log::info!(
                "✅ Geocode backfill completed: {} updated, {} failed, {} processed of {} listings",
                report.updated,
                report.failed,
                report.scanned,
                report.total
            ),
            Err(e) => log::error!("❌ Geocode backfill failed: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{Geometry, Listing};
    use crate::testing::StubGeocoder;

    fn listing(title: &str, geometry: Geometry) -> Listing {
        Listing {
            id: None,
            title: title.into(),
            description: String::new(),
            image: Default::default(),
            price: 100.0,
            location: "Banff".into(),
            country: "Canada".into(),
            category: "Mountains".into(),
            geometry,
            owner: None,
            reviews: vec![],
        }
    }

    #[tokio::test]
    async fn only_unlocated_listings_are_geocoded() {
        let store = MemoryStore::new();
        store.insert_listing(listing("Located", Geometry::point(1.0, 2.0))).await.unwrap();
        let half = store.insert_listing(listing("Half", Geometry::point(7.0, 0.0))).await.unwrap();
        let zero = store.insert_listing(listing("Zero", Geometry::unlocated())).await.unwrap();

        let geocoder = StubGeocoder::located(Geometry::point(-115.57, 51.17));
        let report = backfill_locations(&store, &geocoder, Duration::ZERO).await.unwrap();

        assert_eq!(report, BackfillReport { total: 3, scanned: 2, updated: 2, failed: 0 });
        assert_eq!(geocoder.calls(), 2);
        for id in [half.id.unwrap(), zero.id.unwrap()] {
            let stored = store.get_listing(&id).await.unwrap().unwrap();
            assert_eq!(stored.geometry, Geometry::point(-115.57, 51.17));
        }
    }

    #[tokio::test]
    async fn provider_failures_are_counted() {
        let store = MemoryStore::new();
        store.insert_listing(listing("Zero", Geometry::unlocated())).await.unwrap();

        let report = backfill_locations(&store, &StubGeocoder::unavailable(), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report, BackfillReport { total: 1, scanned: 1, updated: 0, failed: 1 });
    }
}
