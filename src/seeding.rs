//! Generation of seed points for field line tracing.

use crate::{field::GeographicPosition, trace::ftr};

/// Generates seed positions on a regular latitude-longitude grid at a
/// fixed height.
#[derive(Clone, Debug)]
pub struct GeographicGridSeeder {
    latitude_bounds: (ftr, ftr),
    longitude_bounds: (ftr, ftr),
    shape: (usize, usize),
    height: ftr,
}

impl GeographicGridSeeder {
    /// Creates a new seeder producing `shape.0 x shape.1` positions evenly
    /// covering the given latitude and longitude bounds [deg] at the given
    /// height above the surface [km].
    ///
    /// Grid points are placed at cell centers, so the bounds themselves are
    /// never seeded and full longitude coverage does not duplicate the
    /// wrap-around meridian.
    pub fn new(
        latitude_bounds: (ftr, ftr),
        longitude_bounds: (ftr, ftr),
        shape: (usize, usize),
        height: ftr,
    ) -> Self {
        assert!(
            latitude_bounds.0 < latitude_bounds.1,
            "Lower latitude bound must be smaller than upper bound."
        );
        assert!(
            longitude_bounds.0 < longitude_bounds.1,
            "Lower longitude bound must be smaller than upper bound."
        );
        assert!(
            shape.0 > 0 && shape.1 > 0,
            "Number of seed points must be larger than zero in both directions."
        );
        Self {
            latitude_bounds,
            longitude_bounds,
            shape,
            height,
        }
    }

    /// Returns the number of seed positions the seeder will produce.
    pub fn number_of_points(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    /// Generates the seed positions, ordered by latitude and then longitude.
    pub fn positions(&self) -> Vec<GeographicPosition> {
        let (n_latitudes, n_longitudes) = self.shape;
        let latitude_extent = self.latitude_bounds.1 - self.latitude_bounds.0;
        let longitude_extent = self.longitude_bounds.1 - self.longitude_bounds.0;
        let latitude_cell = latitude_extent / (n_latitudes as ftr);
        let longitude_cell = longitude_extent / (n_longitudes as ftr);

        let mut positions = Vec::with_capacity(self.number_of_points());
        for lat_idx in 0..n_latitudes {
            let latitude = self.latitude_bounds.0 + (lat_idx as ftr + 0.5) * latitude_cell;
            for lon_idx in 0..n_longitudes {
                let longitude = self.longitude_bounds.0 + (lon_idx as ftr + 0.5) * longitude_cell;
                positions.push(GeographicPosition::new(latitude, longitude, self.height));
            }
        }
        positions
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn grid_seeder_produces_the_requested_number_of_points() {
        let seeder = GeographicGridSeeder::new((-60.0, 60.0), (0.0, 360.0), (4, 8), 300.0);
        let positions = seeder.positions();
        assert_eq!(positions.len(), 32);
        assert_eq!(positions.len(), seeder.number_of_points());
    }

    #[test]
    fn grid_seeder_stays_inside_its_bounds() {
        let seeder = GeographicGridSeeder::new((-90.0, 90.0), (0.0, 360.0), (5, 10), 110.0);
        for position in seeder.positions() {
            assert!(position.latitude() > -90.0 && position.latitude() < 90.0);
            assert!(position.longitude() > 0.0 && position.longitude() < 360.0);
            assert_eq!(position.height(), 110.0);
        }
    }

    #[test]
    fn full_longitude_coverage_does_not_duplicate_the_wrap_around() {
        let seeder = GeographicGridSeeder::new((-10.0, 10.0), (0.0, 360.0), (1, 4), 0.0);
        let longitudes: Vec<_> = seeder
            .positions()
            .iter()
            .map(|position| position.longitude())
            .collect();
        assert_eq!(longitudes, vec![45.0, 135.0, 225.0, 315.0]);
    }
}
