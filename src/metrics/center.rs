use ahash::AHashMap;
use anyhow::{Context, Result};
use geo::{Distance, Euclidean, Point};
use log::info;
use polars::prelude::*;

use crate::{common::stats, layer::PointLayer};

/// Mean coordinate of each county's voters, in first-seen county order.
pub fn county_centers(layer: &PointLayer) -> Result<Vec<(String, Point<f64>)>> {
    let county = layer.str_column("county")
        .context("[metrics::county_centers] county column is required")?;

    let frame = DataFrame::new(vec![
        county.clone().with_name("county".into()).into_column(),
        Column::new("x".into(), layer.points().iter().map(|p| p.x()).collect::<Vec<_>>()),
        Column::new("y".into(), layer.points().iter().map(|p| p.y()).collect::<Vec<_>>()),
    ])?;
    let means = frame.lazy()
        .filter(col("county").is_not_null())
        .group_by_stable([col("county")])
        .agg([col("x").mean(), col("y").mean()])
        .collect()
        .context("[metrics::county_centers] Failed to average voter coordinates")?;

    let names = means.column("county")?.str()?;
    let xs = means.column("x")?.f64()?;
    let ys = means.column("y")?.f64()?;
    Ok(names.into_iter().zip(xs).zip(ys)
        .filter_map(|((name, x), y)| Some((name?.to_string(), Point::new(x?, y?))))
        .inspect(|(name, center)| info!("{name} County center: ({:.0}, {:.0})", center.x(), center.y()))
        .collect())
}

/// Quartile bucket of a distance.
pub fn distance_category(distance: f64, q25: f64, q50: f64, q75: f64) -> &'static str {
    if distance <= q25 {
        "Very Close (0-25%)"
    } else if distance <= q50 {
        "Close (25-50%)"
    } else if distance <= q75 {
        "Far (50-75%)"
    } else {
        "Very Far (75-100%)"
    }
}

/// Add `distance_to_center` and `distance_category`, with quartiles taken over
/// all voters. Rows without a known county get null and "Unknown".
pub fn add_distance_to_center(layer: &mut PointLayer, centers: &[(String, Point<f64>)]) -> Result<()> {
    let county = layer.str_column("county")
        .context("[metrics::add_distance_to_center] county column is required")?;

    let centers = centers.iter()
        .map(|(name, center)| (name.as_str(), *center))
        .collect::<AHashMap<_, _>>();
    let distances = county.into_iter().zip(layer.points())
        .map(|(name, point)| Some(Euclidean.distance(point, centers.get(name?)?)))
        .collect::<Vec<Option<f64>>>();

    let known = distances.iter().flatten().copied().collect::<Vec<_>>();
    let (q25, q50, q75) = (
        stats::percentile(&known, 25.0),
        stats::percentile(&known, 50.0),
        stats::percentile(&known, 75.0),
    );
    let categories = distances.iter()
        .map(|d| d.map_or("Unknown", |d| distance_category(d, q25, q50, q75)))
        .collect::<Vec<_>>();

    layer.set_column(Column::new("distance_to_center".into(), distances))?;
    layer.set_column(Column::new("distance_category".into(), categories))?;
    Ok(())
}

/// Centers as a point layer with a `county` column.
pub fn centers_layer(centers: &[(String, Point<f64>)], epsg: u32) -> Result<PointLayer> {
    PointLayer::from_columns(
        centers.iter().map(|(_, p)| *p).collect(),
        vec![Column::new("county".into(), centers.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>())],
        epsg,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> PointLayer {
        PointLayer::from_columns(
            vec![
                Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(100.0, 100.0),
                Point::new(1000.0, 0.0), Point::new(1040.0, 0.0),
            ],
            vec![Column::new("county".into(), &[Some("Pitt"), Some("Pitt"), None, Some("Beaufort"), Some("Beaufort")])],
            2264,
        ).unwrap()
    }

    #[test]
    fn centers_are_mean_coordinates() {
        let centers = county_centers(&layer()).unwrap();
        assert_eq!(centers, vec![
            ("Pitt".to_string(), Point::new(5.0, 0.0)),
            ("Beaufort".to_string(), Point::new(1020.0, 0.0)),
        ]);
    }

    #[test]
    fn categories_follow_quartiles() {
        assert_eq!(distance_category(1.0, 1.0, 2.0, 3.0), "Very Close (0-25%)");
        assert_eq!(distance_category(2.0, 1.0, 2.0, 3.0), "Close (25-50%)");
        assert_eq!(distance_category(2.5, 1.0, 2.0, 3.0), "Far (50-75%)");
        assert_eq!(distance_category(3.5, 1.0, 2.0, 3.0), "Very Far (75-100%)");
    }

    #[test]
    fn distances_and_unknown_county() {
        let mut layer = layer();
        let centers = county_centers(&layer).unwrap();
        add_distance_to_center(&mut layer, &centers).unwrap();

        let distance = layer.data().column("distance_to_center").unwrap().f64().unwrap();
        assert_eq!(distance.get(0), Some(5.0));
        assert_eq!(distance.get(2), None);
        assert_eq!(distance.get(4), Some(20.0));
        assert_eq!(layer.str_column("distance_category").unwrap().get(2), Some("Unknown"));
        // known distances [5, 5, 20, 20]: q25 = 5, q50 = 12.5, q75 = 20
        assert_eq!(layer.str_column("distance_category").unwrap().get(0), Some("Very Close (0-25%)"));
        assert_eq!(layer.str_column("distance_category").unwrap().get(3), Some("Far (50-75%)"));
    }
}
