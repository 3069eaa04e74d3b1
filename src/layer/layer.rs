use ahash::AHashMap;
use anyhow::{anyhow, ensure, Context, Result};
use geo::Point;
use polars::prelude::*;

use crate::common;

/// A set of points with one attribute row per point, all in one CRS.
///
/// Pipeline stages append columns; rows are only ever removed by [`PointLayer::filter`].
#[derive(Debug, Clone)]
pub struct PointLayer {
    pub(crate) points: Vec<Point<f64>>,
    pub(crate) data: DataFrame,
    pub(crate) epsg: u32,
}

impl PointLayer {
    pub fn new(points: Vec<Point<f64>>, data: DataFrame, epsg: u32) -> Result<Self> {
        ensure!(
            data.width() == 0 || data.height() == points.len(),
            "[PointLayer::new] attribute rows ({}) do not match point count ({})",
            data.height(), points.len()
        );
        Ok(Self { points, data, epsg })
    }

    /// A layer with no attributes besides the ones given.
    pub fn from_columns(points: Vec<Point<f64>>, columns: Vec<Column>, epsg: u32) -> Result<Self> {
        Self::new(points, DataFrame::new(columns)?, epsg)
    }

    #[inline] pub fn len(&self) -> usize { self.points.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.points.is_empty() }

    #[inline] pub fn points(&self) -> &[Point<f64>] { &self.points }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn epsg(&self) -> u32 { self.epsg }

    #[inline]
    pub fn has_column(&self, name: &str) -> bool { self.data.column(name).is_ok() }

    /// Borrow a string column.
    pub fn str_column(&self, name: &str) -> Result<&StringChunked> {
        self.data.column(name)
            .with_context(|| format!("[PointLayer] missing column {name:?}"))?
            .str()
            .with_context(|| format!("[PointLayer] column {name:?} is not a string column"))
    }

    /// Add a column, replacing any existing column of the same name.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        ensure!(
            column.len() == self.len(),
            "[PointLayer::set_column] column {:?} has {} rows, expected {}",
            column.name(), column.len(), self.len()
        );
        self.data.with_column(column)?;
        Ok(())
    }

    /// Keep the rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        ensure!(mask.len() == self.len(), "[PointLayer::filter] mask length mismatch");
        let points = self.points.iter().zip(mask)
            .filter_map(|(point, &keep)| keep.then_some(*point))
            .collect::<Vec<_>>();
        let data = if self.data.width() == 0 {
            self.data.clone()
        } else {
            self.data.filter(&BooleanChunked::from_slice("mask".into(), mask))?
        };
        Self::new(points, data, self.epsg)
    }

    /// Reproject points into `epsg`.
    pub fn to_crs(&mut self, epsg: u32) -> Result<()> {
        if self.epsg == epsg { return Ok(()) }
        common::reproject_points(&mut self.points, self.epsg, epsg)
            .with_context(|| format!("[PointLayer::to_crs] EPSG:{} -> EPSG:{epsg}", self.epsg))?;
        self.epsg = epsg;
        Ok(())
    }

    /// The attribute table with `x` and `y` columns taken from the current points.
    pub fn data_with_xy(&self) -> Result<DataFrame> {
        let mut df = self.data.clone();
        df.with_column(Column::new("x".into(), self.points.iter().map(|p| p.x()).collect::<Vec<_>>()))?;
        df.with_column(Column::new("y".into(), self.points.iter().map(|p| p.y()).collect::<Vec<_>>()))?;
        Ok(df)
    }

    /// Stack layers row-wise. Columns are the union of all inputs in first-seen
    /// order; rows from a layer lacking a column get nulls. Every layer is
    /// reprojected into the first layer's CRS.
    pub fn concat(layers: Vec<PointLayer>) -> Result<Self> {
        let epsg = layers.first()
            .map(|layer| layer.epsg)
            .ok_or_else(|| anyhow!("[PointLayer::concat] nothing to concatenate"))?;

        let mut names: Vec<String> = Vec::new();
        let mut dtypes: AHashMap<String, DataType> = AHashMap::new();
        for layer in &layers {
            for column in layer.data.get_columns() {
                let name = column.name().to_string();
                if !dtypes.contains_key(&name) {
                    dtypes.insert(name.clone(), column.dtype().clone());
                    names.push(name);
                }
            }
        }

        let mut points = Vec::new();
        let mut data: Option<DataFrame> = None;
        for mut layer in layers {
            layer.to_crs(epsg)?;
            let height = layer.len();
            let mut df = layer.data;
            for name in &names {
                if df.column(name).is_err() {
                    df.with_column(Column::full_null(name.as_str().into(), height, &dtypes[name]))?;
                }
            }
            let df = df.select(names.iter().map(String::as_str))?;
            match data.as_mut() {
                Some(acc) => { acc.vstack_mut(&df)?; }
                None => data = Some(df),
            }
            points.extend(layer.points);
        }

        Self::new(points, data.unwrap_or_default(), epsg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(names: &[&str], party: &[&str], epsg: u32) -> PointLayer {
        let points = (0..names.len()).map(|i| Point::new(i as f64, 0.0)).collect();
        PointLayer::from_columns(points, vec![
            Column::new("name".into(), names),
            Column::new("party_cd".into(), party),
        ], epsg).unwrap()
    }

    #[test]
    fn row_count_must_match() {
        let data = DataFrame::new(vec![Column::new("a".into(), &["x", "y"])]).unwrap();
        assert!(PointLayer::new(vec![Point::new(0.0, 0.0)], data, 2264).is_err());
    }

    #[test]
    fn filter_keeps_points_and_rows_aligned() {
        let l = layer(&["a", "b", "c"], &["DEM", "REP", "UNA"], 2264);
        let kept = l.filter(&[true, false, true]).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.points()[1], Point::new(2.0, 0.0));
        assert_eq!(kept.str_column("name").unwrap().get(1), Some("c"));
    }

    #[test]
    fn set_column_replaces_existing() {
        let mut l = layer(&["a", "b"], &["DEM", "REP"], 2264);
        l.set_column(Column::new("party_cd".into(), &["UNA", "UNA"])).unwrap();
        assert_eq!(l.str_column("party_cd").unwrap().get(0), Some("UNA"));
        assert_eq!(l.data().width(), 2);
        assert!(l.set_column(Column::new("short".into(), &["x"])).is_err());
    }

    #[test]
    fn concat_unions_columns_with_nulls() {
        let a = layer(&["a"], &["DEM"], 2264);
        let mut b = layer(&["b", "c"], &["REP", "UNA"], 2264);
        b.set_column(Column::new("PARVAL".into(), &[Some(1.0), None])).unwrap();

        let combined = PointLayer::concat(vec![a, b]).unwrap();
        assert_eq!(combined.len(), 3);
        let parval = combined.data().column("PARVAL").unwrap().f64().unwrap();
        assert_eq!(parval.get(0), None);
        assert_eq!(parval.get(1), Some(1.0));
        assert_eq!(combined.str_column("name").unwrap().get(2), Some("c"));
        assert!(PointLayer::concat(Vec::new()).is_err());
    }

    #[test]
    fn xy_columns_follow_points() {
        let l = layer(&["a", "b"], &["DEM", "REP"], 2264);
        let df = l.data_with_xy().unwrap();
        assert_eq!(df.column("x").unwrap().f64().unwrap().get(1), Some(1.0));
        assert_eq!(df.column("y").unwrap().f64().unwrap().get(1), Some(0.0));
    }
}
