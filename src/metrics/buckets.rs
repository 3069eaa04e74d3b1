use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::{info, warn};
use polars::prelude::*;

use crate::layer::PointLayer;

pub const UNKNOWN: &str = "Unknown";

const DATE_FORMATS: [&str; 5] = ["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"];

pub fn age_group(age: i32) -> &'static str {
    if age < 30 {
        "Young (18-29)"
    } else if age < 45 {
        "Young Adult (30-44)"
    } else if age < 65 {
        "Middle Age (45-64)"
    } else {
        "Senior (65+)"
    }
}

pub fn registration_period(year: i32) -> &'static str {
    if year < 2000 {
        "Before 2000"
    } else if year < 2010 {
        "2000-2009"
    } else if year < 2020 {
        "2010-2019"
    } else {
        "2020-Present"
    }
}

/// Parse a birth year such as `1980` or `1980.0`.
pub fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    text.parse::<i32>().ok()
        .or_else(|| text.parse::<f64>().ok().filter(|y| y.fract() == 0.0 && y.is_finite()).map(|y| y as i32))
}

/// Year of a registration date in one of the common layouts.
pub fn parse_registration_year(text: &str) -> Option<i32> {
    let text = text.trim();
    DATE_FORMATS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| DATETIME_FORMATS.iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|dt| dt.date()))
        .map(|date| date.year())
}

fn fill_unknown(layer: &mut PointLayer, name: &str) -> Result<()> {
    let rows = layer.len();
    layer.set_column(Column::new(name.into(), vec![UNKNOWN; rows]))
}

/// Add `age` and `age_group` from a birth-year column.
/// A missing column leaves every voter "Unknown".
pub fn add_age_groups(layer: &mut PointLayer, birth_year: &str, reference_year: i32) -> Result<()> {
    if !layer.has_column(birth_year) {
        warn!("Birth year column {birth_year:?} not available; age groups set to {UNKNOWN}");
        return fill_unknown(layer, "age_group");
    }

    let ages = layer.str_column(birth_year)?.into_iter()
        .map(|year| year.and_then(parse_year).map(|year| reference_year - year))
        .collect::<Vec<Option<i32>>>();
    let groups = ages.iter()
        .map(|age| age.map_or(UNKNOWN, age_group))
        .collect::<Vec<_>>();
    info!("Ages computed for {} of {} voters", ages.iter().flatten().count(), ages.len());

    layer.set_column(Column::new("age".into(), ages))?;
    layer.set_column(Column::new("age_group".into(), groups))
}

/// Add `registration_year` and `registration_period` from a registration-date column.
/// A missing column leaves every voter "Unknown".
pub fn add_registration_periods(layer: &mut PointLayer, registration_date: &str) -> Result<()> {
    if !layer.has_column(registration_date) {
        warn!("Registration date column {registration_date:?} not available; periods set to {UNKNOWN}");
        return fill_unknown(layer, "registration_period");
    }

    let years = layer.str_column(registration_date)?.into_iter()
        .map(|date| date.and_then(parse_registration_year))
        .collect::<Vec<Option<i32>>>();
    let periods = years.iter()
        .map(|year| year.map_or(UNKNOWN, registration_period))
        .collect::<Vec<_>>();
    let recent = years.iter().flatten().filter(|&&y| y >= 2020).count();
    info!("Recent registrants (2020+): {recent}");

    layer.set_column(Column::new("registration_year".into(), years))?;
    layer.set_column(Column::new("registration_period".into(), periods))
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;

    #[test]
    fn age_group_boundaries() {
        assert_eq!(age_group(18), "Young (18-29)");
        assert_eq!(age_group(29), "Young (18-29)");
        assert_eq!(age_group(30), "Young Adult (30-44)");
        assert_eq!(age_group(44), "Young Adult (30-44)");
        assert_eq!(age_group(45), "Middle Age (45-64)");
        assert_eq!(age_group(65), "Senior (65+)");
    }

    #[test]
    fn registration_period_boundaries() {
        assert_eq!(registration_period(1999), "Before 2000");
        assert_eq!(registration_period(2000), "2000-2009");
        assert_eq!(registration_period(2019), "2010-2019");
        assert_eq!(registration_period(2020), "2020-Present");
    }

    #[test]
    fn date_layouts() {
        assert_eq!(parse_registration_year("03/15/2012"), Some(2012));
        assert_eq!(parse_registration_year("2021-11-02"), Some(2021));
        assert_eq!(parse_registration_year("1998-01-01 00:00:00"), Some(1998));
        assert_eq!(parse_registration_year("not a date"), None);
        assert_eq!(parse_year(" 1980 "), Some(1980));
        assert_eq!(parse_year("1980.0"), Some(1980));
        assert_eq!(parse_year(""), None);
    }

    fn layer() -> PointLayer {
        PointLayer::from_columns(
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)],
            vec![
                Column::new("birth_year".into(), &[Some("1990"), Some("abc"), None]),
                Column::new("registr_dt".into(), &[Some("01/05/2008"), Some(""), Some("2022-06-30")]),
            ],
            2264,
        ).unwrap()
    }

    #[test]
    fn unparseable_values_are_unknown() {
        let mut layer = layer();
        add_age_groups(&mut layer, "birth_year", 2025).unwrap();
        add_registration_periods(&mut layer, "registr_dt").unwrap();

        let groups = layer.str_column("age_group").unwrap();
        assert_eq!(groups.into_iter().collect::<Vec<_>>(), vec![Some("Young Adult (30-44)"), Some(UNKNOWN), Some(UNKNOWN)]);
        assert_eq!(layer.data().column("age").unwrap().i32().unwrap().get(0), Some(35));

        let periods = layer.str_column("registration_period").unwrap();
        assert_eq!(periods.into_iter().collect::<Vec<_>>(), vec![Some("2000-2009"), Some(UNKNOWN), Some("2020-Present")]);
    }

    #[test]
    fn missing_columns_fill_unknown() {
        let mut layer = layer();
        add_age_groups(&mut layer, "dob", 2025).unwrap();
        add_registration_periods(&mut layer, "reg_date").unwrap();
        assert!(layer.str_column("age_group").unwrap().into_iter().all(|g| g == Some(UNKNOWN)));
        assert!(layer.str_column("registration_period").unwrap().into_iter().all(|p| p == Some(UNKNOWN)));
        assert!(!layer.has_column("age"));
    }
}
