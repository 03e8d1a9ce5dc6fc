//! Typed dataset schemas.
//! Converts parsed frames into record tables, validating every required column.

use crate::data::loader::{DataUnavailable, TableCache};
use crate::data::period::Quarter;
use polars::prelude::*;
use std::path::Path;

/// A record type that can be extracted from one CSV dataset.
pub trait Record: Sized {
    /// Columns that must be present in the source file.
    const REQUIRED_COLUMNS: &'static [&'static str];

    fn extract(columns: &ColumnReader<'_>) -> Result<Vec<Self>, DataUnavailable>;
}

/// Typed rows of one dataset, in file order.
#[derive(Debug, Clone)]
pub struct Table<R> {
    pub columns: Vec<String>,
    pub rows: Vec<R>,
}

/// Load `path` through the cache and validate it against `R`'s schema.
pub fn load_typed<R: Record>(cache: &TableCache, path: &Path) -> Result<Table<R>, DataUnavailable> {
    let frame = cache.load(path)?;
    let reader = ColumnReader::new(&frame, path);

    for column in R::REQUIRED_COLUMNS {
        reader.column(column)?;
    }

    Ok(Table {
        columns: frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows: R::extract(&reader)?,
    })
}

/// Column accessors that report failures as `DataUnavailable`.
pub struct ColumnReader<'a> {
    df: &'a DataFrame,
    path: &'a Path,
}

impl<'a> ColumnReader<'a> {
    pub fn new(df: &'a DataFrame, path: &'a Path) -> Self {
        Self { df, path }
    }

    fn column(&self, name: &str) -> Result<&'a Column, DataUnavailable> {
        self.df
            .column(name)
            .map_err(|_| DataUnavailable::MissingColumn {
                path: self.path.to_path_buf(),
                column: name.to_string(),
            })
    }

    fn invalid(&self, column: &str, index: usize, reason: impl Into<String>) -> DataUnavailable {
        DataUnavailable::InvalidValue {
            path: self.path.to_path_buf(),
            column: column.to_string(),
            // 1-based data row, header excluded
            row: index + 1,
            reason: reason.into(),
        }
    }

    fn cast(&self, name: &str, dtype: &DataType) -> Result<Column, DataUnavailable> {
        self.column(name)?
            .cast(dtype)
            .map_err(|source| DataUnavailable::Parse {
                path: self.path.to_path_buf(),
                source,
            })
    }

    fn optional_strings(&self, name: &str) -> Result<Vec<Option<String>>, DataUnavailable> {
        let casted = self.cast(name, &DataType::String)?;
        let ca = casted.str().map_err(|source| DataUnavailable::Parse {
            path: self.path.to_path_buf(),
            source,
        })?;
        Ok(ca
            .into_iter()
            .map(|v| {
                v.map(|s| s.trim().trim_matches('"').to_string())
                    .filter(|s| !s.is_empty())
            })
            .collect())
    }

    /// Non-empty text cells.
    pub fn text(&self, name: &str) -> Result<Vec<String>, DataUnavailable> {
        self.optional_strings(name)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| self.invalid(name, i, "empty cell")))
            .collect()
    }

    /// Text cells of a column that may be absent from the file.
    pub fn optional_text(&self, name: &str) -> Result<Option<Vec<Option<String>>>, DataUnavailable> {
        if self.df.column(name).is_err() {
            return Ok(None);
        }
        self.optional_strings(name).map(Some)
    }

    pub fn quarters(&self, name: &str) -> Result<Vec<Quarter>, DataUnavailable> {
        self.text(name)?
            .iter()
            .enumerate()
            .map(|(i, s)| s.parse().map_err(|e| self.invalid(name, i, format!("{e}"))))
            .collect()
    }

    /// Finite numbers of any sign.
    pub fn numbers(&self, name: &str) -> Result<Vec<f64>, DataUnavailable> {
        let casted = self.cast(name, &DataType::Float64)?;
        let ca = casted.f64().map_err(|source| DataUnavailable::Parse {
            path: self.path.to_path_buf(),
            source,
        })?;
        ca.into_iter()
            .enumerate()
            .map(|(i, v)| match v {
                Some(x) if x.is_finite() => Ok(x),
                Some(_) => Err(self.invalid(name, i, "not a finite number")),
                None => Err(self.invalid(name, i, "empty or non-numeric cell")),
            })
            .collect()
    }

    /// Finite, non-negative measures (counts, prices, weighted sums).
    pub fn measures(&self, name: &str) -> Result<Vec<f64>, DataUnavailable> {
        let values = self.numbers(name)?;
        if let Some(i) = values.iter().position(|v| *v < 0.0) {
            return Err(self.invalid(name, i, format!("negative measure {}", values[i])));
        }
        Ok(values)
    }
}

/// New mortgage applications per quarter and age bracket (`data_age.csv`).
#[derive(Debug, Clone, PartialEq)]
pub struct LoanAgeRecord {
    pub period: Quarter,
    /// Bracket key such as `30_35`.
    pub age_group: String,
    /// Display label used in the bar race.
    pub age_group_name: String,
    pub count: f64,
    /// count × bracket midpoint age
    pub count_mid_age: f64,
    /// count × bracket lower age
    pub count_lower_age: f64,
    /// count × bracket upper age
    pub count_upper_age: f64,
    pub bar_color: Option<String>,
}

impl Record for LoanAgeRecord {
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "date_fmt",
        "age_group",
        "age_group_name",
        "cnt",
        "cnt_m_age",
        "cnt_l_age",
        "cnt_u_age",
    ];

    fn extract(columns: &ColumnReader<'_>) -> Result<Vec<Self>, DataUnavailable> {
        let periods = columns.quarters("date_fmt")?;
        let groups = columns.text("age_group")?;
        let names = columns.text("age_group_name")?;
        let counts = columns.measures("cnt")?;
        let mid = columns.measures("cnt_m_age")?;
        let lower = columns.measures("cnt_l_age")?;
        let upper = columns.measures("cnt_u_age")?;
        let colors = columns
            .optional_text("barcolor")?
            .unwrap_or_else(|| vec![None; periods.len()]);

        Ok((0..periods.len())
            .map(|i| LoanAgeRecord {
                period: periods[i],
                age_group: groups[i].clone(),
                age_group_name: names[i].clone(),
                count: counts[i],
                count_mid_age: mid[i],
                count_lower_age: lower[i],
                count_upper_age: upper[i],
                bar_color: colors[i].clone(),
            })
            .collect())
    }
}

/// Quarterly average house age and unit price per county (`data_hage_yyyqq.csv`).
#[derive(Debug, Clone, PartialEq)]
pub struct CountyQuarterRecord {
    pub period: Quarter,
    pub county: String,
    pub district: String,
    pub house_age: f64,
    pub unit_price: f64,
    pub transactions: f64,
}

impl Record for CountyQuarterRecord {
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["date", "county", "district", "hage", "price", "cnt"];

    fn extract(columns: &ColumnReader<'_>) -> Result<Vec<Self>, DataUnavailable> {
        let periods = columns.quarters("date")?;
        let counties = columns.text("county")?;
        let districts = columns.text("district")?;
        let ages = columns.measures("hage")?;
        let prices = columns.measures("price")?;
        let counts = columns.measures("cnt")?;

        Ok((0..periods.len())
            .map(|i| CountyQuarterRecord {
                period: periods[i],
                county: counties[i].clone(),
                district: districts[i].clone(),
                house_age: ages[i],
                unit_price: prices[i],
                transactions: counts[i],
            })
            .collect())
    }
}

/// County growth rates minus the national growth rate (`data_hage_versus.csv`).
#[derive(Debug, Clone, PartialEq)]
pub struct CountyGrowthRecord {
    pub county: String,
    pub house_age_diff: f64,
    pub house_age_color: String,
    pub price_diff: f64,
    pub price_color: String,
}

impl Record for CountyGrowthRecord {
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["county", "hage_diff", "hage_color", "price_diff", "price_color"];

    fn extract(columns: &ColumnReader<'_>) -> Result<Vec<Self>, DataUnavailable> {
        let counties = columns.text("county")?;
        let age_diffs = columns.numbers("hage_diff")?;
        let age_colors = columns.text("hage_color")?;
        let price_diffs = columns.numbers("price_diff")?;
        let price_colors = columns.text("price_color")?;

        Ok((0..counties.len())
            .map(|i| CountyGrowthRecord {
                county: counties[i].clone(),
                house_age_diff: age_diffs[i],
                house_age_color: age_colors[i].clone(),
                price_diff: price_diffs[i],
                price_color: price_colors[i].clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const AGE_CSV: &str = "\
date_fmt,age_group,age_group_name,cnt,cnt_m_age,cnt_l_age,cnt_u_age,barcolor
2009-03-31,30_35,30~35,100,3250,3000,3500,\"rgb(239,85,59)\"
2009-03-31,35_40,35~40,94,3525,3290,3760,
";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_loan_age_records() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data_age.csv", AGE_CSV);
        let cache = TableCache::new();

        let table: Table<LoanAgeRecord> = load_typed(&cache, &path).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns.len(), 8);
        let first = &table.rows[0];
        assert_eq!(first.period, Quarter::new(2009, 1).unwrap());
        assert_eq!(first.age_group, "30_35");
        assert_eq!(first.count, 100.0);
        assert_eq!(first.bar_color.as_deref(), Some("rgb(239,85,59)"));
        assert_eq!(table.rows[1].bar_color, None);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data_age.csv", "date_fmt,age_group,cnt\n2009Q1,30_35,1\n");
        let cache = TableCache::new();

        let err = load_typed::<LoanAgeRecord>(&cache, &path).unwrap_err();
        match err {
            DataUnavailable::MissingColumn { column, .. } => assert_eq!(column, "age_group_name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_measure_is_rejected_with_row() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "data_hage_yyyqq.csv",
            "date,county,district,hage,price,cnt\n10001,臺北市,北部區域,25.1,52.27,1200\n10001,新竹縣,北部區域,7.45,15.2,-3\n",
        );
        let cache = TableCache::new();

        let err = load_typed::<CountyQuarterRecord>(&cache, &path).unwrap_err();
        match err {
            DataUnavailable::InvalidValue { column, row, .. } => {
                assert_eq!(column, "cnt");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparsable_period_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "data_hage_yyyqq.csv",
            "date,county,district,hage,price,cnt\nsoon,臺北市,北部區域,25.1,52.27,1200\n",
        );
        let cache = TableCache::new();
        assert!(matches!(
            load_typed::<CountyQuarterRecord>(&cache, &path),
            Err(DataUnavailable::InvalidValue { row: 1, .. })
        ));
    }

    #[test]
    fn growth_diffs_may_be_negative() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "data_hage_versus.csv",
            "county,hage_diff,hage_color,price_diff,price_color\n臺北市,12.5,red,-25.0,blue\n",
        );
        let cache = TableCache::new();

        let table = load_typed::<CountyGrowthRecord>(&cache, &path).unwrap();
        assert_eq!(table.rows[0].price_diff, -25.0);
        assert_eq!(table.rows[0].price_color, "blue");
    }
}
