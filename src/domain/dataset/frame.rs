//! Date-indexed table of named, possibly missing numeric columns.

use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Rows are dates in ascending order; every column has one value per row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Frame {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Frame {
            dates,
            columns: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Append a column, replacing any column with the same name. Values
    /// beyond the row count are ignored; missing ones are `None`.
    pub fn push(&mut self, name: impl Into<String>, mut values: Vec<Option<f64>>) {
        values.resize(self.dates.len(), None);
        let name = name.into();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column { name, values }),
        }
    }

    pub fn extend(&mut self, other: Frame) {
        for col in other.columns {
            self.push(col.name, col.values);
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        for col in &mut self.columns {
            col.name = format!("{prefix}{}", col.name);
        }
        self
    }

    /// Rows whose date appears in both frames, with the columns of both.
    pub fn inner_join(&self, other: &Frame) -> Frame {
        let index: HashMap<NaiveDate, usize> = other
            .dates
            .iter()
            .enumerate()
            .map(|(i, d)| (*d, i))
            .collect();
        let pairs: Vec<(usize, usize)> = self
            .dates
            .iter()
            .enumerate()
            .filter_map(|(i, d)| index.get(d).map(|&j| (i, j)))
            .collect();

        let mut joined = Frame::new(pairs.iter().map(|&(i, _)| self.dates[i]).collect());
        for col in &self.columns {
            joined.push(
                col.name.clone(),
                pairs.iter().map(|&(i, _)| col.values[i]).collect(),
            );
        }
        for col in &other.columns {
            joined.push(
                col.name.clone(),
                pairs.iter().map(|&(_, j)| col.values[j]).collect(),
            );
        }
        joined
    }

    /// Keep only the named columns that exist, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Frame {
        let mut out = Frame::new(self.dates.clone());
        for name in names {
            if let Some(values) = self.get(name.as_ref()) {
                out.push(name.as_ref(), values.to_vec());
            }
        }
        out
    }

    pub fn drop_all_missing_columns(&mut self) {
        self.columns
            .retain(|c| c.values.iter().any(Option::is_some));
    }

    /// Drop every row that has a missing value in any column.
    pub fn drop_incomplete_rows(&mut self) {
        let keep: Vec<bool> = (0..self.dates.len())
            .map(|i| self.columns.iter().all(|c| c.values[i].is_some()))
            .collect();
        let mut flags = keep.iter();
        self.dates.retain(|_| flags.next().copied().unwrap_or(false));
        for col in &mut self.columns {
            let mut flags = keep.iter();
            col.values.retain(|_| flags.next().copied().unwrap_or(false));
        }
    }

    /// Row `i` as values in column order; `None` when out of range.
    pub fn row(&self, i: usize) -> Option<(NaiveDate, Vec<Option<f64>>)> {
        let date = *self.dates.get(i)?;
        Some((date, self.columns.iter().map(|c| c.values[i]).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn inner_join_matches_dates() {
        let mut left = Frame::new(vec![day(1), day(2), day(3)]);
        left.push("a", vec![Some(1.0), Some(2.0), Some(3.0)]);
        let mut right = Frame::new(vec![day(2), day(3), day(4)]);
        right.push("b", vec![Some(20.0), Some(30.0), Some(40.0)]);

        let joined = left.inner_join(&right);
        assert_eq!(joined.dates(), &[day(2), day(3)]);
        assert_eq!(joined.get("a").unwrap(), &[Some(2.0), Some(3.0)]);
        assert_eq!(joined.get("b").unwrap(), &[Some(20.0), Some(30.0)]);
    }

    #[test]
    fn drops_empty_columns_then_incomplete_rows() {
        let mut frame = Frame::new(vec![day(1), day(2), day(3)]);
        frame.push("a", vec![None, Some(2.0), Some(3.0)]);
        frame.push("b", vec![None, None, None]);
        frame.push("c", vec![Some(1.0), Some(1.0), None]);

        frame.drop_all_missing_columns();
        assert_eq!(frame.column_names(), vec!["a", "c"]);

        frame.drop_incomplete_rows();
        assert_eq!(frame.dates(), &[day(2)]);
        assert_eq!(frame.row(0).unwrap().1, vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn select_skips_unknown_names() {
        let mut frame = Frame::new(vec![day(1)]);
        frame.push("a", vec![Some(1.0)]);
        frame.push("b", vec![Some(2.0)]);
        let picked = frame.select(&["b", "zzz", "a"]);
        assert_eq!(picked.column_names(), vec!["b", "a"]);
    }

    #[test]
    fn push_pads_short_columns() {
        let mut frame = Frame::new(vec![day(1), day(2)]);
        frame.push("a", vec![Some(1.0)]);
        assert_eq!(frame.get("a").unwrap(), &[Some(1.0), None]);
    }
}
