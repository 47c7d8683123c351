//! Entity partitioning.
//!
//! [`split`] materializes one sub-table per entity in first-appearance order,
//! [`combine`] stacks them back with each partition sorted by time, and
//! [`pivot_wide`] aligns all entities on the union of their timestamps.

use std::collections::{BTreeSet, HashMap};

use polars::prelude::{Column, DataFrame, IdxCa, IdxSize, NamedFrom, Series};
use tracing::debug;
use tsd_common::{column_f64_values, column_keys, column_timestamps, timestamp_column};
use tsd_model::ColumnRoles;

use crate::error::{Result, TransformError, entity_label};

/// The rows of one entity.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Entity id; `None` for the implicit entity of an unkeyed table.
    pub entity: Option<String>,
    pub frame: DataFrame,
}

impl Partition {
    pub fn new(entity: Option<String>, frame: DataFrame) -> Self {
        Self { entity, frame }
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Row indices per entity in first-appearance order.
fn entity_rows(df: &DataFrame, roles: &ColumnRoles) -> Result<Vec<(Option<String>, Vec<usize>)>> {
    let Some(id_column) = roles.id_column() else {
        return Ok(vec![(None, (0..df.height()).collect())]);
    };
    if df.column(id_column).is_err() {
        return Err(TransformError::UnknownColumn {
            column: id_column.to_string(),
        });
    }

    let keys = column_keys(df, id_column)?;
    let null_count = keys.iter().filter(|key| key.is_none()).count();
    if null_count > 0 {
        return Err(TransformError::NullIdentifier {
            column: id_column.to_string(),
            count: null_count,
        });
    }

    let mut groups: Vec<(Option<String>, Vec<usize>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (row, key) in keys.into_iter().enumerate() {
        let Some(key) = key else {
            continue;
        };
        match positions.get(&key) {
            Some(&pos) => groups[pos].1.push(row),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((Some(key), vec![row]));
            }
        }
    }
    Ok(groups)
}

/// Entity ids in first-appearance order (empty for an unkeyed table).
pub fn entity_ids(df: &DataFrame, roles: &ColumnRoles) -> Result<Vec<String>> {
    Ok(entity_rows(df, roles)?
        .into_iter()
        .filter_map(|(entity, _)| entity)
        .collect())
}

fn take_rows(df: &DataFrame, rows: Vec<IdxSize>) -> Result<DataFrame> {
    let idx = IdxCa::from_vec("idx".into(), rows);
    Ok(df.take(&idx)?)
}

/// Split a table into entity partitions, in first-appearance order.
///
/// An unkeyed table yields a single partition holding every row.
pub fn split(df: &DataFrame, roles: &ColumnRoles) -> Result<Vec<Partition>> {
    let groups = entity_rows(df, roles)?;
    if groups.len() == 1 && groups[0].0.is_none() {
        return Ok(vec![Partition::new(None, df.clone())]);
    }

    let mut partitions = Vec::with_capacity(groups.len());
    for (entity, rows) in groups {
        let rows = rows.into_iter().map(|row| row as IdxSize).collect();
        partitions.push(Partition::new(entity, take_rows(df, rows)?));
    }
    debug!(
        rows = df.height(),
        entities = partitions.len(),
        "split table"
    );
    Ok(partitions)
}

/// Stable sort of a frame by its datetime column; missing timestamps last.
pub fn sort_by_datetime(df: &DataFrame, datetime: &str) -> Result<DataFrame> {
    if df.column(datetime).is_err() {
        return Err(TransformError::UnknownColumn {
            column: datetime.to_string(),
        });
    }
    let timestamps = column_timestamps(df, datetime)?;
    let sorted = timestamps.windows(2).all(|pair| match (pair[0], pair[1]) {
        (Some(left), Some(right)) => left <= right,
        (_, None) => true,
        (None, Some(_)) => false,
    });
    if sorted {
        return Ok(df.clone());
    }

    let mut rows: Vec<IdxSize> = (0..df.height()).map(|row| row as IdxSize).collect();
    rows.sort_by_key(|&row| {
        let ts = timestamps[row as usize];
        (ts.is_none(), ts)
    });
    take_rows(df, rows)
}

/// Stack partitions in the given order, each sorted by datetime.
///
/// Every partition must carry the same column set as the first; columns are
/// aligned to the first partition's order.
pub fn combine(partitions: Vec<Partition>, datetime: &str) -> Result<DataFrame> {
    let mut iter = partitions.into_iter();
    let Some(first) = iter.next() else {
        return Ok(DataFrame::empty());
    };

    let columns = first.frame.get_column_names_owned();
    let expected: BTreeSet<&str> = columns.iter().map(|name| name.as_str()).collect();
    let mut combined = sort_by_datetime(&first.frame, datetime)?;

    for partition in iter {
        let names = partition.frame.get_column_names_owned();
        let found: BTreeSet<&str> = names.iter().map(|name| name.as_str()).collect();
        if found != expected {
            return Err(TransformError::shape(
                partition.entity(),
                format!(
                    "columns [{}] differ from [{}]",
                    join_names(&found),
                    join_names(&expected)
                ),
            ));
        }
        let aligned = partition.frame.select(columns.clone())?;
        let sorted = sort_by_datetime(&aligned, datetime)?;
        combined.vstack_mut(&sorted).map_err(|err| {
            TransformError::shape(partition.entity(), format!("cannot stack rows: {err}"))
        })?;
    }

    combined.as_single_chunk_par();
    Ok(combined)
}

fn join_names(names: &BTreeSet<&str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(", ")
}

/// A table pivoted to one row per timestamp and one column per
/// (entity, value column) pair.
#[derive(Debug, Clone)]
pub struct WideTable {
    /// Datetime column followed by the wide value columns, all `Float64`.
    pub frame: DataFrame,
    /// Entities in first-appearance order (empty for an unkeyed table).
    pub entities: Vec<String>,
    /// Source value columns in declaration order.
    pub columns: Vec<String>,
    datetime: String,
}

impl WideTable {
    /// Name of the wide column holding `column` for `entity`.
    pub fn column_name(column: &str, entity: Option<&str>) -> String {
        match entity {
            Some(entity) => format!("{column}_{entity}"),
            None => column.to_string(),
        }
    }

    /// Wide column names for a subset of source columns, id-major.
    pub fn wide_columns(&self, columns: &[String]) -> Vec<String> {
        if self.entities.is_empty() {
            return columns.to_vec();
        }
        self.entities
            .iter()
            .flat_map(|entity| {
                columns
                    .iter()
                    .map(move |column| Self::column_name(column, Some(entity)))
            })
            .collect()
    }

    pub fn datetime(&self) -> &str {
        &self.datetime
    }

    /// Number of timestamps in the union.
    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Pivot a table wide over the union of all observed timestamps.
///
/// `columns` selects the value columns to pivot (default: targets then
/// features). Absent (entity, timestamp) cells are null, never zero.
/// Timestamps must be unique within each entity.
pub fn pivot_wide(
    df: &DataFrame,
    roles: &ColumnRoles,
    columns: Option<&[String]>,
) -> Result<WideTable> {
    let columns: Vec<String> = match columns {
        Some(columns) => columns.to_vec(),
        None => roles.value_columns(),
    };
    for column in &columns {
        if df.column(column).is_err() {
            return Err(TransformError::UnknownColumn {
                column: column.clone(),
            });
        }
    }
    let datetime_dtype = df
        .column(&roles.datetime)
        .map_err(|_| TransformError::UnknownColumn {
            column: roles.datetime.clone(),
        })?
        .dtype()
        .clone();

    let partitions = split(df, roles)?;
    let mut per_partition_ts = Vec::with_capacity(partitions.len());
    let mut union = BTreeSet::new();
    for partition in &partitions {
        let timestamps = column_timestamps(&partition.frame, &roles.datetime)?;
        let mut seen = BTreeSet::new();
        for ts in &timestamps {
            let Some(ts) = ts else {
                return Err(TransformError::shape(
                    partition.entity(),
                    "missing timestamp cannot be aligned",
                ));
            };
            if !seen.insert(*ts) {
                return Err(TransformError::shape(
                    partition.entity(),
                    "duplicate timestamps cannot be pivoted; deduplicate first",
                ));
            }
            union.insert(*ts);
        }
        per_partition_ts.push(timestamps);
    }

    let union: Vec<i64> = union.into_iter().collect();
    let position: HashMap<i64, usize> = union
        .iter()
        .enumerate()
        .map(|(idx, ts)| (*ts, idx))
        .collect();

    let mut wide_columns = Vec::with_capacity(1 + partitions.len() * columns.len());
    wide_columns.push(timestamp_column(
        &roles.datetime,
        union.clone(),
        &datetime_dtype,
    )?);
    let mut owners: HashMap<String, (&str, Option<&str>)> = HashMap::new();
    owners.insert(roles.datetime.clone(), (roles.datetime.as_str(), None));
    for (partition, timestamps) in partitions.iter().zip(&per_partition_ts) {
        for column in &columns {
            let name = WideTable::column_name(column, partition.entity());
            if let Some((other_column, other_entity)) =
                owners.insert(name.clone(), (column.as_str(), partition.entity()))
            {
                return Err(TransformError::shape(
                    partition.entity(),
                    format!(
                        "wide column '{name}' is produced by both ('{column}', {}) and ('{other_column}', {})",
                        entity_label(partition.entity()),
                        entity_label(other_entity)
                    ),
                ));
            }
            let values = column_f64_values(&partition.frame, column)?;
            let mut cells: Vec<Option<f64>> = vec![None; union.len()];
            for (ts, value) in timestamps.iter().zip(values) {
                if let Some(ts) = ts {
                    cells[position[ts]] = value;
                }
            }
            wide_columns.push(Column::from(Series::new(name.into(), cells)));
        }
    }

    let entities = partitions
        .iter()
        .filter_map(|partition| partition.entity.clone())
        .collect::<Vec<_>>();
    debug!(
        timestamps = union.len(),
        entities = entities.len(),
        columns = wide_columns.len() - 1,
        "pivoted table wide"
    );
    Ok(WideTable {
        frame: DataFrame::new(wide_columns)?,
        entities,
        columns,
        datetime: roles.datetime.clone(),
    })
}
