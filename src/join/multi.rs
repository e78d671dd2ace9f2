//! Left-deep multi-table join.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use tracing::info;

use crate::io::{suffixed_path, IoError};
use crate::schema::{FieldKind, Relation, SchemaError, TableTag};
use crate::stats::Statistics;

use super::bnlj::BlockNestedLoopsJoin;
use super::error::JoinError;

/// One equi-join condition between two tables of a multi-table plan,
/// referencing tables by position: `0.partkey = 1.partkey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    /// Position of the left table in the plan.
    pub left_table: usize,
    /// Key field on the left table.
    pub left_field: String,
    /// Position of the right table in the plan.
    pub right_table: usize,
    /// Key field on the right table.
    pub right_field: String,
}

impl JoinCondition {
    /// Parses a semicolon-separated condition list:
    /// `"0.partkey=1.partkey;1.suppkey=2.suppkey"`.
    pub fn parse_list(text: &str) -> Result<Vec<JoinCondition>, JoinError> {
        text.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

fn endpoint(text: &str) -> Result<(usize, String), JoinError> {
    let (index, field) = text
        .trim()
        .split_once('.')
        .ok_or_else(|| JoinError::InvalidPlan(format!("expected IDX.FIELD, got '{}'", text)))?;
    let index = index
        .parse::<usize>()
        .map_err(|_| JoinError::InvalidPlan(format!("'{}' is not a table index", index)))?;
    Ok((index, field.to_string()))
}

impl FromStr for JoinCondition {
    type Err = JoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, right) = s.split_once('=').ok_or_else(|| {
            JoinError::InvalidPlan(format!("condition '{}' is missing '='", s))
        })?;
        let (left_table, left_field) = endpoint(left)?;
        let (right_table, right_field) = endpoint(right)?;
        Ok(JoinCondition {
            left_table,
            left_field,
            right_table,
            right_field,
        })
    }
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T{}.{} = T{}.{}",
            self.left_table, self.left_field, self.right_table, self.right_field
        )
    }
}

/// Left-deep join over three or more tables:
/// `((T0 ⋈ T1) ⋈ T2) ⋈ …`, one condition per adjacent pair.
///
/// Each step is a block nested loops join between the accumulated
/// intermediate result and the next base table. Intermediate results are
/// written to `<output>.stage<n>` files and removed as the next step
/// consumes them; the final step writes `output` directly.
///
/// Field references on the intermediate side are resolved positionally: the
/// intermediate relation is the concatenation of the base relations joined
/// so far, so `T1.suppkey` maps to offset-of-T1 plus `suppkey`'s position
/// within T1.
pub struct MultiTableJoin {
    tables: Vec<(PathBuf, TableTag)>,
    conditions: Vec<JoinCondition>,
    output: PathBuf,
    buffer_size: usize,
    page_size: usize,
}

impl MultiTableJoin {
    /// Configures a left-deep plan.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::InvalidPlan`] unless there are at least two
    /// tables, exactly `tables - 1` conditions, and every condition's
    /// step-`i` entry links table `i` to an earlier table. Key fields must
    /// be declared integral.
    pub fn new(
        tables: Vec<(PathBuf, TableTag)>,
        conditions: Vec<JoinCondition>,
        output: impl Into<PathBuf>,
        buffer_size: usize,
        page_size: usize,
    ) -> Result<Self, JoinError> {
        if tables.len() < 2 {
            return Err(JoinError::InvalidPlan(format!(
                "at least 2 tables are required, got {}",
                tables.len()
            )));
        }
        if conditions.len() != tables.len() - 1 {
            return Err(JoinError::InvalidPlan(format!(
                "{} tables need {} join conditions, got {}",
                tables.len(),
                tables.len() - 1,
                conditions.len()
            )));
        }
        if buffer_size < 2 {
            return Err(JoinError::BufferTooSmall {
                actual: buffer_size,
            });
        }

        let plan = Self {
            tables,
            conditions,
            output: output.into(),
            buffer_size,
            page_size,
        };
        // Resolve every step's key fields now so a bad plan fails before
        // any file is touched.
        for step in 1..plan.tables.len() {
            plan.resolve_step(step)?;
        }
        Ok(plan)
    }

    /// Resolves the condition for joining table `step` onto the
    /// intermediate result of tables `0..step`.
    ///
    /// Returns `(left_key_index, right_key_index)` where the left index is
    /// positional within the concatenated intermediate relation.
    fn resolve_step(&self, step: usize) -> Result<(usize, usize), JoinError> {
        let condition = &self.conditions[step - 1];

        let (left_table, left_field, right_field) = if condition.right_table == step
            && condition.left_table < step
        {
            (condition.left_table, &condition.left_field, &condition.right_field)
        } else if condition.left_table == step && condition.right_table < step {
            (condition.right_table, &condition.right_field, &condition.left_field)
        } else {
            return Err(JoinError::InvalidPlan(format!(
                "condition {} must link table {} to an earlier table",
                condition, step
            )));
        };

        let left_relation = Relation::from_tag(self.tables[left_table].1);
        let right_relation = Relation::from_tag(self.tables[step].1);

        let offset: usize = self.tables[..left_table]
            .iter()
            .map(|(_, tag)| Relation::from_tag(*tag).field_count())
            .sum();
        let left_index = offset + resolve_field(&left_relation, left_field)?;
        let right_index = resolve_field(&right_relation, right_field)?;

        Ok((left_index, right_index))
    }

    /// Runs the plan, writing the final join result to the output file.
    pub fn execute(&self, stats: &Statistics) -> Result<(), JoinError> {
        let start = Instant::now();

        info!(tables = self.tables.len(), "left-deep multi-table join");
        for (i, (path, tag)) in self.tables.iter().enumerate() {
            info!("  [{}] {} ({})", i, tag, path.display());
        }
        for condition in &self.conditions {
            info!("  on {}", condition);
        }

        let last_step = self.tables.len() - 1;
        let mut current_path = self.tables[0].0.clone();
        let mut current_relation = Relation::from_tag(self.tables[0].1);
        let mut current_is_temp = false;

        for step in 1..=last_step {
            let (left_index, right_index) = self.resolve_step(step)?;
            let right_relation = Relation::from_tag(self.tables[step].1);

            let step_output = if step == last_step {
                self.output.clone()
            } else {
                suffixed_path(&self.output, &format!(".stage{}", step))
            };

            info!(step, output = %step_output.display(), "join step");
            BlockNestedLoopsJoin::with_key_indices(
                &current_path,
                &self.tables[step].0,
                &step_output,
                current_relation.clone(),
                right_relation.clone(),
                left_index,
                right_index,
                self.buffer_size,
                self.page_size,
            )?
            .execute(stats)?;

            if current_is_temp {
                fs::remove_file(&current_path).map_err(IoError::from)?;
            }
            current_relation = current_relation.join(&right_relation);
            current_path = step_output;
            current_is_temp = step < last_step;
        }

        stats.set_elapsed_seconds(start.elapsed().as_secs_f64());
        stats.set_memory_usage((self.buffer_size * self.page_size) as u64);
        Ok(())
    }
}

fn resolve_field(relation: &Relation, field: &str) -> Result<usize, JoinError> {
    let index = relation.field_index(field)?;
    if relation.field_kind(index) != FieldKind::Int {
        return Err(SchemaError::NotIntegral {
            field: field.to_string(),
            kind: relation.field_kind(index),
        }
        .into());
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_parsing() {
        let condition: JoinCondition = "0.partkey=1.partkey".parse().unwrap();
        assert_eq!(condition.left_table, 0);
        assert_eq!(condition.left_field, "partkey");
        assert_eq!(condition.right_table, 1);
        assert_eq!(condition.right_field, "partkey");
    }

    #[test]
    fn test_condition_list_parsing() {
        let conditions =
            JoinCondition::parse_list("0.partkey=1.partkey;1.suppkey=2.suppkey").unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[1].right_field, "suppkey");
    }

    #[test]
    fn test_condition_syntax_errors() {
        assert!(matches!(
            "0.partkey-1.partkey".parse::<JoinCondition>(),
            Err(JoinError::InvalidPlan(_))
        ));
        assert!(matches!(
            "partkey=1.partkey".parse::<JoinCondition>(),
            Err(JoinError::InvalidPlan(_))
        ));
        assert!(matches!(
            "x.partkey=1.partkey".parse::<JoinCondition>(),
            Err(JoinError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_plan_validation() {
        let tables = vec![
            (PathBuf::from("part.dat"), TableTag::Part),
            (PathBuf::from("partsupp.dat"), TableTag::PartSupp),
            (PathBuf::from("supplier.dat"), TableTag::Supplier),
        ];

        // Too few conditions.
        let conditions = JoinCondition::parse_list("0.partkey=1.partkey").unwrap();
        assert!(matches!(
            MultiTableJoin::new(tables.clone(), conditions, "out.dat", 4, 4096),
            Err(JoinError::InvalidPlan(_))
        ));

        // A condition that does not link step 2 to an earlier table.
        let conditions =
            JoinCondition::parse_list("0.partkey=1.partkey;0.partkey=1.suppkey").unwrap();
        assert!(matches!(
            MultiTableJoin::new(tables.clone(), conditions, "out.dat", 4, 4096),
            Err(JoinError::InvalidPlan(_))
        ));

        // A valid plan resolves.
        let conditions =
            JoinCondition::parse_list("0.partkey=1.partkey;1.suppkey=2.suppkey").unwrap();
        assert!(MultiTableJoin::new(tables, conditions, "out.dat", 4, 4096).is_ok());
    }

    #[test]
    fn test_reversed_condition_is_oriented() {
        let tables = vec![
            (PathBuf::from("part.dat"), TableTag::Part),
            (PathBuf::from("partsupp.dat"), TableTag::PartSupp),
        ];
        let conditions = JoinCondition::parse_list("1.partkey=0.partkey").unwrap();
        let plan = MultiTableJoin::new(tables, conditions, "out.dat", 4, 4096).unwrap();

        let (left, right) = plan.resolve_step(1).unwrap();
        assert_eq!(left, 0); // PART.partkey
        assert_eq!(right, 0); // PARTSUPP.partkey
    }

    #[test]
    fn test_intermediate_key_offsets() {
        let tables = vec![
            (PathBuf::from("part.dat"), TableTag::Part),
            (PathBuf::from("partsupp.dat"), TableTag::PartSupp),
            (PathBuf::from("supplier.dat"), TableTag::Supplier),
        ];
        let conditions =
            JoinCondition::parse_list("0.partkey=1.partkey;1.suppkey=2.suppkey").unwrap();
        let plan = MultiTableJoin::new(tables, conditions, "out.dat", 4, 4096).unwrap();

        // Step 2 joins on T1.suppkey: PART has 9 fields, suppkey is field 1
        // of PARTSUPP, so position 10 of the intermediate result.
        let (left, right) = plan.resolve_step(2).unwrap();
        assert_eq!(left, 10);
        assert_eq!(right, 0); // SUPPLIER.suppkey
    }
}
