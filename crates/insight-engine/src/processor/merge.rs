use crate::config::JoinHow;
use crate::error::{Result, ResultExt};
use crate::utils::require_column;
use polars::prelude::*;

/// Suffix for right-hand columns whose names clash with the left side.
pub const RIGHT_SUFFIX: &str = "_right";

fn join_args(how: JoinHow) -> JoinArgs {
    let args = match how {
        JoinHow::Inner => JoinArgs::new(JoinType::Inner),
        JoinHow::Left => JoinArgs::new(JoinType::Left),
        JoinHow::Right => JoinArgs::new(JoinType::Right),
        JoinHow::Outer => {
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns)
        }
    };
    args.with_suffix(Some(RIGHT_SUFFIX.into()))
}

/// Join two datasets on a shared key column.
///
/// Keys are not required to be unique; a key matching several right-hand rows
/// produces one output row per match.
pub fn join_datasets(left: &DataFrame, right: &DataFrame, on: &str, how: JoinHow) -> Result<DataFrame> {
    require_column(left, on)?;
    require_column(right, on)?;

    left.clone()
        .lazy()
        .join(right.clone().lazy(), [col(on)], [col(on)], join_args(how))
        .collect()
        .context(format!("Failed to join on '{}'", on))
}
