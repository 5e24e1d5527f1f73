use crate::batch::chunk::Chunk;
use crate::domain::base_arg::{BaseArgPosition, BaseArgs};
use crate::domain::batch_spec::BatchSpec;
use crate::domain::sql_value::SqlValue;

const VALUE_GROUP_DELIMITER: &str = ",";

/// A chunk turned into SQL text plus its bound arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    pub query: String,
    pub args: Vec<SqlValue>,
}

/// Renders `chunk` against `spec`, or `None` when the chunk has no rows.
///
/// Arguments are laid out as `Before` base args, then every row in order, then
/// `After` base args.
pub fn render_chunk(
    spec: &BatchSpec,
    chunk: &Chunk,
    base_args: &BaseArgs,
) -> Option<RenderedStatement> {
    if chunk.is_empty() {
        return None;
    }

    let mut args = Vec::with_capacity(chunk.len() * spec.cols() + base_args.len());
    args.extend(base_args.at(BaseArgPosition::Before).cloned());
    for row in chunk.rows() {
        args.extend(row.iter().cloned());
    }
    args.extend(base_args.at(BaseArgPosition::After).cloned());

    let value_groups = vec![spec.value_template(); chunk.len()].join(VALUE_GROUP_DELIMITER);

    Some(RenderedStatement {
        query: spec.render_query(&value_groups),
        args,
    })
}
