use crate::domain::sql_value::SqlValue;

/// Where a base argument lands relative to the row values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseArgPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseArg {
    pub value: SqlValue,
    pub position: BaseArgPosition,
}

/// Base arguments in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseArgs {
    args: Vec<BaseArg>,
}

impl BaseArgs {
    pub fn push(&mut self, value: SqlValue, position: BaseArgPosition) {
        self.args.push(BaseArg { value, position });
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn at(&self, position: BaseArgPosition) -> impl Iterator<Item = &SqlValue> + '_ {
        self.args
            .iter()
            .filter(move |arg| arg.position == position)
            .map(|arg| &arg.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_keeps_registration_order_per_position() {
        let mut args = BaseArgs::default();
        args.push(SqlValue::Integer(1), BaseArgPosition::After);
        args.push(SqlValue::Integer(2), BaseArgPosition::Before);
        args.push(SqlValue::Integer(3), BaseArgPosition::After);
        args.push(SqlValue::Integer(4), BaseArgPosition::Before);

        let before = args
            .at(BaseArgPosition::Before)
            .cloned()
            .collect::<Vec<_>>();
        let after = args.at(BaseArgPosition::After).cloned().collect::<Vec<_>>();

        assert_eq!(before, vec![SqlValue::Integer(2), SqlValue::Integer(4)]);
        assert_eq!(after, vec![SqlValue::Integer(1), SqlValue::Integer(3)]);
        assert_eq!(args.len(), 4);
    }
}
