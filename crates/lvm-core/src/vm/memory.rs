//! VM Memory Model
//!
//! Parameter slots and saved call frames. Slots are index-based and assigned
//! 0..n-1 in declaration order by the code generator.

use crate::error::{LvmError, LvmResult};
use super::value::Value;

/// Parameters of a single invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<Value>,
}

impl Params {
    pub fn new(values: Vec<Value>) -> Self {
        Params { values }
    }

    pub fn load(&self, index: usize) -> LvmResult<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or(LvmError::InvalidParamAccess(index))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Saved caller context, pushed on CALL and restored on RETURN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub return_ip: usize,
    pub params: Params,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_slot_is_an_error() {
        let params = Params::new(vec![Value::Integer(4)]);
        assert_eq!(params.load(0), Ok(Value::Integer(4)));
        assert_eq!(params.load(1), Err(LvmError::InvalidParamAccess(1)));
        assert!(Params::default().is_empty());
    }
}
