//! 错误类型

use thiserror::Error;

use crate::cmd::ParseError;
use crate::fabric::{InputId, InvariantViolation, PortId};
use crate::solver::UnsatReport;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("{what} {id} out of range 1..={max}")]
    OutOfRange {
        what: &'static str,
        id: u32,
        max: u32,
    },

    #[error("output port {port} already owned by input {owner} (clear first), requested by input {requested}")]
    Conflict {
        port: PortId,
        owner: InputId,
        requested: InputId,
    },

    #[error("no assignment satisfies the Clos trunk capacity: {0}")]
    Infeasible(UnsatReport),

    #[error("fabric invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RouterError {
    /// 输入错误：拒绝当前行，状态不变。其余错误都会终止命令流。
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RouterError::Parse { .. } | RouterError::OutOfRange { .. } | RouterError::Conflict { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
