//! SQL query tree and rendering

mod compiler;
mod query;

pub use compiler::{CompiledQuery, Compiler, Dialect};
pub use query::{
    Column, CompareOp, Condition, Cte, Join, JoinKind, Query, SelectItem, SetOp, Source, SqlValue,
};
