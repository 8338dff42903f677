pub mod builders;
pub mod expr;
pub mod operators;
pub mod plan;
pub mod select;
pub mod values;

pub use self::expr::{Expr, OrderKey, Ordering};
pub use self::operators::{AggregateFunc, BinaryOp, JoinKind, SortOrder};
pub use self::plan::{Bound, Plan, Projection};
pub use self::select::{JoinClause, Select, SelectItem, TableRef, Wildcard, COMPUTED_COLUMN};
pub use self::values::{Parameter, Value};
