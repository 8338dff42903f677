use serde::{Deserialize, Serialize};

use crate::error::RowPageError;
use crate::transpiler::sql::oracle::OracleGenerator;
use crate::transpiler::sql::sqlserver::SqlServerGenerator;
use crate::transpiler::traits::SqlGenerator;

/// Supported SQL dialects. Both lack a native OFFSET/FETCH clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQL Server 2005 / 2008
    #[default]
    SqlServer,
    /// Oracle 10g / 11g
    Oracle,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::SqlServer, Dialect::Oracle];

    pub fn generator(&self) -> Box<dyn SqlGenerator> {
        match self {
            Dialect::SqlServer => Box::new(SqlServerGenerator),
            Dialect::Oracle => Box::new(OracleGenerator),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Oracle => write!(f, "oracle"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = RowPageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            "oracle" => Ok(Dialect::Oracle),
            other => Err(RowPageError::Config(format!(
                "unknown dialect '{}', expected one of: sqlserver, oracle",
                other
            ))),
        }
    }
}
