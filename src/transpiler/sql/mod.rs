pub mod oracle;
pub mod sqlserver;
