//! One module per subcommand. Each exposes an `execute` function.

pub mod audit_cmd;
pub mod change_password;
pub mod create_shares;
pub mod export;
pub mod get;
pub mod import_cmd;
pub mod list;
pub mod recover;
pub mod remove;
pub mod run;
pub mod set;
pub mod stats;
