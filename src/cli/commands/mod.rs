//! One module per `lockbox` subcommand, each exposing `execute`.

pub mod add;
pub mod audit_cmd;
pub mod completions;
pub mod delete;
pub mod get;
pub mod history;
pub mod info;
pub mod init;
pub mod list;
pub mod migrate;
pub mod revert;
pub mod update;
