//! 命令流模块
//!
//! 解析 route / clear 指令，每条指令对应一次 resolve。

mod command;

pub use command::{Command, ParseError, parse_line};
