//! Configuration section definitions.
//!
//! Each module corresponds to a section in `vmsync.toml`:
//!
//! | Module    | TOML Section | Purpose                          |
//! |-----------|--------------|----------------------------------|
//! | `log`     | `[log]`      | Verbose terminal output          |
//! | `payload` | `[payload]`  | Outbound JSON encoding           |
//! | `push`    | `[push]`     | Background push worker           |

mod log;
mod payload;
mod push;

pub use log::LogConfig;
pub use payload::PayloadConfig;
pub use push::PushConfig;
