// crates/driftlock-cli/src/commands/mod.rs

pub mod detect;
pub mod lock;
pub mod patch;
