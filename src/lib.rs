//! PetCare Admin CLI
//!
//! `petcare-common` のストアを reqwest とファイル保存で動かす管理用コマンド

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod session;
pub mod transport;
