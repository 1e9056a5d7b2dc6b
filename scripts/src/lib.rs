//! Scripts for deploying and administering the auditSign upgradeable contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod manifest;
pub mod selector;
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
mod solidity;
pub mod types;
pub mod utils;
