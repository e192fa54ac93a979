//! SkillSwap - credit ledger and booking lifecycle engine
//!
//! The core of the SkillSwap peer-to-peer skill marketplace: accounts hold
//! an internal credit currency, bookings charge and pay it out through an
//! append-only ledger, and fixed-amount rewards are granted exactly once
//! per triggering event.
//!
//! Central invariant: an account's balance always equals the sum of its
//! ledger entries. Every mutation that touches both a record and the
//! ledger commits in a single storage transaction.

pub mod config;
pub mod domain;
pub mod facade;
pub mod interfaces;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use facade::SkillSwap;
pub use services::{CoordinatorError, Result};
