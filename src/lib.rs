// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Chainfolio
//!
//! Multi-chain balance and valuation engine. Generates custodial wallets
//! with encrypted key storage, queries balances across EVM chains and
//! Bitcoin concurrently, and values holdings in fiat against a cached,
//! internally consistent price generation.

pub mod api;
pub mod chains;
pub mod config;
pub mod error;
pub mod models;
pub mod portfolio;
pub mod pricing;
pub mod state;
pub mod storage;
pub mod vault;
