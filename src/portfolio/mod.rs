// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Portfolio orchestration.
//!
//! [`BalanceAggregator`] fans balance queries out across chains under a
//! concurrency cap and per-call timeout; [`PortfolioValuator`] combines one
//! aggregation pass with one price generation into a fiat-valued snapshot.

pub mod aggregator;
pub mod valuator;

pub use aggregator::{BalanceAggregator, BalanceBatch, WalletBalance};
pub use valuator::PortfolioValuator;
