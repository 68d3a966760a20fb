// Copyright 2026 Navatlas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Navatlas library — hierarchical category discovery and traversal engine.
//!
//! Drives a desktop application's embedded web view over CDP, infers the
//! shape of its multi-level category menu from ambiguous markup, captures a
//! screenshot for every reachable leaf, and persists the discovered tree.

pub mod capture;
pub mod config;
pub mod connect;
pub mod error;
pub mod host;
pub mod menu;
pub mod model;
pub mod page;
pub mod sink;
pub mod traverse;
