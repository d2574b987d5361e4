// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! testcop library
//!
//! This module exports the storage, configuration and command layers of the
//! `testcop` binary for use in integration tests and as a library. Parsing and
//! flaky classification live in `testcop_results`.

pub mod commands;
pub mod config;
pub mod db;
pub mod migrations;
pub mod records;
pub mod stdout;
pub mod store;
pub mod storer;
