// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs for the `fitsync` binary.
//!
//! The files under `cli/` are compiled as integration tests of the
//! `fitsync` package, which points its `[[test]]` targets here.
