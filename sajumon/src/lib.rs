// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

pub mod calendar;
pub mod config;
pub mod relay;
pub mod server;
