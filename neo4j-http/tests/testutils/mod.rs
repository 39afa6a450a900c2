// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod fake_server;
