// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Registry Module
 * Scan state store and single-writer leases
 * © 2025 Bountyy Oy
 */

pub mod scan_store;

pub use scan_store::{InMemoryScanStore, ScanMutation, ScanStore, WriterLease};
