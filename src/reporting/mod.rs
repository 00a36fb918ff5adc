// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod report;
pub mod summary;

pub use report::ScanReport;
pub use summary::SeveritySummary;
