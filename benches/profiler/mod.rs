// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::str::FromStr;
use std::time::Duration;

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

/// Reads `name` from the environment, falling back to `default` and clamping into `range`.
fn env_clamped<T>(name: &str, default: T, min: T, max: T) -> T
where
    T: FromStr + Ord,
{
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

/// Criterion preset with a flamegraph profiler attached (`cargo bench -- --profile-time 10`).
pub fn criterion() -> Criterion {
    let frequency = env_clamped("PROFILE_FREQ", 100_i32, 1, 1000);
    let sample_size = env_clamped("BENCH_SAMPLE_SIZE", 40_usize, 10, 200);
    let warmup_secs = env_clamped("BENCH_WARMUP_SECS", 2_u64, 1, 60);
    let measurement_secs = env_clamped("BENCH_MEASUREMENT_SECS", 4_u64, 1, 120);

    Criterion::default()
        .sample_size(sample_size)
        .warm_up_time(Duration::from_secs(warmup_secs))
        .measurement_time(Duration::from_secs(measurement_secs))
        .with_profiler(PProfProfiler::new(frequency, Output::Flamegraph(None)))
}
