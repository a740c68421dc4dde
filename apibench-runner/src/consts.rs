pub const DEFAULT_REQUESTS: u64 = 1000;
pub const DEFAULT_CONCURRENCY: usize = 50;
pub const DEFAULT_OUTPUT: &str = "comparison_results.json";
pub const DEFAULT_SEED_MAX_ID: u64 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_WAIT_READY_SECS: u64 = 0;

/// Used when neither the CLI nor a workload file names any target.
pub const DEFAULT_TARGETS: &[(&str, &str)] = &[
    ("fastapi", "http://localhost:8000"),
    ("axum", "http://localhost:3000"),
];

pub const ITEMS_PATH: &str = "/db/items";

pub const CREATE_DIVISOR: u64 = 2;
pub const CREATE_CAP: u64 = 500;
pub const UPDATE_DIVISOR: u64 = 4;
pub const UPDATE_CAP: u64 = 250;
pub const DELETE_DIVISOR: u64 = 10;
pub const DELETE_CAP: u64 = 100;
pub const WRITE_CONCURRENCY_CAP: usize = 10;

pub const CPU_STRESS_DIVISOR: u64 = 2;
pub const CPU_STRESS_CONCURRENCY_DIVISOR: usize = 2;
pub const MEMORY_STRESS_DIVISOR: u64 = 10;
pub const MEMORY_STRESS_CONCURRENCY_DIVISOR: usize = 5;
