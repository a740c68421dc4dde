use apibench_core::{EndpointSpec, LoadProfile, Method, Phase};
use serde_json::json;

use crate::consts;

/// Built-in workload for servers implementing the standard contract.
pub fn default_endpoints() -> Vec<EndpointSpec> {
    let item_path = format!("{}/{{id}}", consts::ITEMS_PATH);
    let write_load = |divisor, cap| {
        LoadProfile::scaled(divisor, Some(cap)).with_concurrency(1, Some(consts::WRITE_CONCURRENCY_CAP))
    };

    vec![
        EndpointSpec::new(Method::Get, "/", Phase::Basic).with_description("Root endpoint"),
        EndpointSpec::new(Method::Get, "/health", Phase::Basic).with_description("Health check"),
        EndpointSpec::new(Method::Post, "/echo", Phase::Basic)
            .with_description("Echo POST")
            .with_payload(json!({
                "message": "benchmark test",
                "data": {"test": "data", "number": 42}
            })),
        EndpointSpec::new(Method::Get, "/echo/benchmark-test", Phase::Basic)
            .with_description("Echo GET"),
        EndpointSpec::new(Method::Get, consts::ITEMS_PATH, Phase::Read)
            .with_description("List items"),
        EndpointSpec::new(Method::Get, format!("{}/1", consts::ITEMS_PATH), Phase::Read)
            .with_description("Get item"),
        EndpointSpec::new(Method::Post, consts::ITEMS_PATH, Phase::Write)
            .with_description("Create item")
            .with_payload(json!({
                "name": "Benchmark Item",
                "description": "Item created during benchmarking",
                "price": 99.99
            }))
            .with_load(write_load(consts::CREATE_DIVISOR, consts::CREATE_CAP)),
        EndpointSpec::new(Method::Put, item_path.clone(), Phase::Write)
            .with_description("Update item")
            .with_payload(json!({
                "name": "Updated Benchmark Item",
                "description": "Item updated during benchmarking",
                "price": 149.99
            }))
            .with_load(write_load(consts::UPDATE_DIVISOR, consts::UPDATE_CAP)),
        EndpointSpec::new(Method::Delete, item_path, Phase::Write)
            .with_description("Delete item")
            .with_load(write_load(consts::DELETE_DIVISOR, consts::DELETE_CAP)),
        EndpointSpec::new(Method::Get, "/stress/cpu/1000", Phase::Stress)
            .with_description("CPU stress")
            .with_load(
                LoadProfile::scaled(consts::CPU_STRESS_DIVISOR, None)
                    .with_concurrency(consts::CPU_STRESS_CONCURRENCY_DIVISOR, None),
            ),
        EndpointSpec::new(Method::Get, "/stress/memory/1", Phase::Stress)
            .with_description("Memory stress")
            .with_load(
                LoadProfile::scaled(consts::MEMORY_STRESS_DIVISOR, None)
                    .with_concurrency(consts::MEMORY_STRESS_CONCURRENCY_DIVISOR, None),
            ),
    ]
}

/// Endpoints grouped by phase in execution order. Declaration order is kept within a phase.
#[derive(Debug, Clone)]
pub struct WorkloadPlan {
    phases: Vec<(Phase, Vec<EndpointSpec>)>,
}

impl WorkloadPlan {
    pub fn new(endpoints: Vec<EndpointSpec>) -> Self {
        let phases = Phase::ALL
            .iter()
            .map(|phase| {
                let members: Vec<EndpointSpec> = endpoints
                    .iter()
                    .filter(|e| e.phase == *phase)
                    .cloned()
                    .collect();
                (*phase, members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect();
        Self { phases }
    }

    pub fn phases(&self) -> impl Iterator<Item = (Phase, &[EndpointSpec])> {
        self.phases
            .iter()
            .map(|(phase, endpoints)| (*phase, endpoints.as_slice()))
    }

    pub fn endpoint_count(&self) -> usize {
        self.phases.iter().map(|(_, endpoints)| endpoints.len()).sum()
    }

    /// Upper bound on requests per target, for progress bars.
    pub fn planned_requests(&self, total_requests: u64, concurrency: usize) -> u64 {
        self.phases
            .iter()
            .flat_map(|(_, endpoints)| endpoints)
            .map(|e| e.load.apply(total_requests, concurrency).0)
            .sum()
    }
}
