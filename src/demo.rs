//! Demo dataset generators.
//!
//! Seeded job-record generators for exercising the engine without a
//! backend: a balanced wide tree and a random-width layered tree, both
//! with a sprinkling of cross dependencies and randomized statuses.
//! Deterministic per seed so demo graphs are stable across reloads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::JobRecord;

/// Children per node in the balanced tree.
const BALANCED_FANOUT: usize = 15;

const STATUSES: [&str; 4] = ["completed", "running", "failed", "waiting"];

fn job(index: usize, name: String, rng: &mut StdRng) -> JobRecord {
    let mut record = JobRecord::new(format!("job-{index}"), name);
    record.status = Some(STATUSES[rng.gen_range(0..STATUSES.len())].to_owned());
    record.kind = Some("Box".to_owned());
    record
}

/// A balanced tree of `count` jobs: every node takes up to
/// [`BALANCED_FANOUT`] children before the next parent starts filling,
/// plus cross dependencies on roughly every tenth job.
pub fn balanced_dataset(count: usize, seed: u64) -> Vec<JobRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::with_capacity(count);
    if count == 0 {
        return jobs;
    }

    jobs.push(job(0, "Root Task".to_owned(), &mut rng));
    let mut parent_index = 0;
    for i in 1..count {
        let record = job(i, format!("Task {i}"), &mut rng).with_parent(format!("job-{parent_index}"));
        jobs.push(record);
        if i % BALANCED_FANOUT == 0 {
            parent_index += 1;
        }
    }

    // Cross dependencies on ~10% of the jobs for a denser graph.
    for i in (count / 10..count).step_by(10) {
        if i > 10 {
            let target = format!("job-{}", i / 2);
            let with_cross = jobs[i].clone().with_cross(target);
            jobs[i] = with_cross;
        }
    }
    jobs
}

/// A layered tree with random fanout: each node on a level gets between
/// 1 and `width` children until `depth` levels or `max_count` jobs exist.
pub fn structured_dataset(width: usize, depth: usize, max_count: usize, seed: u64) -> Vec<JobRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::new();
    if max_count == 0 {
        return jobs;
    }

    jobs.push(job(0, "Root Task".to_owned(), &mut rng));
    let mut next_id = 1usize;
    let mut current_level = vec!["job-0".to_owned()];

    'levels: for level in 1..=depth {
        let mut next_level = Vec::new();
        for parent in &current_level {
            let children = rng.gen_range(1..=width.max(1));
            for _ in 0..children {
                if jobs.len() >= max_count {
                    break 'levels;
                }
                let record = job(next_id, format!("Level {level} Task {next_id}"), &mut rng)
                    .with_parent(parent.clone());
                next_level.push(record.id.clone());
                jobs.push(record);
                next_id += 1;
            }
        }
        if next_level.is_empty() {
            break;
        }
        current_level = next_level;
    }
    jobs
}
