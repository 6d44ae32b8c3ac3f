//! Owner rotation: which identity a scheduled item is published under.
//!
//! The candidate list is the configured pool minus the item's current owner
//! and minus every excluded id, duplicates removed, order preserved. When no
//! candidate survives, the original owner is kept.

use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerStrategy {
    #[default]
    Random,
    RoundRobin,
}

impl FromStr for OwnerStrategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(OwnerStrategy::Random),
            "round_robin" | "round-robin" | "roundrobin" => Ok(OwnerStrategy::RoundRobin),
            other => Err(ValidationError::InvalidValue {
                field: "owner.strategy".to_string(),
                message: format!("'{other}' is not one of: random, round_robin"),
            }),
        }
    }
}

/// Round-robin pointer, persisted by the caller between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotationState {
    pub current_index: usize,
}

/// How owners are chosen for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnerPolicy {
    pub enabled: bool,
    pub strategy: OwnerStrategy,
    pub pool: Vec<String>,
    pub excluded: Vec<String>,
    #[serde(default)]
    pub state: RotationState,
}

impl OwnerPolicy {
    /// Keep every item's original owner.
    pub fn disabled() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerRotator;

impl OwnerRotator {
    pub fn new() -> Self {
        Self
    }

    /// Pick the owner for one item and return the advanced rotation state.
    pub fn next_owner<R: Rng>(
        &self,
        original: &str,
        pool: &[String],
        excluded: &[String],
        strategy: OwnerStrategy,
        state: RotationState,
        rng: &mut R,
    ) -> (String, RotationState) {
        let candidates = candidates(original, pool, excluded);
        if candidates.is_empty() {
            return (original.to_string(), state);
        }

        match strategy {
            OwnerStrategy::Random => {
                let picked = candidates
                    .choose(rng)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| original.to_string());
                (picked, state)
            }
            OwnerStrategy::RoundRobin => {
                // A stale index (pool shrank since it was saved) is clamped to
                // the last candidate.
                let index = state.current_index.min(candidates.len() - 1);
                let next = RotationState {
                    current_index: (index + 1) % candidates.len(),
                };
                (candidates[index].to_string(), next)
            }
        }
    }
}

fn candidates<'a>(original: &str, pool: &'a [String], excluded: &[String]) -> Vec<&'a str> {
    let mut out: Vec<&'a str> = Vec::with_capacity(pool.len());
    for id in pool {
        let id = id.as_str();
        if id == original || excluded.iter().any(|e| e == id) || out.contains(&id) {
            continue;
        }
        out.push(id);
    }
    out
}
