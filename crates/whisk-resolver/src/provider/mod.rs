//! Production dependency provider.
//!
//! The graph builder only knows the `DependencyProvider` seam; the
//! index finder (wheel cache → indexes → build-and-cache) plugs into it
//! here.

use whisk_core::error::WhiskResult;
use whisk_core::types::{Requirement, ResolvedCandidate};
use whisk_index::{DistFinder, WheelBuilder};

use crate::graph::DependencyProvider;

impl<B: WheelBuilder> DependencyProvider for DistFinder<B> {
    async fn resolve(&self, requirement: &Requirement) -> WhiskResult<ResolvedCandidate> {
        DistFinder::resolve(self, requirement).await
    }

    async fn dependencies(
        &self,
        candidate: &ResolvedCandidate,
        extras: &[String],
    ) -> WhiskResult<Vec<Requirement>> {
        DistFinder::dependencies(self, candidate, extras).await
    }
}
