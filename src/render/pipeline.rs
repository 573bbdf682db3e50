use crate::foundation::error::{CausticsError, CausticsResult};
use crate::receiver::registry::ReceiverRegistry;
use crate::render::composite::{CompositeReport, CompositeSettings, CompositeStage};
use crate::render::debug::{DebugTextures, Inspector};
use crate::render::frame::FrameTargets;
use crate::render::generate::{GenerationReport, GenerationSettings, GenerationStage};
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts, SurfacePoolStats};
use std::sync::Arc;

/// Options for building a [`CausticsPipeline`].
#[derive(Clone, Debug, Default)]
pub struct PipelineOpts {
    /// Generation stage settings.
    pub generation: GenerationSettings,
    /// Composite stage settings.
    pub composite: CompositeSettings,
    /// Override the number of rayon worker threads. `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Scratch buffer pool limits.
    pub pool: Option<SurfacePoolOpts>,
}

/// Per-frame statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Generation stage report.
    pub generation: GenerationReport,
    /// Composite stage report (default when only generation ran).
    pub composite: CompositeReport,
    /// `(receiver name, texture fingerprint)` in registration order; `None` without texture.
    pub fingerprints: Vec<(String, Option<u64>)>,
}

/// Frame orchestrator: runs generation then composite, in that order, against one registry.
pub struct CausticsPipeline {
    registry: Arc<ReceiverRegistry>,
    generation: GenerationStage,
    composite: CompositeStage,
    pool: SurfacePool,
    threads: Option<rayon::ThreadPool>,
}

impl CausticsPipeline {
    /// Build both stages. Fails only when a dedicated thread pool cannot be built.
    pub fn new(registry: Arc<ReceiverRegistry>, opts: PipelineOpts) -> CausticsResult<Self> {
        let threads = match opts.threads {
            Some(n) => Some(build_thread_pool(n)?),
            None => None,
        };
        Ok(Self {
            registry,
            generation: GenerationStage::new(opts.generation),
            composite: CompositeStage::new(opts.composite),
            pool: SurfacePool::new(opts.pool.unwrap_or_default()),
            threads,
        })
    }

    /// Shared registry.
    pub fn registry(&self) -> &Arc<ReceiverRegistry> {
        &self.registry
    }

    /// Generation stage.
    pub fn generation(&self) -> &GenerationStage {
        &self.generation
    }

    /// Composite stage, mutable for blend switching between frames.
    pub fn composite_mut(&mut self) -> &mut CompositeStage {
        &mut self.composite
    }

    /// Debug textures published by the last generation pass.
    pub fn debug_textures(&self) -> &DebugTextures {
        self.generation.debug_textures()
    }

    /// Inspector over this pipeline's registry and debug textures.
    pub fn inspector(&self) -> Inspector<'_> {
        Inspector::new(&self.registry, self.generation.debug_textures())
    }

    /// Scratch pool counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Run generation only (offline texture baking).
    #[tracing::instrument(skip_all)]
    pub fn generate_only(&mut self) -> FrameStats {
        let snapshot = self.registry.snapshot();
        let generation = &mut self.generation;
        let report = run_in(self.threads.as_ref(), || generation.execute(&snapshot));
        FrameStats {
            generation: report,
            composite: CompositeReport::default(),
            fingerprints: self.fingerprints(),
        }
    }

    /// Run one full frame: generation, then composite onto `targets`.
    #[tracing::instrument(skip_all)]
    pub fn render_frame(&mut self, targets: &mut FrameTargets<'_>) -> FrameStats {
        let snapshot = self.registry.snapshot();
        let generation = &mut self.generation;
        let gen_report = run_in(self.threads.as_ref(), || generation.execute(&snapshot));

        let snapshot = self.registry.snapshot();
        let (composite, pool) = (&self.composite, &mut self.pool);
        let comp_report = run_in(self.threads.as_ref(), || {
            composite.execute(&snapshot, targets, pool)
        });

        FrameStats {
            generation: gen_report,
            composite: comp_report,
            fingerprints: self.fingerprints(),
        }
    }

    fn fingerprints(&self) -> Vec<(String, Option<u64>)> {
        self.registry
            .receivers()
            .iter()
            .map(|r| {
                (
                    r.name().to_owned(),
                    r.with_texture(|t| t.fingerprint()),
                )
            })
            .collect()
    }
}

fn run_in<R: Send>(pool: Option<&rayon::ThreadPool>, f: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(p) => p.install(f),
        None => f(),
    }
}

fn build_thread_pool(threads: usize) -> CausticsResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(CausticsError::validation(
            "pipeline 'threads' must be >= 1 when set",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| CausticsError::resource(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
