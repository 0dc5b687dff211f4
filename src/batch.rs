//! Parallel translation of many materials, one private translator per material.

use crate::fingerprint::{CacheKey, material_key};
use crate::foundation::error::{MaterialError, MaterialResult};
use crate::graph::model::MaterialDef;
use crate::graph::normalize::MaterialGraph;
use crate::options::TranslatorOptions;
use crate::output::TranslatedMaterial;
use crate::template::MaterialTemplate;
use crate::translator::translate;
use rayon::prelude::*;

/// Result of translating one material of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Material name.
    pub name: String,
    /// Cache key of the material and options.
    pub key: CacheKey,
    /// Translation result; a failure here never fails the batch.
    pub result: MaterialResult<TranslatedMaterial>,
}

impl BatchOutcome {
    /// The material translated without errors.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Translate `defs` on a pool of `threads` workers (rayon's default when `None`). Outcomes
/// keep the input order.
#[tracing::instrument(skip_all, fields(materials = defs.len()))]
pub fn translate_many(
    defs: Vec<MaterialDef>,
    options: &TranslatorOptions,
    template: &MaterialTemplate,
    threads: Option<usize>,
) -> MaterialResult<Vec<BatchOutcome>> {
    let pool = build_thread_pool(threads)?;
    let outcomes: Vec<MaterialResult<BatchOutcome>> = pool.install(|| {
        defs.into_par_iter()
            .map(|def| {
                let key = material_key(&def, options)?;
                let name = def.name.clone();
                let result =
                    MaterialGraph::new(def).and_then(|graph| translate(&graph, options, template));
                Ok(BatchOutcome { name, key, result })
            })
            .collect()
    });
    let outcomes = outcomes.into_iter().collect::<MaterialResult<Vec<_>>>()?;

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    tracing::debug!(
        translated = outcomes.len() - failed,
        failed,
        "batch finished"
    );
    Ok(outcomes)
}

fn build_thread_pool(threads: Option<usize>) -> MaterialResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MaterialError::validation(
            "batch 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MaterialError::evaluation(format!("failed to build rayon thread pool: {e}")))
}
