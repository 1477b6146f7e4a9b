//! Static comparison-backend registry
//!
//! Resolves the configured alignment kinds to backend instances exactly
//! once at startup. Stages that dispatch work iterate the registry in
//! kind-id order; nothing is looked up per call.

use crate::aligners::{CeAligner, FatcatAligner, TmAligner};
use crate::config::AlignConfig;
use crate::types::{AlignmentKind, StructureAligner};
use cfa_common::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Registry of active comparison backends, keyed by kind
pub struct AlignerRegistry {
    aligners: BTreeMap<AlignmentKind, Arc<dyn StructureAligner>>,
}

impl AlignerRegistry {
    /// Build the registry from configuration.
    ///
    /// Unknown kind ids are a configuration error; duplicates collapse.
    pub fn from_config(config: &AlignConfig) -> Result<Self> {
        let mut aligners: BTreeMap<AlignmentKind, Arc<dyn StructureAligner>> = BTreeMap::new();

        for id in &config.alignment.types {
            let kind = AlignmentKind::from_id(*id)
                .ok_or_else(|| Error::InvalidInput(format!("unknown alignment type id {}", id)))?;

            let aligner: Arc<dyn StructureAligner> = match kind {
                AlignmentKind::CombinatorialExtension => {
                    Arc::new(CeAligner::new(&config.aligners.ce))
                }
                AlignmentKind::TmAlign => Arc::new(TmAligner::new(&config.aligners.tm)),
                AlignmentKind::Fatcat => Arc::new(FatcatAligner::new(&config.aligners.fatcat)),
            };
            aligners.insert(kind, aligner);
        }

        if aligners.is_empty() {
            return Err(Error::Config(
                "no alignment types configured (alignment.types is empty)".to_string(),
            ));
        }

        info!(
            "Resolved {} comparison backends: {}",
            aligners.len(),
            aligners
                .keys()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self { aligners })
    }

    /// Build a registry from already-constructed backends (used by tests)
    pub fn with_aligners(list: Vec<Arc<dyn StructureAligner>>) -> Self {
        let aligners = list.into_iter().map(|a| (a.kind(), a)).collect();
        Self { aligners }
    }

    pub fn get(&self, kind: AlignmentKind) -> Option<&Arc<dyn StructureAligner>> {
        self.aligners.get(&kind)
    }

    /// Iterate active backends in kind-id order
    pub fn iter(&self) -> impl Iterator<Item = (AlignmentKind, &Arc<dyn StructureAligner>)> {
        self.aligners.iter().map(|(k, a)| (*k, a))
    }

    pub fn len(&self) -> usize {
        self.aligners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligners.is_empty()
    }
}
