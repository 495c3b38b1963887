// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-cycle outcome reported to the host.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use relay_scene_port::{AuxOutput, ElementKind};

use crate::error::FallbackNotice;

/// Conversion counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    converted: BTreeMap<ElementKind, usize>,
    /// Meshes skipped because their host revision was unchanged.
    pub meshes_reused: usize,
    /// Objects walked while hidden.
    pub hidden_objects: usize,
}

impl SyncStats {
    /// Elements of `kind` converted this pass.
    pub fn converted(&self, kind: ElementKind) -> usize {
        self.converted.get(&kind).copied().unwrap_or(0)
    }

    /// Elements converted this pass, all kinds.
    pub fn total_converted(&self) -> usize {
        self.converted.values().sum()
    }

    pub(crate) fn count(&mut self, kind: ElementKind) {
        *self.converted.entry(kind).or_default() += 1;
    }
}

/// What one successful [`sync`](crate::ExportCoordinator::sync) did.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Cycle number (1-based).
    pub cycle: u64,
    /// The renderer was built from scratch rather than updated.
    pub cold: bool,
    /// The renderer configuration differs from the previous cycle's.
    pub config_changed: bool,
    /// Keys set by the flushed batch.
    pub set_keys: usize,
    /// Keys deleted by the flushed batch.
    pub deleted_keys: usize,
    /// Light groups in id order.
    pub light_groups: Vec<String>,
    /// Auxiliary outputs requested this pass.
    pub aux_outputs: Vec<AuxOutput>,
    /// Elements that needed a safe default.
    pub fallbacks: Vec<FallbackNotice>,
    /// Conversion counters.
    pub stats: SyncStats,
}

impl SyncReport {
    /// Whether any element failed (missing references are warnings).
    pub fn had_errors(&self) -> bool {
        self.fallbacks.iter().any(|f| !f.error.is_warning())
    }

    /// One-line summary for the host's status bar, if anything fell back.
    pub fn notice(&self) -> Option<String> {
        if self.fallbacks.is_empty() {
            return None;
        }
        let mut out = format!("{} element(s) exported with defaults:", self.fallbacks.len());
        for notice in &self.fallbacks {
            let _ = write!(out, " {} `{}` ({});", notice.kind, notice.name, notice.error);
        }
        out.pop();
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    fn report(fallbacks: Vec<FallbackNotice>) -> SyncReport {
        SyncReport {
            cycle: 1,
            cold: true,
            config_changed: true,
            set_keys: 0,
            deleted_keys: 0,
            light_groups: Vec::new(),
            aux_outputs: Vec::new(),
            fallbacks,
            stats: SyncStats::default(),
        }
    }

    #[test]
    fn clean_report_has_no_notice() {
        assert_eq!(report(Vec::new()).notice(), None);
    }

    #[test]
    fn warnings_are_not_errors() {
        let warning = FallbackNotice {
            kind: ElementKind::Object,
            name: "Cube".to_owned(),
            error: ConvertError::unresolved(ElementKind::Material, "Gone"),
        };
        let failure = FallbackNotice {
            kind: ElementKind::Texture,
            name: "Noise".to_owned(),
            error: ConvertError::conversion(ElementKind::Texture, "bad octaves"),
        };
        assert!(!report(vec![warning.clone()]).had_errors());

        let both = report(vec![warning, failure]);
        assert!(both.had_errors());
        let notice = both.notice().unwrap();
        assert!(notice.starts_with("2 element(s)"));
        assert!(notice.contains("texture `Noise`"));
        assert!(!notice.ends_with(';'));
    }

    #[test]
    fn stats_count_per_kind() {
        let mut stats = SyncStats::default();
        stats.count(ElementKind::Mesh);
        stats.count(ElementKind::Mesh);
        stats.count(ElementKind::Light);
        assert_eq!(stats.converted(ElementKind::Mesh), 2);
        assert_eq!(stats.converted(ElementKind::Camera), 0);
        assert_eq!(stats.total_converted(), 3);
    }
}
