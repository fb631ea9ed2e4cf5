//! Model-name reconciliation between the preset catalog and the grid.
//!
//! Workers advertise model names in whatever spelling their operators chose:
//! hyphens vs underscores, case drift, serialization suffixes like
//! `_fp8_scaled`. There is no naming authority between the two systems, so
//! resolution is a pluggable chain of ordered strategies, strictest first.
//! The stage order is a contract (later stages are intentionally looser) and
//! is covered by tests; a new naming quirk becomes a new stage, not an edit
//! to the lookup logic.
//!
//! Resolution never fails: a preset with no telemetry match simply reads as
//! offline.

use std::collections::HashMap;

/// Live queue statistics for one grid-reported model name.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryEntry {
    pub workers: i64,
    pub queued: i64,
    pub eta: f64,
    pub performance: f64,
}

impl TelemetryEntry {
    /// A model is online iff at least one worker advertises it, regardless
    /// of queue length.
    pub fn is_online(&self) -> bool {
        self.workers > 0
    }
}

/// Per-request snapshot of grid telemetry, indexed for both case-sensitive
/// and case-insensitive lookup. Never persisted; rebuilt on every listing.
#[derive(Debug, Default)]
pub struct TelemetrySnapshot {
    exact: HashMap<String, TelemetryEntry>,
    lower: HashMap<String, TelemetryEntry>,
}

impl TelemetrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, entry: TelemetryEntry) {
        self.exact.insert(name.to_string(), entry);
        self.lower.insert(name.to_lowercase(), entry);
    }

    /// Exact key, then lower-cased key.
    fn get(&self, name: &str) -> Option<TelemetryEntry> {
        self.exact
            .get(name)
            .or_else(|| self.lower.get(&name.to_lowercase()))
            .copied()
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.exact.keys().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<(S, TelemetryEntry)> for TelemetrySnapshot {
    fn from_iter<T: IntoIterator<Item = (S, TelemetryEntry)>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for (name, entry) in iter {
            snapshot.insert(name.as_ref(), entry);
        }
        snapshot
    }
}

/// The strategy that produced a telemetry match, in contract order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    /// Telemetry key equals the preset id (case-sensitive, then -insensitive).
    Exact,
    /// One of the preset's declared upstream spellings matched.
    Alias,
    /// The preset id is itself an alias of another preset; that sibling set
    /// matched.
    ReverseAlias,
    /// Separator- and case-stripped forms are equal.
    Normalized,
    /// Serialization-suffix-stripped core names are equal or one contains
    /// the other.
    FuzzyCore,
}

impl MatchStage {
    /// Stage order, strictest first. First match wins.
    pub const ORDER: [MatchStage; 5] = [
        MatchStage::Exact,
        MatchStage::Alias,
        MatchStage::ReverseAlias,
        MatchStage::Normalized,
        MatchStage::FuzzyCore,
    ];
}

/// Known upstream spellings per preset id.
///
/// A pragmatic patch over an unversioned naming scheme: whenever a worker
/// fleet starts advertising a new variation, it gets a row here.
const MODEL_NAME_ALIASES: &[(&str, &[&str])] = &[
    // WAN 2.2 video models: underscores vs hyphens, case variations.
    (
        "wan2.2_ti2v_5B",
        &["wan2.2_ti2v_5b", "wan2_2_ti2v_5b", "wan2.2-ti2v-5b"],
    ),
    (
        "wan2.2-t2v-a14b",
        &["wan2_2_t2v_14b", "wan2.2-t2v-14b", "wan2.2_t2v_a14b"],
    ),
    (
        "wan2.2-t2v-a14b-hq",
        &["wan2_2_t2v_14b_hq", "wan2.2-t2v-14b-hq", "wan2.2_t2v_a14b_hq"],
    ),
    // FLUX models: case and punctuation variations.
    (
        "FLUX.1-dev",
        &["flux.1-dev", "flux1-dev", "flux1.dev", "flux1_dev"],
    ),
    (
        "flux.1-krea-dev",
        &[
            "flux1-krea-dev",
            "flux1_krea_dev",
            "flux.1_krea_dev",
            "krea",
            "flux1-krea-dev_fp8_scaled",
            "flux1-krea-dev-fp8-scaled",
            "flux1_krea_dev_fp8_scaled",
        ],
    ),
    (
        "FLUX.1-dev-Kontext-fp8-scaled",
        &[
            "flux.1-dev-kontext-fp8-scaled",
            "flux1-dev-kontext-fp8-scaled",
            "flux1_dev_kontext_fp8_scaled",
            "flux_kontext_dev_basic",
        ],
    ),
    (
        "Flux.1-Schnell fp8 (Compact)",
        &[
            "flux.1-schnell fp8 (compact)",
            "flux1-schnell-fp8-compact",
            "flux.1-schnell",
        ],
    ),
    ("Chroma", &["chroma", "chroma_final"]),
    ("SDXL 1.0", &["sdxl 1.0", "sdxl1", "sdxl", "sdxl1.0"]),
    ("ltxv", &["ltx-video", "ltxv-13b"]),
    (
        "ICBINP - I Can't Believe It's Not Photography",
        &["icbinp", "icbinp - i can't believe it's not photography"],
    ),
    ("ICBINP XL", &["icbinp xl", "icbinp-xl"]),
];

/// Canonical grid name per preset id, used when building job payloads.
/// These must match what workers advertise to the grid.
const PRESET_TO_GRID_NAME: &[(&str, &str)] = &[
    ("wan2.2_ti2v_5B", "wan2_2_ti2v_5b"),
    ("wan2.2-t2v-a14b", "wan2_2_t2v_14b"),
    ("wan2.2-t2v-a14b-hq", "wan2_2_t2v_14b_hq"),
];

/// Serialization suffixes stripped when computing a model's "core name",
/// most specific first. Applied repeatedly so stacked suffixes fall away.
const CORE_NAME_SUFFIXES: &[&str] = &[
    "fp8scaled", "fp16scaled", "fp32scaled", "fp8", "fp16", "fp32", "scaled", "compact",
];

/// Model file extensions stripped from recipe-referenced names before
/// matching.
const MODEL_FILE_EXTENSIONS: &[&str] = &[".safetensors", ".ckpt", ".pt", ".pth"];

/// Resolves preset ids against grid telemetry and recipe-registry names.
#[derive(Debug)]
pub struct Resolver {
    aliases: HashMap<&'static str, &'static [&'static str]>,
    grid_names: HashMap<&'static str, &'static str>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            aliases: MODEL_NAME_ALIASES.iter().copied().collect(),
            grid_names: PRESET_TO_GRID_NAME.iter().copied().collect(),
        }
    }

    /// The grid model name to submit jobs under. Presets without an explicit
    /// mapping use their id verbatim.
    pub fn grid_model_name<'a>(&self, preset_id: &'a str) -> &'a str {
        self.grid_names.get(preset_id).copied().unwrap_or(preset_id)
    }

    /// Find the telemetry entry for a preset, trying each stage in
    /// [`MatchStage::ORDER`]. Returns the entry and the stage that matched,
    /// or `None` when the preset has no live counterpart.
    pub fn resolve(
        &self,
        preset_id: &str,
        snapshot: &TelemetrySnapshot,
    ) -> Option<(MatchStage, TelemetryEntry)> {
        for stage in MatchStage::ORDER {
            if let Some(entry) = self.resolve_stage(stage, preset_id, snapshot) {
                return Some((stage, entry));
            }
        }
        None
    }

    fn resolve_stage(
        &self,
        stage: MatchStage,
        preset_id: &str,
        snapshot: &TelemetrySnapshot,
    ) -> Option<TelemetryEntry> {
        match stage {
            MatchStage::Exact => snapshot.get(preset_id),
            MatchStage::Alias => self
                .aliases
                .get(preset_id)
                .and_then(|aliases| aliases.iter().find_map(|alias| snapshot.get(alias))),
            MatchStage::ReverseAlias => self.sibling_set(preset_id).and_then(|(canonical, aliases)| {
                snapshot
                    .get(canonical)
                    .or_else(|| aliases.iter().find_map(|alias| snapshot.get(alias)))
            }),
            MatchStage::Normalized => {
                let wanted = normalize(preset_id);
                snapshot
                    .keys()
                    .find(|key| normalize(key) == wanted)
                    .and_then(|key| snapshot.get(key))
            }
            MatchStage::FuzzyCore => {
                let preset_core = core_name(&normalize(preset_id));
                snapshot
                    .keys()
                    .find(|key| cores_overlap(&preset_core, &core_name(&normalize(key))))
                    .and_then(|key| snapshot.get(key))
            }
        }
    }

    /// If `preset_id` appears in another preset's alias list, return that
    /// preset's canonical id and full alias set.
    fn sibling_set(&self, preset_id: &str) -> Option<(&'static str, &'static [&'static str])> {
        self.aliases.iter().find_map(|(canonical, aliases)| {
            aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(preset_id))
                .then_some((*canonical, *aliases))
        })
    }

    /// Recipe-registry allow-list check: does this preset match at least one
    /// recipe-referenced model name by the same five stages?
    ///
    /// Recipe names arrive as model file names; extensions are stripped
    /// before matching. Candidates are the preset id, its aliases, and its
    /// grid-mapped name.
    pub fn matches_recipe(&self, preset_id: &str, recipe_names: &[String]) -> bool {
        let stripped: Vec<String> = recipe_names
            .iter()
            .map(|name| strip_model_extension(name).to_string())
            .collect();

        let mut candidates: Vec<&str> = vec![preset_id, self.grid_model_name(preset_id)];
        if let Some(aliases) = self.aliases.get(preset_id) {
            candidates.extend(aliases.iter().copied());
        }
        if let Some((canonical, aliases)) = self.sibling_set(preset_id) {
            candidates.push(canonical);
            candidates.extend(aliases.iter().copied());
        }

        // Exact / alias / reverse-alias collapse to case-insensitive
        // equality over the candidate set.
        for name in &stripped {
            for candidate in &candidates {
                if candidate.eq_ignore_ascii_case(name) {
                    return true;
                }
            }
        }

        let normalized_candidates: Vec<String> =
            candidates.iter().map(|c| normalize(c)).collect();
        for name in &stripped {
            let name_norm = normalize(name);
            if normalized_candidates.iter().any(|c| *c == name_norm) {
                return true;
            }
        }

        let preset_core = core_name(&normalize(preset_id));
        stripped.iter().any(|name| {
            let name_norm = normalize(name);
            cores_overlap(&preset_core, &core_name(&name_norm))
                || name_norm.contains(&normalize(preset_id))
                || normalize(preset_id).contains(&name_norm)
        })
    }
}

/// Lower-case and strip `-`, `_`, `.`, and spaces.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Strip serialization suffixes from an already-normalized name until none
/// remain.
pub fn core_name(normalized: &str) -> String {
    let mut core = normalized;
    loop {
        let before = core;
        for suffix in CORE_NAME_SUFFIXES {
            if let Some(stripped) = core.strip_suffix(suffix) {
                core = stripped;
            }
        }
        if core == before {
            break;
        }
    }
    core.to_string()
}

/// Trim a known model file extension, if present.
pub fn strip_model_extension(name: &str) -> &str {
    for ext in MODEL_FILE_EXTENSIONS {
        if let Some(stripped) = name.strip_suffix(ext) {
            return stripped;
        }
    }
    name
}

fn cores_overlap(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a == b || a.contains(b) || b.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, i64)]) -> TelemetrySnapshot {
        entries
            .iter()
            .map(|(name, workers)| {
                (
                    *name,
                    TelemetryEntry {
                        workers: *workers,
                        queued: 3,
                        eta: 12.0,
                        performance: 1.0,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn exact_match_is_case_sensitive_first() {
        let resolver = Resolver::new();
        let snap = snapshot(&[("FLUX.1-dev", 4)]);
        let (stage, entry) = resolver.resolve("FLUX.1-dev", &snap).unwrap();
        assert_eq!(stage, MatchStage::Exact);
        assert_eq!(entry.workers, 4);
    }

    #[test]
    fn exact_match_falls_back_to_case_insensitive() {
        let resolver = Resolver::new();
        let snap = snapshot(&[("flux.1-dev", 2)]);
        let (stage, _) = resolver.resolve("FLUX.1-dev", &snap).unwrap();
        assert_eq!(stage, MatchStage::Exact);
    }

    #[test]
    fn alias_resolves_fp8_scaled_variant() {
        let resolver = Resolver::new();
        let snap = snapshot(&[("flux1-krea-dev_fp8_scaled", 7)]);
        let (stage, entry) = resolver.resolve("flux.1-krea-dev", &snap).unwrap();
        assert_eq!(stage, MatchStage::Alias);
        assert_eq!(entry.workers, 7);
    }

    #[test]
    fn reverse_alias_reaches_sibling_spellings() {
        let resolver = Resolver::new();
        // "krea" is declared as an alias of flux.1-krea-dev; resolving the
        // alias itself must reach the canonical telemetry key.
        let snap = snapshot(&[("flux.1-krea-dev", 1)]);
        let (stage, _) = resolver.resolve("krea", &snap).unwrap();
        assert_eq!(stage, MatchStage::ReverseAlias);
    }

    #[test]
    fn normalized_match_ignores_separators() {
        let resolver = Resolver::new();
        let snap = snapshot(&[("juggernaut_xl", 2)]);
        let (stage, _) = resolver.resolve("Juggernaut XL", &snap).unwrap();
        assert_eq!(stage, MatchStage::Normalized);
    }

    #[test]
    fn fuzzy_core_strips_stacked_suffixes() {
        let resolver = Resolver::new();
        // No alias row for this spelling; only the suffix-stripped core
        // names overlap.
        let snap = snapshot(&[("chroma_fp8_scaled", 5)]);
        let (stage, entry) = resolver.resolve("Chroma", &snap).unwrap();
        assert_eq!(stage, MatchStage::FuzzyCore);
        assert_eq!(entry.workers, 5);
    }

    #[test]
    fn unmatched_preset_resolves_to_none() {
        let resolver = Resolver::new();
        let snap = snapshot(&[("stable_diffusion", 3)]);
        assert!(resolver.resolve("wan2.2-t2v-a14b", &snap).is_none());
    }

    #[test]
    fn offline_means_zero_workers() {
        let entry = TelemetryEntry {
            workers: 0,
            queued: 40,
            ..TelemetryEntry::default()
        };
        assert!(!entry.is_online());
        assert!(TelemetryEntry { workers: 1, ..entry }.is_online());
    }

    #[test]
    fn normalize_strips_separators_and_case() {
        assert_eq!(normalize("FLUX.1-dev"), "flux1dev");
        assert_eq!(normalize("wan2.2_ti2v_5B"), "wan22ti2v5b");
        assert_eq!(normalize("SDXL 1.0"), "sdxl10");
    }

    #[test]
    fn core_name_strips_suffix_stacks() {
        assert_eq!(core_name("flux1kreadevfp8scaled"), "flux1kreadev");
        assert_eq!(core_name("chromafp16"), "chroma");
        assert_eq!(core_name("modelscaledcompact"), "model");
        assert_eq!(core_name("plain"), "plain");
    }

    #[test]
    fn recipe_filter_matches_by_file_name() {
        let resolver = Resolver::new();
        let names = vec!["flux1-krea-dev_fp8_scaled.safetensors".to_string()];
        assert!(resolver.matches_recipe("flux.1-krea-dev", &names));
        assert!(!resolver.matches_recipe("SDXL 1.0", &names));
    }

    #[test]
    fn recipe_filter_matches_grid_mapped_name() {
        let resolver = Resolver::new();
        let names = vec!["wan2_2_t2v_14b.safetensors".to_string()];
        assert!(resolver.matches_recipe("wan2.2-t2v-a14b", &names));
    }

    #[test]
    fn recipe_filter_fuzzy_core_containment() {
        let resolver = Resolver::new();
        let names = vec!["chroma_final_fp8.ckpt".to_string()];
        assert!(resolver.matches_recipe("Chroma", &names));
    }
}
