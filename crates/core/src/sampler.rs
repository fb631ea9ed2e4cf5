//! Sampler-name translation from the UI vocabulary to the grid's.
//!
//! The grid expects `k_`-prefixed sampler names; the browser sends ComfyUI
//! spellings. Unknown names map to `k_euler` instead of failing the job —
//! a silent-substitution policy that favors throughput over fidelity.

/// Sampler the grid falls back to for any name it does not know.
pub const FALLBACK_SAMPLER: &str = "k_euler";

const SAMPLER_MAP: &[(&str, &str)] = &[
    ("uni_pc", "dpmsolver"),
    ("unipc", "dpmsolver"),
    ("uni_pc_bh2", "dpmsolver"),
    ("dpm_2", "k_dpm_2"),
    ("dpm_2_ancestral", "k_dpm_2_a"),
    ("euler", "k_euler"),
    ("euler_ancestral", "k_euler_a"),
    ("heun", "k_heun"),
    ("lms", "k_lms"),
    ("dpm_fast", "k_dpm_fast"),
    ("dpm_adaptive", "k_dpm_adaptive"),
    ("dpmpp_2s_ancestral", "k_dpmpp_2s_a"),
    ("dpmpp_2m", "k_dpmpp_2m"),
    ("dpmpp_sde", "k_dpmpp_sde"),
    ("ddim", "DDIM"),
    // Already in grid format: pass through.
    ("k_euler", "k_euler"),
    ("k_euler_a", "k_euler_a"),
    ("k_dpm_2", "k_dpm_2"),
    ("k_dpm_2_a", "k_dpm_2_a"),
    ("k_heun", "k_heun"),
    ("k_lms", "k_lms"),
    ("k_dpm_fast", "k_dpm_fast"),
    ("k_dpm_adaptive", "k_dpm_adaptive"),
    ("k_dpmpp_2s_a", "k_dpmpp_2s_a"),
    ("k_dpmpp_2m", "k_dpmpp_2m"),
    ("k_dpmpp_sde", "k_dpmpp_sde"),
    ("dpmsolver", "dpmsolver"),
    ("lcm", "lcm"),
];

/// Map a UI sampler name to the grid vocabulary, case-insensitively.
pub fn map_sampler_name(sampler: &str) -> &'static str {
    let lower = sampler.to_lowercase();
    SAMPLER_MAP
        .iter()
        .find(|(ui, _)| *ui == lower)
        .map(|(_, grid)| *grid)
        .unwrap_or(FALLBACK_SAMPLER)
}
