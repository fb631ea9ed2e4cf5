//! Model-aware prompt augmentation.
//!
//! The positive prompt gets a per-category quality suffix inside a
//! 512-character budget; an empty negative prompt is replaced by a curated
//! per-category default. Augmentation is idempotent: a prompt that already
//! carries its suffix is left alone, so a retried submission is not
//! double-augmented.

/// Character budget for both prompts on the wire.
pub const MAX_PROMPT_LENGTH: usize = 512;

/// Model family detected from the preset id, used to pick augmentation
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCategory {
    FluxImage,
    SdxlImage,
    WanVideo,
    LtxVideo,
    Generic,
}

/// Detect the model category from a preset id by substring.
pub fn detect_category(model_id: &str) -> ModelCategory {
    let lower = model_id.to_lowercase();
    if lower.contains("flux") {
        ModelCategory::FluxImage
    } else if lower.contains("sdxl") || lower.contains("stable-diffusion-xl") {
        ModelCategory::SdxlImage
    } else if lower.contains("wan") {
        ModelCategory::WanVideo
    } else if lower.contains("ltxv") || lower.contains("ltx") {
        ModelCategory::LtxVideo
    } else {
        ModelCategory::Generic
    }
}

/// Quality suffix appended to the positive prompt.
fn quality_suffix(category: ModelCategory) -> &'static str {
    match category {
        ModelCategory::FluxImage => "high quality, detailed, sharp focus",
        ModelCategory::SdxlImage => "masterpiece, best quality, highly detailed",
        ModelCategory::WanVideo => "smooth motion, cinematic, high quality video",
        ModelCategory::LtxVideo => "smooth motion, high quality, detailed",
        ModelCategory::Generic => "high quality",
    }
}

/// Curated negative prompt used when the caller supplied none.
pub fn default_negative_prompt(category: ModelCategory) -> &'static str {
    match category {
        ModelCategory::FluxImage => {
            "blurry, low quality, distorted, deformed, ugly, bad anatomy, watermark, signature, text"
        }
        ModelCategory::SdxlImage => {
            "blurry, low quality, distorted, deformed, ugly, bad anatomy, bad hands, watermark, \
             signature, text, cropped"
        }
        ModelCategory::WanVideo => {
            "static, frozen, blurry, low quality, distorted, jittery, flickering, watermark"
        }
        ModelCategory::LtxVideo => {
            "static, blurry, low quality, distorted, artifacts, flickering, watermark, text"
        }
        ModelCategory::Generic => "blurry, low quality, distorted, watermark",
    }
}

/// Append the category quality suffix to a prompt, within budget.
///
/// Idempotent: a prompt already containing the suffix (case-insensitive)
/// is only truncated, never re-augmented.
pub fn enhance_prompt(prompt: &str, category: ModelCategory) -> String {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return String::new();
    }

    let suffix = quality_suffix(category);
    if prompt.to_lowercase().contains(&suffix.to_lowercase()) {
        return truncate_prompt(prompt, MAX_PROMPT_LENGTH);
    }

    if prompt.len() >= MAX_PROMPT_LENGTH {
        return truncate_prompt(prompt, MAX_PROMPT_LENGTH);
    }

    // Append only when the whole result fits; otherwise user content wins.
    if prompt.len() + suffix.len() + 2 <= MAX_PROMPT_LENGTH {
        return format!("{prompt}, {suffix}");
    }

    truncate_prompt(prompt, MAX_PROMPT_LENGTH)
}

/// Truncate a prompt at a word boundary where possible.
///
/// Falls back to a hard cut if the last space sits before two thirds of the
/// budget. Trailing spaces, commas, and periods are trimmed.
pub fn truncate_prompt(prompt: &str, max_len: usize) -> String {
    if prompt.len() <= max_len {
        return prompt.to_string();
    }

    // Hard cut on a char boundary at or below the limit.
    let mut cut = max_len;
    while !prompt.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut truncated = &prompt[..cut];

    if let Some(last_space) = truncated.rfind(' ') {
        if last_space > max_len * 2 / 3 {
            truncated = &truncated[..last_space];
        }
    }

    truncated.trim_end_matches([' ', ',', '.']).to_string()
}

/// Process both prompts for a job: augment the positive, default the
/// negative, keep both within budget.
pub fn process_prompts(prompt: &str, negative_prompt: &str, model_id: &str) -> (String, String) {
    let category = detect_category(model_id);

    let enhanced = enhance_prompt(prompt, category);

    let negative = negative_prompt.trim();
    let negative = if negative.is_empty() {
        default_negative_prompt(category).to_string()
    } else {
        truncate_prompt(negative, MAX_PROMPT_LENGTH)
    };

    (enhanced, negative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_detection_by_substring() {
        assert_eq!(detect_category("flux.1-krea-dev"), ModelCategory::FluxImage);
        assert_eq!(detect_category("SDXL 1.0"), ModelCategory::SdxlImage);
        assert_eq!(detect_category("wan2.2-t2v-a14b"), ModelCategory::WanVideo);
        assert_eq!(detect_category("ltxv"), ModelCategory::LtxVideo);
        assert_eq!(detect_category("Deliberate"), ModelCategory::Generic);
    }

    #[test]
    fn suffix_is_appended_once() {
        let enhanced = enhance_prompt("a cat on a roof", ModelCategory::FluxImage);
        assert_eq!(enhanced, "a cat on a roof, high quality, detailed, sharp focus");
    }

    #[test]
    fn enhancement_is_idempotent() {
        let once = enhance_prompt("a cat on a roof", ModelCategory::FluxImage);
        let twice = enhance_prompt(&once, ModelCategory::FluxImage);
        assert_eq!(once, twice);
    }

    #[test]
    fn idempotence_is_case_insensitive() {
        let prompt = "a cat, HIGH QUALITY, DETAILED, SHARP FOCUS";
        assert_eq!(enhance_prompt(prompt, ModelCategory::FluxImage), prompt);
    }

    #[test]
    fn long_prompt_keeps_user_content_over_suffix() {
        let long = "word ".repeat(101); // 505 chars, no room for a suffix
        let enhanced = enhance_prompt(&long, ModelCategory::SdxlImage);
        assert!(enhanced.len() <= MAX_PROMPT_LENGTH);
        assert!(!enhanced.contains("masterpiece"));
    }

    #[test]
    fn truncation_prefers_word_boundary() {
        let prompt = "alpha beta gamma delta epsilon";
        let truncated = truncate_prompt(prompt, 20);
        assert_eq!(truncated, "alpha beta gamma");
    }

    #[test]
    fn truncation_trims_trailing_punctuation() {
        let prompt = format!("{}, ", "x".repeat(30));
        let truncated = truncate_prompt(&prompt, 31);
        assert_eq!(truncated, "x".repeat(30));
    }

    #[test]
    fn empty_negative_gets_category_default() {
        let (_, negative) = process_prompts("a dog", "", "wan2.2-t2v-a14b");
        assert_eq!(
            negative,
            default_negative_prompt(ModelCategory::WanVideo)
        );
    }

    #[test]
    fn supplied_negative_is_kept() {
        let (_, negative) = process_prompts("a dog", "cartoonish", "SDXL 1.0");
        assert_eq!(negative, "cartoonish");
    }

    #[test]
    fn empty_prompt_stays_empty() {
        assert_eq!(enhance_prompt("   ", ModelCategory::Generic), "");
    }
}
