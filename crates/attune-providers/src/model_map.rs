//! Model-ID normalization (§4.7): display names like "Grok Code Fast 1" to
//! canonical `vendor/model-id` strings, via an exact table then a fuzzy
//! substring cascade, grounded on the original direct-mapping table.

const EXACT_TABLE: &[(&str, &str)] = &[
    ("Grok Code Fast 1", "x-ai/grok-code-fast-1"),
    ("Grok 4 Fast", "x-ai/grok-4-fast"),
    ("Grok 4", "x-ai/grok-4"),
    ("Grok 3", "x-ai/grok-3"),
    ("GPT-4", "openai/gpt-4"),
    ("GPT-4 Turbo", "openai/gpt-4-turbo"),
    ("GPT-3.5 Turbo", "openai/gpt-3.5-turbo"),
    ("Claude 3 Haiku", "anthropic/claude-3-haiku"),
    ("Claude 3 Sonnet", "anthropic/claude-3-sonnet"),
    ("Claude 3 Opus", "anthropic/claude-3-opus"),
    ("Gemini Pro", "google/gemini-pro"),
    ("Gemini 1.5 Pro", "google/gemini-1.5-pro"),
];

/// Normalize a caller-supplied model identifier to `vendor/model-id`.
/// Falls back to `safe_default` when nothing matches.
pub fn normalize(input: &str, safe_default: &str) -> String {
    if input.contains('/') {
        return input.to_string();
    }

    for (display, canonical) in EXACT_TABLE {
        if display.eq_ignore_ascii_case(input) {
            return canonical.to_string();
        }
    }

    let lower = input.to_lowercase();
    if let Some(id) = fuzzy_cascade(&lower) {
        return id.to_string();
    }

    safe_default.to_string()
}

fn fuzzy_cascade(lower: &str) -> Option<&'static str> {
    let has = |s: &str| lower.contains(s);

    if has("grok") && has("code") && has("fast") {
        return Some("x-ai/grok-code-fast-1");
    }
    if has("grok") && has("4") && has("fast") {
        return Some("x-ai/grok-4-fast");
    }
    if has("grok") && has("4") {
        return Some("x-ai/grok-4");
    }
    if has("grok") && has("3") {
        return Some("x-ai/grok-3");
    }
    if (has("gpt-4") || has("gpt4")) && has("turbo") {
        return Some("openai/gpt-4-turbo");
    }
    if has("gpt-4") || has("gpt4") {
        return Some("openai/gpt-4");
    }
    if has("gpt-3.5") || has("gpt3.5") {
        return Some("openai/gpt-3.5-turbo");
    }
    if has("claude") && has("haiku") {
        return Some("anthropic/claude-3-haiku");
    }
    if has("claude") && has("sonnet") {
        return Some("anthropic/claude-3-sonnet");
    }
    if has("claude") && has("opus") {
        return Some("anthropic/claude-3-opus");
    }
    if has("claude") {
        return Some("anthropic/claude-3-haiku");
    }
    None
}

/// Reverse lookup for operator-facing logs and `/model`-style surfaces
/// layered on top of this core. Returns the canonical id itself when no
/// display name maps to it.
pub fn display_name(canonical_id: &str) -> String {
    for (display, canonical) in EXACT_TABLE {
        if *canonical == canonical_id {
            return display.to_string();
        }
    }
    canonical_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive() {
        assert_eq!(
            normalize("grok code fast 1", "anthropic/claude-3-haiku"),
            "x-ai/grok-code-fast-1"
        );
    }

    #[test]
    fn already_slashed_passes_through() {
        assert_eq!(
            normalize("custom/whatever-model", "anthropic/claude-3-haiku"),
            "custom/whatever-model"
        );
    }

    #[test]
    fn fuzzy_cascade_matches_gpt_4_turbo() {
        assert_eq!(
            normalize("GPT4-Turbo-Preview", "anthropic/claude-3-haiku"),
            "openai/gpt-4-turbo"
        );
    }

    #[test]
    fn unmatched_falls_back_to_safe_default() {
        assert_eq!(
            normalize("some-totally-unknown-model", "anthropic/claude-3-haiku"),
            "anthropic/claude-3-haiku"
        );
    }

    #[test]
    fn display_name_roundtrips_known_canonical() {
        assert_eq!(display_name("x-ai/grok-4"), "Grok 4");
        assert_eq!(display_name("vendor/unknown"), "vendor/unknown");
    }
}
