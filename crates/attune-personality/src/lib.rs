//! `attune-personality` — the PersonalityModel from §4.3: a pure
//! computation layer over the trait vectors `attune-store` persists.
//! Nothing here talks to SQLite directly; callers pass in the
//! `GuildPersonality`/`UserOverride`/`AdaptationEvent` rows they already
//! loaded.

mod style;

pub use style::{style_directives, EmojiAllowance, EmpathyPrefix, StyleDirectives};

use attune_core::{clamp_i64, PersonalityMode, UserId};
use attune_store::types::{AdaptationEvent, PartialTraits, PersonalityTraits, UserOverride};

pub fn defaults() -> PersonalityTraits {
    PersonalityTraits::defaults()
}

/// Resolve the effective profile for a single request (§3): guild
/// traits (or defaults), overlaid by non-null user-override fields,
/// then every active adaptation delta in ascending priority order.
/// Never persisted.
pub fn effective(
    guild_traits: Option<&PersonalityTraits>,
    user_override: Option<&UserOverride>,
    mut active_adaptations: Vec<&AdaptationEvent>,
) -> PersonalityTraits {
    let mut traits = guild_traits.copied().unwrap_or_else(PersonalityTraits::defaults);

    if let Some(ov) = user_override {
        if let Some(v) = ov.humor {
            traits.humor = v;
        }
        if let Some(v) = ov.honesty {
            traits.honesty = v;
        }
        if let Some(v) = ov.formality {
            traits.formality = v;
        }
        if let Some(v) = ov.empathy {
            traits.empathy = v;
        }
        if let Some(v) = ov.strictness {
            traits.strictness = v;
        }
        if let Some(v) = ov.initiative {
            traits.initiative = v;
        }
    }

    active_adaptations.sort_by_key(|e| e.priority);
    for event in active_adaptations {
        let delta = &event.delta_profile;
        traits.humor += delta.humor;
        traits.honesty += delta.honesty;
        traits.formality += delta.formality;
        traits.empathy += delta.empathy;
        traits.strictness += delta.strictness;
        traits.initiative += delta.initiative;
        if let Some(mode) = delta.mode_override {
            traits.mode = mode;
        }
        traits.clamp();
    }

    traits.clamp();
    traits
}

/// Validate and apply a partial guild-trait update, bumping `version`
/// (§4.3). Fields absent from `partial` are left untouched.
pub fn set_guild(
    current: Option<&PersonalityTraits>,
    partial: &PartialTraits,
    updated_by: UserId,
) -> PersonalityTraits {
    let mut traits = current.copied().unwrap_or_else(PersonalityTraits::defaults);
    apply_partial(&mut traits, partial);
    traits.version += 1;
    let _ = updated_by;
    traits
}

/// Merge a partial update into a user override; absent fields clear
/// that field's override (§4.3).
pub fn set_user_override(partial: &PartialTraits) -> UserOverride {
    UserOverride {
        humor: partial.humor,
        honesty: partial.honesty,
        formality: partial.formality,
        empathy: partial.empathy,
        strictness: partial.strictness,
        initiative: partial.initiative,
        updated_at: String::new(),
    }
}

fn apply_partial(traits: &mut PersonalityTraits, partial: &PartialTraits) {
    if let Some(v) = partial.humor {
        traits.humor = clamp_i64(v, 0, 100);
    }
    if let Some(v) = partial.honesty {
        traits.honesty = clamp_i64(v, 0, 100);
    }
    if let Some(v) = partial.formality {
        traits.formality = clamp_i64(v, 0, 100);
    }
    if let Some(v) = partial.empathy {
        traits.empathy = clamp_i64(v, 0, 100);
    }
    if let Some(v) = partial.strictness {
        traits.strictness = clamp_i64(v, 0, 100);
    }
    if let Some(v) = partial.initiative {
        traits.initiative = clamp_i64(v, 0, 100);
    }
    if let Some(mode) = partial.mode {
        traits.mode = mode;
    }
}

pub fn mode_label(mode: PersonalityMode) -> &'static str {
    match mode {
        PersonalityMode::Social => "social",
        PersonalityMode::Security => "security",
        PersonalityMode::MissionControl => "mission_control",
        PersonalityMode::Developer => "developer",
        PersonalityMode::Empathy => "empathy",
        PersonalityMode::Adaptive => "adaptive",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::GuildId;
    use attune_store::types::TraitDelta;

    #[test]
    fn effective_falls_back_to_defaults() {
        let traits = effective(None, None, vec![]);
        assert_eq!(traits.humor, 50);
        assert_eq!(traits.mode, PersonalityMode::Social);
    }

    #[test]
    fn user_override_wins_over_guild() {
        let guild = PersonalityTraits::defaults();
        let ov = UserOverride {
            humor: Some(99),
            ..Default::default()
        };
        let traits = effective(Some(&guild), Some(&ov), vec![]);
        assert_eq!(traits.humor, 99);
        assert_eq!(traits.honesty, guild.honesty);
    }

    #[test]
    fn adaptation_deltas_apply_in_priority_order_and_clamp() {
        let guild = PersonalityTraits::defaults();
        let e1 = AdaptationEvent {
            id: "a".into(),
            guild_id: GuildId::new(1),
            signal: "spam_spike".into(),
            payload: serde_json::json!({}),
            delta_profile: TraitDelta {
                humor: -30,
                strictness: 25,
                initiative: 10,
                mode_override: Some(PersonalityMode::Security),
                ..Default::default()
            },
            applied_at: String::new(),
            expires_at: None,
            status: attune_store::types::AdaptationStatus::Active,
            priority: 50,
            reason: None,
            applied_by: "auto-adapt".into(),
        };
        let traits = effective(Some(&guild), None, vec![&e1]);
        assert_eq!(traits.humor, 20);
        assert_eq!(traits.mode, PersonalityMode::Security);
    }

    #[test]
    fn set_guild_bumps_version() {
        let partial = PartialTraits {
            humor: Some(10),
            ..Default::default()
        };
        let traits = set_guild(None, &partial, UserId::new(1));
        assert_eq!(traits.humor, 10);
        assert_eq!(traits.version, 2);
    }
}
