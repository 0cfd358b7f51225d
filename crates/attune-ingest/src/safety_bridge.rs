//! Translates a `SafetyOutcome` into `PlatformActions` calls and records
//! the action actually taken back onto each violation row (§4.4's
//! "EventIngest is responsible for translating the recommended action
//! into PlatformActions calls").

use attune_core::{GuildId, PlatformActions};
use attune_safety::{Action, SafetyOutcome};
use attune_store::StateStore;
use tracing::warn;

const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Apply `outcome`'s recommended action and persist `action_taken` on
/// every violation it produced. Returns `true` if the action suppresses
/// the author (mute/timeout/kick/ban) — in that case `ResponsePipeline`
/// must not run for this message.
pub async fn apply_outcome(
    actions: &dyn PlatformActions,
    store: &StateStore,
    guild_id: GuildId,
    outcome: &SafetyOutcome,
) -> bool {
    let reason = outcome
        .violations
        .iter()
        .map(|v| v.violation_type.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let (label, suppresses) = match outcome.recommended_action.action {
        Action::Warning => {
            if let Err(e) = actions.send_dm(outcome.target_user, &warning_text(&reason)).await {
                warn!(error = ?e, "failed to deliver safety warning dm");
            }
            ("warning", false)
        }
        Action::Mute | Action::Timeout => {
            let duration = outcome.recommended_action.duration_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
            if let Err(e) = actions.apply_timeout(outcome.target_user, guild_id, duration).await {
                warn!(error = ?e, "failed to apply timeout");
            }
            ("timeout", true)
        }
        Action::Kick => {
            if let Err(e) = actions.apply_kick(outcome.target_user, guild_id, &reason).await {
                warn!(error = ?e, "failed to apply kick");
            }
            ("kick", true)
        }
        Action::Ban => {
            let duration = outcome.recommended_action.duration_secs;
            if let Err(e) = actions.apply_ban(outcome.target_user, guild_id, duration, &reason).await {
                warn!(error = ?e, "failed to apply ban");
            }
            ("ban", true)
        }
    };

    for violation in &outcome.violations {
        if let Some(id) = violation.id {
            if let Err(e) = store.mark_violation_action(id, label) {
                warn!(error = %e, "failed to record action_taken on violation");
            }
        }
    }

    suppresses
}

fn warning_text(reason: &str) -> String {
    format!("You've received a warning for: {reason}. Please review the server rules.")
}
