use attune_core::{GuildId, UserId};
use sha2::{Digest, Sha256};

fn hash_hex(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)
}

pub fn sentiment_key(message: &str) -> String {
    format!("sentiment:{}", hash_hex(message))
}

pub fn topics_key(message: &str) -> String {
    format!("topics:{}", hash_hex(message))
}

pub fn response_key(guild_id: GuildId, user_id: UserId, message: &str) -> String {
    format!("response:{}:{}:{}", guild_id, user_id, hash_hex(message))
}

pub fn profile_key(user_id: UserId, guild_id: GuildId) -> String {
    format!("profile:{}:{}", user_id, guild_id)
}

/// ProviderRouter's response cache key (§4.7): `(guild, user,
/// hash(messages), modelCanonical, temperature, maxTokens)`.
pub fn request_key(
    guild_id: GuildId,
    user_id: UserId,
    messages_joined: &str,
    model_canonical: &str,
    temperature: f64,
    max_tokens: u32,
) -> String {
    let fingerprint = format!("{messages_joined}|{model_canonical}|{temperature}|{max_tokens}");
    format!(
        "response:{}:{}:{}",
        guild_id,
        user_id,
        hash_hex(&fingerprint)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_message_hashes_equal() {
        assert_eq!(sentiment_key("hello"), sentiment_key("hello"));
        assert_ne!(sentiment_key("hello"), sentiment_key("world"));
    }

    #[test]
    fn response_key_scopes_by_guild_and_user() {
        let a = response_key(GuildId::new(1), UserId::new(2), "hi");
        let b = response_key(GuildId::new(1), UserId::new(3), "hi");
        assert_ne!(a, b);
    }
}
