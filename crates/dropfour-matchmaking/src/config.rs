//! Matchmaking configuration.

use std::time::Duration;

use dropfour_protocol::SessionId;
use dropfour_transport::ChannelId;
use serde::{Deserialize, Serialize};

/// Settings for one matchmaker.
///
/// ```rust
/// use std::time::Duration;
/// use dropfour_matchmaking::MatchmakingConfig;
///
/// let config = MatchmakingConfig {
///     announce_delay: Duration::ZERO,
///     ..MatchmakingConfig::default()
/// };
/// assert_eq!(config.lobby().as_str(), "dropfour/dropfour-global-lobby");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakingConfig {
    /// Namespace prefix for every channel this application joins.
    pub app_id: String,

    /// Name of the shared discovery channel.
    pub lobby_channel: String,

    /// Pause between joining the lobby and the first broadcast
    /// announcement, to let channel membership settle. Only affects how
    /// fast peers find each other, never who becomes host.
    pub announce_delay: Duration,

    /// How long to wait for the counterpart to appear in the private
    /// channel once elected.
    pub peer_wait_timeout: Duration,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            app_id: "dropfour".to_string(),
            lobby_channel: "dropfour-global-lobby".to_string(),
            announce_delay: Duration::from_millis(500),
            peer_wait_timeout: Duration::from_secs(10),
        }
    }
}

impl MatchmakingConfig {
    /// The discovery channel id.
    pub fn lobby(&self) -> ChannelId {
        ChannelId::namespaced(&self.app_id, &self.lobby_channel)
    }

    /// The private channel id for a session.
    pub fn session_channel(&self, session_id: &SessionId) -> ChannelId {
        ChannelId::namespaced(&self.app_id, session_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = MatchmakingConfig::default();
        assert_eq!(config.announce_delay, Duration::from_millis(500));
        assert_eq!(config.peer_wait_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_session_channel_is_namespaced_by_app() {
        let config = MatchmakingConfig {
            app_id: "test-app".into(),
            ..MatchmakingConfig::default()
        };
        let id = config.session_channel(&SessionId::from_raw("abc"));
        assert_eq!(id.as_str(), "test-app/abc");
    }
}
