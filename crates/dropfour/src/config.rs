//! Top-level configuration.

use dropfour_matchmaking::MatchmakingConfig;
use serde::{Deserialize, Serialize};

/// Settings for an [`Orchestrator`](crate::Orchestrator), one field per
/// layer that has any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropfourConfig {
    pub matchmaking: MatchmakingConfig,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_dropfour_config_default() {
        let config = DropfourConfig::default();
        assert_eq!(config.matchmaking.app_id, "dropfour");
        assert_eq!(config.matchmaking.announce_delay, Duration::from_millis(500));
        assert_eq!(config.matchmaking.peer_wait_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_dropfour_config_survives_json() {
        let config = DropfourConfig {
            matchmaking: MatchmakingConfig {
                app_id: "tests".into(),
                ..MatchmakingConfig::default()
            },
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: DropfourConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back, config);
        assert!(json.contains("\"app_id\":\"tests\""));
    }
}
