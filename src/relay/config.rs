//! Relay configuration

/// How relayed messages pick their recipients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutMode {
    /// Deliver only to the peers a message is meant for: frames, status
    /// updates and client list changes to viewers, control commands to the
    /// addressed client
    #[default]
    Targeted,

    /// Deliver to every other open connection and let recipients filter by
    /// the embedded client id
    Broadcast,
}

impl std::str::FromStr for FanoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "targeted" => Ok(FanoutMode::Targeted),
            "broadcast" => Ok(FanoutMode::Broadcast),
            other => Err(format!("unknown fan-out mode: {}", other)),
        }
    }
}

/// Relay protocol options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Recipient selection for relayed messages
    pub fanout: FanoutMode,

    /// Answer every accepted frame with `stream-received`
    pub ack_frames: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            fanout: FanoutMode::Targeted,
            ack_frames: true,
        }
    }
}

impl RelayConfig {
    /// Set the fan-out mode
    pub fn fanout(mut self, mode: FanoutMode) -> Self {
        self.fanout = mode;
        self
    }

    /// Enable or disable frame acknowledgements
    pub fn ack_frames(mut self, enabled: bool) -> Self {
        self.ack_frames = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.fanout, FanoutMode::Targeted);
        assert!(config.ack_frames);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RelayConfig::default()
            .fanout(FanoutMode::Broadcast)
            .ack_frames(false);

        assert_eq!(config.fanout, FanoutMode::Broadcast);
        assert!(!config.ack_frames);
    }

    #[test]
    fn test_parse_fanout_mode() {
        assert_eq!("targeted".parse::<FanoutMode>(), Ok(FanoutMode::Targeted));
        assert_eq!("Broadcast".parse::<FanoutMode>(), Ok(FanoutMode::Broadcast));
        assert!("multicast".parse::<FanoutMode>().is_err());
    }
}
