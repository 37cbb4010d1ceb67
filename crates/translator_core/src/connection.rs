use crate::log_stream::Tone;
use crate::task::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Status pill next to the log panel. Transport state is shown until a task
/// starts translating; from then on the job state takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelIndicator {
    Connected,
    Disconnected,
    Translating,
    Completed,
}

impl ChannelIndicator {
    pub fn derive(connection: ConnectionState, stage: Stage, busy: bool) -> Self {
        match (connection, stage) {
            (ConnectionState::Disconnected, _) => ChannelIndicator::Disconnected,
            (_, Stage::Completed) => ChannelIndicator::Completed,
            (_, Stage::Translating) if busy => ChannelIndicator::Translating,
            _ => ChannelIndicator::Connected,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChannelIndicator::Connected => "Connected",
            ChannelIndicator::Disconnected => "Disconnected",
            ChannelIndicator::Translating => "Translating",
            ChannelIndicator::Completed => "Completed",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            ChannelIndicator::Connected | ChannelIndicator::Completed => Tone::Green,
            ChannelIndicator::Disconnected => Tone::Red,
            ChannelIndicator::Translating => Tone::Yellow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnection_wins_over_job_state() {
        let indicator = ChannelIndicator::derive(ConnectionState::Disconnected, Stage::Completed, false);
        assert_eq!(indicator, ChannelIndicator::Disconnected);
        assert_eq!(indicator.tone(), Tone::Red);
    }

    #[test]
    fn busy_only_after_acceptance() {
        let pending = ChannelIndicator::derive(ConnectionState::Connected, Stage::Translating, false);
        let accepted = ChannelIndicator::derive(ConnectionState::Connected, Stage::Translating, true);
        assert_eq!(pending, ChannelIndicator::Connected);
        assert_eq!(accepted, ChannelIndicator::Translating);
        assert_eq!(accepted.tone(), Tone::Yellow);
    }
}
