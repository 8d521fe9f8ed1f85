//! Default policy values and the messenger configuration record.

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: u32 = 6;

/// Terms masked by the default content filter, in matching order.
pub const DEFAULT_FILTER_TERMS: [&str; 3] = ["bad", "hate", "stupid"];

/// Token that replaces each denylisted match.
pub const DEFAULT_FILTER_MASK: &str = "***";

/// Policy knobs for a [`crate::Messenger`].
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct MessengerConfig {
    /// Minimum accepted password length, in characters.
    pub min_password_length: u32,
    /// Ordered denylist applied to every outgoing message.
    pub filter_terms: Vec<String>,
    /// Fixed token substituted for each denylisted match.
    pub filter_mask: String,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            min_password_length: MIN_PASSWORD_LENGTH,
            filter_terms: DEFAULT_FILTER_TERMS
                .iter()
                .map(ToString::to_string)
                .collect(),
            filter_mask: DEFAULT_FILTER_MASK.to_string(),
        }
    }
}

/// Returns the default messenger configuration.
#[uniffi::export]
#[must_use]
pub fn default_messenger_config() -> MessengerConfig {
    MessengerConfig::default()
}
