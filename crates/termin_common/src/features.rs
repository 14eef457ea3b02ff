//! Runtime feature checks for the Termin application.
//!
//! A feature is enabled when its `use_*` flag is set and its config section
//! is present, or for sections without a flag, when the required value is set.

use termin_config::AppConfig;

/// Check if a feature is enabled at runtime based on configuration.
///
/// # Arguments
///
/// * `use_feature` - The configuration flag that enables the feature
/// * `feature_config` - The configuration section for the feature
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

/// Notifications are delivered to the webhook only when flagged on and configured.
pub fn is_notifications_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_notifications, config.notifications.as_ref())
        && config
            .notifications
            .as_ref()
            .and_then(|n| n.webhook_url.as_ref())
            .is_some()
}

/// Admin routes require a configured API key.
pub fn is_admin_enabled(config: &AppConfig) -> bool {
    config
        .admin
        .as_ref()
        .and_then(|a| a.api_key.as_ref())
        .is_some_and(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termin_config::{AdminConfig, NotificationConfig};

    #[test]
    fn notifications_need_flag_and_webhook() {
        let mut config = AppConfig::default();
        assert!(!is_notifications_enabled(&config));

        config.notifications = Some(NotificationConfig {
            webhook_url: Some("http://localhost:9000/hook".into()),
            admin_emails: vec![],
        });
        assert!(!is_notifications_enabled(&config));

        config.use_notifications = true;
        assert!(is_notifications_enabled(&config));
    }

    #[test]
    fn admin_needs_non_empty_key() {
        let mut config = AppConfig::default();
        config.admin = Some(AdminConfig {
            api_key: Some(String::new()),
            ..AdminConfig::default()
        });
        assert!(!is_admin_enabled(&config));

        config.admin = Some(AdminConfig {
            api_key: Some("key".into()),
            ..AdminConfig::default()
        });
        assert!(is_admin_enabled(&config));
    }
}
