//! # PreferenceEditor
//!
//! Edits an in-memory copy of the notification preferences and persists the
//! whole set in one request. SMS can only be switched on for security alerts
//! and monthly digests exist only for marketing; both rules hold on load, on
//! edit and on save, whatever the backend accepts.

use std::sync::Arc;

use dp_core::{
    AppError, CategoryPreference, Channel, Credential, Frequency, Notice, NotificationCategory,
    NotificationPreferences, Notifier, PreferencesApi,
};
use tokio::sync::RwLock;

use crate::sequencer::Refresh;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub preferences: NotificationPreferences,
    /// True once a load succeeded; until then `preferences` holds defaults
    pub loaded: bool,
    pub dirty: bool,
    pub saving: bool,
}

pub struct PreferenceEditor {
    api: Arc<dyn PreferencesApi>,
    credential: Credential,
    notifier: Arc<dyn Notifier>,
    state: RwLock<EditorState>,
}

impl PreferenceEditor {
    pub fn new(
        api: Arc<dyn PreferencesApi>,
        credential: Credential,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            credential,
            notifier,
            state: RwLock::new(EditorState::default()),
        }
    }

    pub async fn snapshot(&self) -> EditorState {
        self.state.read().await.clone()
    }

    /// Whether the control for `channel` is enabled for `category`.
    pub fn is_editable(category: NotificationCategory, channel: Channel) -> bool {
        channel != Channel::Sms || category.sms_allowed()
    }

    pub fn frequency_options(category: NotificationCategory) -> &'static [Frequency] {
        category.frequencies()
    }

    pub async fn load(&self) -> Refresh {
        let result = self.api.load_preferences(&self.credential).await;
        let mut state = self.state.write().await;
        match result {
            Ok(preferences) => {
                *state = EditorState {
                    preferences: preferences.normalized(),
                    loaded: true,
                    dirty: false,
                    saving: false,
                };
                Refresh::Applied
            }
            Err(err) => {
                let message = err.user_message("We couldn't load your notification settings.");
                *state = EditorState::default();
                drop(state);
                self.notifier.notify(Notice::error(message));
                Refresh::Failed(err)
            }
        }
    }

    pub async fn set_channel(
        &self,
        category: NotificationCategory,
        channel: Channel,
        enabled: bool,
    ) -> Result<(), AppError> {
        if enabled && !Self::is_editable(category, channel) {
            return Err(AppError::Validation(format!(
                "SMS notifications are only available for {}.",
                NotificationCategory::Security.label().to_lowercase()
            )));
        }
        self.edit(category, |pref| pref.set_channel(channel, enabled))
            .await;
        Ok(())
    }

    pub async fn set_frequency(
        &self,
        category: NotificationCategory,
        frequency: Frequency,
    ) -> Result<(), AppError> {
        if !category.frequencies().contains(&frequency) {
            return Err(AppError::Validation(format!(
                "{} can't be delivered {}.",
                category.label(),
                frequency
            )));
        }
        self.edit(category, |pref| pref.frequency = frequency).await;
        Ok(())
    }

    /// Persists the whole preference set in a single request.
    pub async fn save(&self) -> Result<(), AppError> {
        let preferences = {
            let mut state = self.state.write().await;
            if state.saving {
                return Err(AppError::Validation("A save is already in progress.".into()));
            }
            state.saving = true;
            state.preferences.clone().normalized()
        };

        let result = self
            .api
            .save_preferences(&self.credential, &preferences)
            .await;

        let mut state = self.state.write().await;
        state.saving = false;
        match result {
            Ok(stored) => {
                state.preferences = stored.normalized();
                state.loaded = true;
                state.dirty = false;
                drop(state);
                tracing::info!("notification preferences saved");
                self.notifier
                    .notify(Notice::success("Notification preferences saved."));
                Ok(())
            }
            Err(err) => {
                drop(state);
                tracing::warn!(error = %err, "saving notification preferences failed");
                self.notifier.notify(Notice::error(
                    err.user_message("We couldn't save your notification settings."),
                ));
                Err(err)
            }
        }
    }

    async fn edit(&self, category: NotificationCategory, apply: impl FnOnce(&mut CategoryPreference)) {
        let mut state = self.state.write().await;
        let mut pref = state.preferences.get(category);
        apply(&mut pref);
        if pref.sanitized(category) != state.preferences.get(category) {
            state.preferences.set(category, pref);
            state.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use dp_core::MockPreferencesApi;

    use super::*;
    use crate::notify::NoticeBoard;

    fn lenient_backend_prefs() -> NotificationPreferences {
        let everything_on = CategoryPreference {
            email: true,
            push: true,
            sms: true,
            frequency: Frequency::Instant,
        };
        NotificationCategory::ALL
            .into_iter()
            .map(|c| (c, everything_on))
            .collect()
    }

    #[tokio::test]
    async fn sms_outside_security_is_rejected() {
        let mut api = MockPreferencesApi::new();
        api.expect_load_preferences()
            .returning(|_| Ok(lenient_backend_prefs()));
        let editor = PreferenceEditor::new(Arc::new(api), Credential::new("t"), Arc::new(NoticeBoard::new()));
        editor.load().await;

        let err = editor
            .set_channel(NotificationCategory::Campaigns, Channel::Sms, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(editor
            .set_channel(NotificationCategory::Security, Channel::Sms, false)
            .await
            .is_ok());

        let state = editor.snapshot().await;
        assert!(!state.preferences.get(NotificationCategory::Campaigns).sms);
        assert!(!state.preferences.get(NotificationCategory::Security).sms);
        assert!(state.dirty);
    }

    #[tokio::test]
    async fn monthly_is_marketing_only() {
        let editor = PreferenceEditor::new(
            Arc::new(MockPreferencesApi::new()),
            Credential::new("t"),
            Arc::new(NoticeBoard::new()),
        );
        assert!(editor
            .set_frequency(NotificationCategory::Donations, Frequency::Monthly)
            .await
            .is_err());
        assert!(editor
            .set_frequency(NotificationCategory::Marketing, Frequency::Monthly)
            .await
            .is_ok());
        assert_eq!(
            PreferenceEditor::frequency_options(NotificationCategory::Marketing).len(),
            4
        );
        assert!(!PreferenceEditor::is_editable(NotificationCategory::Support, Channel::Sms));
    }

    #[tokio::test]
    async fn save_sends_the_whole_sanitized_set_once() {
        let mut api = MockPreferencesApi::new();
        api.expect_load_preferences()
            .returning(|_| Ok(lenient_backend_prefs()));
        api.expect_save_preferences()
            .withf(|_, prefs| {
                prefs.iter().count() == 6
                    && prefs
                        .iter()
                        .all(|(c, p)| c == NotificationCategory::Security || !p.sms)
                    && !prefs.get(NotificationCategory::Donations).email
            })
            .times(1)
            .returning(|_, prefs| Ok(prefs.clone()));

        let editor = PreferenceEditor::new(Arc::new(api), Credential::new("t"), Arc::new(NoticeBoard::new()));
        editor.load().await;
        editor
            .set_channel(NotificationCategory::Donations, Channel::Email, false)
            .await
            .unwrap();
        editor.save().await.unwrap();
        assert!(!editor.snapshot().await.dirty);
    }

    #[tokio::test]
    async fn failed_save_keeps_edits() {
        let mut api = MockPreferencesApi::new();
        api.expect_load_preferences()
            .returning(|_| Ok(NotificationPreferences::default()));
        api.expect_save_preferences()
            .returning(|_, _| Err(AppError::Transport("offline".into())));

        let board = Arc::new(NoticeBoard::new());
        let editor = PreferenceEditor::new(Arc::new(api), Credential::new("t"), board.clone());
        editor.load().await;
        editor
            .set_channel(NotificationCategory::Support, Channel::Push, false)
            .await
            .unwrap();
        assert!(editor.save().await.is_err());

        let state = editor.snapshot().await;
        assert!(state.dirty);
        assert!(!state.saving);
        assert!(!state.preferences.get(NotificationCategory::Support).push);
        assert_eq!(
            board.errors(),
            vec!["We couldn't save your notification settings.".to_string()]
        );
    }
}
