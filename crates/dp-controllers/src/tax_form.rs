//! # TaxInfoForm
//!
//! Dirty-tracking editor for the donor's taxpayer record. Saving replaces the
//! whole record; a failed save keeps the form populated and dirty, and so
//! does a successful one when the donor kept typing while it was in flight.

use std::sync::Arc;

use dp_core::{AppError, Credential, Notice, Notifier, TaxField, TaxInfo, TaxInfoApi};
use tokio::sync::RwLock;

use crate::sequencer::Refresh;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Copy of the last record fetched from (or accepted by) the server
    pub server: TaxInfo,
    /// What the donor is editing
    pub fields: TaxInfo,
    pub loaded: bool,
    pub dirty: bool,
    pub saving: bool,
}

impl FormState {
    pub fn can_save(&self) -> bool {
        self.dirty && !self.saving
    }
}

pub struct TaxInfoForm {
    api: Arc<dyn TaxInfoApi>,
    credential: Credential,
    notifier: Arc<dyn Notifier>,
    state: RwLock<FormState>,
}

impl TaxInfoForm {
    pub fn new(api: Arc<dyn TaxInfoApi>, credential: Credential, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            credential,
            notifier,
            state: RwLock::new(FormState::default()),
        }
    }

    pub async fn snapshot(&self) -> FormState {
        self.state.read().await.clone()
    }

    pub async fn load(&self) -> Refresh {
        let result = self.api.load_tax_info(&self.credential).await;
        let mut state = self.state.write().await;
        match result {
            Ok(record) => {
                let record = record.unwrap_or_default();
                *state = FormState {
                    fields: record.clone(),
                    server: record,
                    loaded: true,
                    dirty: false,
                    saving: false,
                };
                Refresh::Applied
            }
            Err(err) => {
                let message = err.user_message("We couldn't load your tax information.");
                *state = FormState::default();
                drop(state);
                self.notifier.notify(Notice::error(message));
                Refresh::Failed(err)
            }
        }
    }

    pub async fn set_field(&self, field: TaxField, value: impl Into<String>) {
        let mut state = self.state.write().await;
        if state.fields.set_field(field, value.into()) {
            state.dirty = true;
        }
    }

    pub async fn set_gift_aid(&self, enabled: bool) {
        let mut state = self.state.write().await;
        if state.fields.gift_aid != enabled {
            state.fields.gift_aid = enabled;
            state.dirty = true;
        }
    }

    /// Discards edits, restoring the last server copy.
    pub async fn cancel(&self) {
        let mut state = self.state.write().await;
        state.fields = state.server.clone();
        state.dirty = false;
    }

    pub async fn save(&self) -> Result<(), AppError> {
        let record = {
            let mut state = self.state.write().await;
            if !state.can_save() {
                return Err(AppError::Validation(if state.saving {
                    "A save is already in progress.".into()
                } else {
                    "There are no changes to save.".into()
                }));
            }
            let missing = state.fields.missing_required();
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|f| f.label()).collect();
                let err = AppError::Validation(format!("Please fill in: {}.", names.join(", ")));
                drop(state);
                self.notifier.notify(Notice::error(err.user_message("")));
                return Err(err);
            }
            state.saving = true;
            state.fields.clone()
        };

        let result = self.api.save_tax_info(&self.credential, &record).await;

        let mut state = self.state.write().await;
        state.saving = false;
        match result {
            Ok(stored) => {
                // Edits made while the request was out stay on the form.
                if state.fields == record {
                    state.fields = stored.clone();
                    state.dirty = false;
                }
                state.server = stored;
                drop(state);
                tracing::info!("tax information saved");
                self.notifier.notify(Notice::success("Tax information saved."));
                Ok(())
            }
            Err(err) => {
                drop(state);
                tracing::warn!(error = %err, "saving tax information failed");
                self.notifier.notify(Notice::error(
                    err.user_message("We couldn't save your tax information."),
                ));
                Err(err)
            }
        }
    }
}
