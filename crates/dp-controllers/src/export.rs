//! # ExportTrigger
//!
//! Downloads a backend-generated file (data export archive or annual
//! statement) and saves it locally under a synthesized name. One attempt per
//! call, one notice on failure. The backend keeps nothing between requests,
//! so repeating a download is always safe.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use dp_core::{
    AppError, Credential, DownloadSink, ExportApi, ExportKind, Notice, Notifier, SavedFile,
};

pub struct ExportTrigger {
    api: Arc<dyn ExportApi>,
    sink: Arc<dyn DownloadSink>,
    credential: Credential,
    notifier: Arc<dyn Notifier>,
}

impl ExportTrigger {
    pub fn new(
        api: Arc<dyn ExportApi>,
        sink: Arc<dyn DownloadSink>,
        credential: Credential,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            sink,
            credential,
            notifier,
        }
    }

    pub async fn download(&self, kind: ExportKind) -> Result<SavedFile, AppError> {
        self.download_on(kind, Local::now().date_naive()).await
    }

    /// Same as [`download`](Self::download) with an explicit calendar date.
    pub async fn download_on(&self, kind: ExportKind, today: NaiveDate) -> Result<SavedFile, AppError> {
        let result = self.fetch_and_save(kind, today).await;
        match &result {
            Ok(saved) => {
                tracing::info!(path = %saved.path.display(), size = saved.size, "download saved");
                self.notifier
                    .notify(Notice::success(format!("Saved {}", saved.path.display())));
            }
            Err(err) => {
                tracing::warn!(?kind, error = %err, "download failed");
                let fallback = match kind {
                    ExportKind::PersonalData => "We couldn't prepare your data export.",
                    ExportKind::Statement { .. } => "We couldn't download that statement.",
                };
                self.notifier.notify(Notice::error(err.user_message(fallback)));
            }
        }
        result
    }

    async fn fetch_and_save(&self, kind: ExportKind, today: NaiveDate) -> Result<SavedFile, AppError> {
        kind.validate(today)?;
        let payload = self.api.fetch_export(&self.credential, kind).await?;
        if payload.bytes.is_empty() {
            return Err(AppError::Decode("the download was empty".into()));
        }
        let file_name = kind.file_name(today, payload.content_type.as_deref());
        self.sink.save(&file_name, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use bytes::Bytes;
    use dp_core::{ExportPayload, MockDownloadSink, MockExportApi};

    use super::*;
    use crate::notify::NoticeBoard;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 6).unwrap()
    }

    #[tokio::test]
    async fn statement_is_saved_under_a_year_based_name() {
        let mut api = MockExportApi::new();
        api.expect_fetch_export()
            .withf(|_, kind| *kind == ExportKind::Statement { year: 2025 })
            .times(1)
            .returning(|_, _| {
                Ok(ExportPayload {
                    bytes: Bytes::from_static(b"%PDF-1.7"),
                    content_type: Some("application/pdf".into()),
                })
            });
        let mut sink = MockDownloadSink::new();
        sink.expect_save()
            .withf(|name, payload| name == "donation-statement-2025.pdf" && payload.bytes.len() == 8)
            .times(1)
            .returning(|name, payload| {
                Ok(SavedFile {
                    path: PathBuf::from("/downloads").join(name),
                    size: payload.bytes.len() as u64,
                    sha256: String::new(),
                })
            });

        let board = Arc::new(NoticeBoard::new());
        let trigger = ExportTrigger::new(Arc::new(api), Arc::new(sink), Credential::new("t"), board.clone());
        let saved = trigger
            .download_on(ExportKind::Statement { year: 2025 }, today())
            .await
            .unwrap();
        assert_eq!(saved.path, PathBuf::from("/downloads/donation-statement-2025.pdf"));
        assert!(board.errors().is_empty());
    }

    #[tokio::test]
    async fn future_year_is_rejected_without_a_request() {
        let mut api = MockExportApi::new();
        api.expect_fetch_export().never();
        let board = Arc::new(NoticeBoard::new());
        let trigger = ExportTrigger::new(
            Arc::new(api),
            Arc::new(MockDownloadSink::new()),
            Credential::new("t"),
            board.clone(),
        );
        let err = trigger
            .download_on(ExportKind::Statement { year: 2031 }, today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(board.errors().len(), 1);
    }

    #[tokio::test]
    async fn failed_download_notifies_once_and_saves_nothing() {
        let mut api = MockExportApi::new();
        api.expect_fetch_export()
            .times(1)
            .returning(|_, _| Err(AppError::Transport("connection reset".into())));
        let mut sink = MockDownloadSink::new();
        sink.expect_save().never();

        let board = Arc::new(NoticeBoard::new());
        let trigger = ExportTrigger::new(Arc::new(api), Arc::new(sink), Credential::new("t"), board.clone());
        assert!(trigger
            .download_on(ExportKind::PersonalData, today())
            .await
            .is_err());
        assert_eq!(
            board.errors(),
            vec!["We couldn't prepare your data export.".to_string()]
        );
    }
}
