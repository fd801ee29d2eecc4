//! # ConversationPanel
//!
//! Two views: the conversation list and a single thread. Entering a thread
//! zeroes its unread counter locally and fetches the full history. Sending
//! never inserts the message optimistically; the thread is re-fetched so the
//! panel always shows what the server last returned.

use std::sync::Arc;

use dp_core::{
    AppError, Conversation, Credential, Message, MessagingApi, NewMessage, Notice, Notifier, UserId,
};
use tokio::sync::RwLock;

use crate::sequencer::{Refresh, RequestSequencer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelView {
    #[default]
    List,
    Thread {
        partner_id: UserId,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub view: PanelView,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub draft: String,
    pub sending: bool,
    pub error: Option<String>,
}

impl PanelState {
    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Submitted; the draft was cleared and the thread re-fetched
    Sent(Message),
    /// Blank draft or no open thread; nothing was sent
    Ignored,
    /// A previous send has not finished yet
    InFlight,
    /// The backend rejected the message; the draft is kept
    Failed(AppError),
}

pub struct ConversationPanel {
    api: Arc<dyn MessagingApi>,
    credential: Credential,
    notifier: Arc<dyn Notifier>,
    list_sequencer: RequestSequencer,
    thread_sequencer: RequestSequencer,
    state: RwLock<PanelState>,
}

impl ConversationPanel {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        credential: Credential,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            credential,
            notifier,
            list_sequencer: RequestSequencer::new(),
            thread_sequencer: RequestSequencer::new(),
            state: RwLock::new(PanelState::default()),
        }
    }

    pub async fn snapshot(&self) -> PanelState {
        self.state.read().await.clone()
    }

    pub async fn load_conversations(&self) -> Refresh {
        let ticket = self.list_sequencer.issue();
        let result = self.api.list_conversations(&self.credential).await;

        let mut state = self.state.write().await;
        if !self.list_sequencer.is_latest(ticket) {
            return Refresh::Superseded;
        }
        match result {
            Ok(mut conversations) => {
                conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
                // The open thread has been read even if the server hasn't caught up.
                if let PanelView::Thread { partner_id } = state.view {
                    mark_read(&mut conversations, partner_id);
                }
                state.conversations = conversations;
                state.error = None;
                Refresh::Applied
            }
            Err(err) => {
                let message = err.user_message("We couldn't load your conversations.");
                state.conversations.clear();
                state.error = Some(message.clone());
                drop(state);
                self.notifier.notify(Notice::error(message));
                Refresh::Failed(err)
            }
        }
    }

    /// Switches to the thread with `partner_id` and fetches its history.
    pub async fn open(&self, partner_id: UserId) -> Refresh {
        {
            let mut state = self.state.write().await;
            if state.view != (PanelView::Thread { partner_id }) {
                state.messages.clear();
                state.draft.clear();
            }
            state.view = PanelView::Thread { partner_id };
            mark_read(&mut state.conversations, partner_id);
        }
        self.fetch_thread(partner_id).await
    }

    pub async fn back(&self) {
        let mut state = self.state.write().await;
        state.view = PanelView::List;
        state.messages.clear();
        // Responses for the thread we just left must not land anymore.
        self.thread_sequencer.issue();
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.state.write().await.draft = text.into();
    }

    pub async fn send(&self) -> SendOutcome {
        let (partner_id, content) = {
            let mut state = self.state.write().await;
            let PanelView::Thread { partner_id } = state.view else {
                return SendOutcome::Ignored;
            };
            let content = state.draft.trim().to_string();
            if content.is_empty() {
                return SendOutcome::Ignored;
            }
            if state.sending {
                return SendOutcome::InFlight;
            }
            state.sending = true;
            (partner_id, content)
        };

        let request = NewMessage {
            receiver_id: partner_id,
            content,
        };
        let result = self.api.send_message(&self.credential, &request).await;

        {
            let mut state = self.state.write().await;
            state.sending = false;
            if result.is_ok() {
                state.draft.clear();
            }
        }

        match result {
            Ok(message) => {
                tracing::info!(partner = partner_id, message = message.id, "message sent");
                self.fetch_thread(partner_id).await;
                SendOutcome::Sent(message)
            }
            Err(err) => {
                tracing::warn!(partner = partner_id, error = %err, "message send failed");
                self.notifier
                    .notify(Notice::error(err.user_message("Your message couldn't be sent.")));
                SendOutcome::Failed(err)
            }
        }
    }

    async fn fetch_thread(&self, partner_id: UserId) -> Refresh {
        let ticket = self.thread_sequencer.issue();
        let result = self.api.conversation(&self.credential, partner_id).await;

        let mut state = self.state.write().await;
        if !self.thread_sequencer.is_latest(ticket)
            || state.view != (PanelView::Thread { partner_id })
        {
            return Refresh::Superseded;
        }
        match result {
            Ok(mut messages) => {
                messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                state.messages = messages;
                state.error = None;
                Refresh::Applied
            }
            Err(err) => {
                let message = err.user_message("We couldn't load this conversation.");
                state.messages.clear();
                state.error = Some(message.clone());
                drop(state);
                self.notifier.notify(Notice::error(message));
                Refresh::Failed(err)
            }
        }
    }
}

fn mark_read(conversations: &mut [Conversation], partner_id: UserId) {
    for conversation in conversations.iter_mut().filter(|c| c.partner_id == partner_id) {
        conversation.unread_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use dp_core::MockMessagingApi;
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::notify::NoticeBoard;

    fn conversation(partner_id: UserId, unread: u32, minute: u32) -> Conversation {
        Conversation {
            partner_id,
            partner_name: Some(format!("Partner {partner_id}")),
            last_message: Some("hi".into()),
            last_message_at: Utc.with_ymd_and_hms(2026, 5, 1, 12, minute, 0).unwrap(),
            unread_count: unread,
        }
    }

    fn message(id: i64, content: &str) -> Message {
        Message {
            id,
            sender_id: 1,
            receiver_id: 7,
            content: content.into(),
            created_at: Utc.with_ymd_and_hms(2026, 5, 1, 12, id as u32, 0).unwrap(),
            is_read: true,
        }
    }

    #[tokio::test]
    async fn opening_a_thread_zeroes_its_unread_count() {
        let mut api = MockMessagingApi::new();
        api.expect_list_conversations()
            .returning(|_| Ok(vec![conversation(7, 3, 1), conversation(8, 2, 5)]));
        api.expect_conversation()
            .with(always(), eq(7))
            .returning(|_, _| Ok(vec![message(2, "second"), message(1, "first")]));

        let panel = ConversationPanel::new(Arc::new(api), Credential::new("t"), Arc::new(NoticeBoard::new()));
        panel.load_conversations().await;
        assert_eq!(panel.snapshot().await.total_unread(), 5);
        // newest conversation first
        assert_eq!(panel.snapshot().await.conversations[0].partner_id, 8);

        assert!(panel.open(7).await.is_applied());
        let state = panel.snapshot().await;
        assert_eq!(state.view, PanelView::Thread { partner_id: 7 });
        assert_eq!(state.total_unread(), 2);
        assert_eq!(state.messages[0].content, "first");

        panel.back().await;
        assert_eq!(panel.snapshot().await.view, PanelView::List);
    }

    #[tokio::test]
    async fn whitespace_draft_sends_nothing() {
        let mut api = MockMessagingApi::new();
        api.expect_conversation().returning(|_, _| Ok(vec![]));
        api.expect_send_message().never();

        let panel = ConversationPanel::new(Arc::new(api), Credential::new("t"), Arc::new(NoticeBoard::new()));
        panel.open(7).await;
        panel.set_draft("   \n\t").await;
        assert_eq!(panel.send().await, SendOutcome::Ignored);
        assert_eq!(panel.snapshot().await.draft, "   \n\t");
    }

    #[tokio::test]
    async fn send_clears_draft_and_refetches() {
        let mut api = MockMessagingApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_conversation()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![message(1, "first")]));
        api.expect_send_message()
            .withf(|_, m| m.receiver_id == 7 && m.content == "thanks!")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(message(2, "thanks!")));
        api.expect_conversation()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![message(1, "first"), message(2, "thanks!")]));

        let panel = ConversationPanel::new(Arc::new(api), Credential::new("t"), Arc::new(NoticeBoard::new()));
        panel.open(7).await;
        panel.set_draft("  thanks!  ").await;
        assert!(matches!(panel.send().await, SendOutcome::Sent(_)));

        let state = panel.snapshot().await;
        assert!(state.draft.is_empty());
        assert_eq!(state.messages.len(), 2);
        assert!(!state.sending);
    }

    #[tokio::test]
    async fn failed_send_keeps_the_draft() {
        let mut api = MockMessagingApi::new();
        api.expect_conversation().returning(|_, _| Ok(vec![]));
        api.expect_send_message().returning(|_, _| {
            Err(AppError::Status {
                status: 403,
                message: Some("This charity does not accept messages.".into()),
            })
        });

        let board = Arc::new(NoticeBoard::new());
        let panel = ConversationPanel::new(Arc::new(api), Credential::new("t"), board.clone());
        panel.open(7).await;
        panel.set_draft("hello").await;
        assert!(matches!(panel.send().await, SendOutcome::Failed(_)));
        assert_eq!(panel.snapshot().await.draft, "hello");
        assert_eq!(
            board.errors(),
            vec!["This charity does not accept messages.".to_string()]
        );
    }

    #[tokio::test]
    async fn send_from_list_view_is_ignored() {
        let mut api = MockMessagingApi::new();
        api.expect_send_message().never();
        let panel = ConversationPanel::new(Arc::new(api), Credential::new("t"), Arc::new(NoticeBoard::new()));
        panel.set_draft("hello").await;
        assert_eq!(panel.send().await, SendOutcome::Ignored);
    }
}
