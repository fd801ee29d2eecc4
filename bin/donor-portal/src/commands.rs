use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use dp_controllers::{
    BrowsePage, ConversationPanel, ExportTrigger, FollowingList, NoticeBoard, PendingRevocation,
    PreferenceEditor, Refresh, SendOutcome, SessionManager, TaxInfoForm, TracingNotifier,
};
use dp_core::{
    Channel, Credential, DownloadSink, ExportKind, Frequency, ListQuery, Notice, NoticeLevel,
    NotificationCategory, Notifier, TaxField,
};
use dp_download_local::LocalDownloadSink;
use dp_http_reqwest::HttpBackend;
use dp_ui::{
    CharitiesView, ConversationsView, FollowingView, PreferencesView, SessionsView, TaxInfoView,
    Template, ThreadView,
};

use crate::cli::{CharitiesArgs, Command, ExportCommand, PrefsArgs, TaxInfoArgs};

/// Queues notices for printing and mirrors them to the log.
#[derive(Default)]
struct ConsoleNotices {
    board: NoticeBoard,
    log: TracingNotifier,
}

impl Notifier for ConsoleNotices {
    fn notify(&self, notice: Notice) {
        self.log.notify(notice.clone());
        self.board.notify(notice);
    }
}

pub struct Portal {
    backend: Arc<HttpBackend>,
    sink: Arc<LocalDownloadSink>,
    credential: Option<Credential>,
    notices: Arc<ConsoleNotices>,
    assume_yes: bool,
}

impl Portal {
    pub fn new(
        backend: Arc<HttpBackend>,
        sink: Arc<LocalDownloadSink>,
        credential: Option<Credential>,
        assume_yes: bool,
    ) -> Self {
        Self {
            backend,
            sink,
            credential,
            notices: Arc::new(ConsoleNotices::default()),
            assume_yes,
        }
    }

    pub fn print_notices(&self) {
        for notice in self.notices.board.drain() {
            match notice.level {
                NoticeLevel::Success => println!("ok: {}", notice.message),
                NoticeLevel::Info => println!("{}", notice.message),
                NoticeLevel::Error => eprintln!("error: {}", notice.message),
            }
        }
    }

    fn credential(&self) -> anyhow::Result<Credential> {
        self.credential
            .clone()
            .ok_or_else(|| anyhow!("not signed in: set auth.token or auth.token_file"))
    }

    fn notifier(&self) -> Arc<dyn Notifier> {
        self.notices.clone()
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Charities(args) => self.charities(args).await,
            Command::Follow { charity_id } => self.follow(charity_id).await,
            Command::Following { unfollow } => self.following(unfollow).await,
            Command::Messages { partner, send } => self.messages(partner, send).await,
            Command::Prefs(args) => self.prefs(args).await,
            Command::Sessions { revoke, revoke_all } => self.sessions(revoke, revoke_all).await,
            Command::TaxInfo(args) => self.tax_info(args).await,
            Command::Export { kind } => self.export(kind).await,
        }
    }

    async fn charities(&self, args: CharitiesArgs) -> anyhow::Result<()> {
        let defaults = ListQuery::default();
        let query = ListQuery {
            search_term: args.search.unwrap_or_default(),
            category: args.category.unwrap_or(defaults.category),
            region: args.region.unwrap_or(defaults.region),
            sort: args.sort.unwrap_or(defaults.sort),
            page: args.page.max(1),
        };
        let page = BrowsePage::with_query(
            self.backend.clone(),
            self.backend.clone(),
            self.credential.clone(),
            self.notifier(),
            query,
        );
        let outcome = page.load().await;
        let (state, follows) = page.snapshot().await;
        let view = CharitiesView::new(
            &state.query,
            &state.page,
            &state.facets,
            &follows,
            state.error.as_deref(),
        );
        print!("{}", view.render()?);
        failed(outcome)
    }

    async fn follow(&self, charity_id: i64) -> anyhow::Result<()> {
        let page = BrowsePage::new(
            self.backend.clone(),
            self.backend.clone(),
            Some(self.credential()?),
            self.notifier(),
        );
        let state = page.toggle_follow(charity_id).await?;
        println!(
            "{} charity #{charity_id}",
            if state.is_following() { "Following" } else { "No longer following" }
        );
        Ok(())
    }

    async fn following(&self, unfollow: Option<i64>) -> anyhow::Result<()> {
        let list = FollowingList::new(self.backend.clone(), self.credential()?, self.notifier());
        let outcome = list.load().await;
        if let Some(follow_id) = unfollow {
            list.unfollow(follow_id).await?;
        }
        let state = list.snapshot().await;
        print!("{}", FollowingView::new(&state.follows, state.error.as_deref()).render()?);
        if unfollow.is_some() {
            return Ok(());
        }
        failed(outcome)
    }

    async fn messages(&self, partner: Option<i64>, send: Option<String>) -> anyhow::Result<()> {
        let panel = ConversationPanel::new(self.backend.clone(), self.credential()?, self.notifier());
        let outcome = panel.load_conversations().await;

        let Some(partner_id) = partner else {
            let state = panel.snapshot().await;
            print!(
                "{}",
                ConversationsView::new(&state.conversations, state.error.as_deref()).render()?
            );
            return failed(outcome);
        };

        let opened = panel.open(partner_id).await;
        if let Some(text) = send {
            panel.set_draft(text).await;
            match panel.send().await {
                SendOutcome::Sent(_) => {}
                SendOutcome::Ignored => bail!("message is empty"),
                SendOutcome::InFlight => bail!("a message is already being sent"),
                SendOutcome::Failed(err) => return Err(err.into()),
            }
        }

        let state = panel.snapshot().await;
        let name = state
            .conversations
            .iter()
            .find(|c| c.partner_id == partner_id)
            .and_then(|c| c.partner_name.clone());
        print!(
            "{}",
            ThreadView::new(partner_id, name.as_deref(), &state.messages, state.error.as_deref())
                .render()?
        );
        failed(opened)
    }

    async fn prefs(&self, args: PrefsArgs) -> anyhow::Result<()> {
        let editor = PreferenceEditor::new(self.backend.clone(), self.credential()?, self.notifier());
        failed(editor.load().await)?;

        for (spec, enabled) in args
            .enable
            .iter()
            .map(|s| (s, true))
            .chain(args.disable.iter().map(|s| (s, false)))
        {
            let (category, channel) = spec
                .split_once('.')
                .with_context(|| format!("expected CATEGORY.CHANNEL, got {spec:?}"))?;
            let category: NotificationCategory = category.parse()?;
            let channel: Channel = channel.parse()?;
            editor.set_channel(category, channel, enabled).await?;
        }
        for spec in &args.frequency {
            let (category, frequency) = spec
                .split_once('=')
                .with_context(|| format!("expected CATEGORY=FREQUENCY, got {spec:?}"))?;
            let category: NotificationCategory = category.parse()?;
            let frequency: Frequency = frequency.parse()?;
            editor.set_frequency(category, frequency).await?;
        }

        if editor.snapshot().await.dirty {
            editor.save().await?;
        }
        let state = editor.snapshot().await;
        print!("{}", PreferencesView::new(&state.preferences, state.dirty).render()?);
        Ok(())
    }

    async fn sessions(&self, revoke: Option<i64>, revoke_all: bool) -> anyhow::Result<()> {
        let manager = SessionManager::new(self.backend.clone(), self.credential()?, self.notifier());
        failed(manager.load().await)?;

        if let Some(id) = revoke {
            manager.request_revoke(id).await?;
        } else if revoke_all {
            manager.request_revoke_all().await?;
        }

        if let Some(pending) = manager.snapshot().await.pending {
            let prompt = match pending {
                PendingRevocation::One(id) => format!("Sign out session #{id}?"),
                PendingRevocation::AllOthers { count } => {
                    format!("Sign out {count} other session(s)?")
                }
            };
            if self.assume_yes || confirm(&prompt)? {
                manager.confirm().await?;
            } else {
                manager.cancel().await;
                println!("Cancelled.");
            }
        }

        let state = manager.snapshot().await;
        print!("{}", SessionsView::new(&state.sessions, state.error.as_deref()).render()?);
        Ok(())
    }

    async fn tax_info(&self, args: TaxInfoArgs) -> anyhow::Result<()> {
        let form = TaxInfoForm::new(self.backend.clone(), self.credential()?, self.notifier());
        failed(form.load().await)?;

        for spec in &args.fields {
            let (field, value) = spec
                .split_once('=')
                .with_context(|| format!("expected FIELD=VALUE, got {spec:?}"))?;
            let field: TaxField = field.parse()?;
            form.set_field(field, value).await;
        }
        if let Some(enabled) = args.gift_aid {
            form.set_gift_aid(enabled).await;
        }

        if form.snapshot().await.can_save() {
            form.save().await?;
        }
        let state = form.snapshot().await;
        print!("{}", TaxInfoView::new(&state.fields, state.dirty).render()?);
        Ok(())
    }

    async fn export(&self, kind: ExportCommand) -> anyhow::Result<()> {
        let sink: Arc<dyn DownloadSink> = self.sink.clone();
        let trigger = ExportTrigger::new(self.backend.clone(), sink, self.credential()?, self.notifier());
        let kind = match kind {
            ExportCommand::Data => ExportKind::PersonalData,
            ExportCommand::Statement { year } => ExportKind::Statement { year },
        };
        let saved = trigger.download(kind).await?;
        tracing::debug!(sha256 = %saved.sha256, "download checksum");
        Ok(())
    }
}

/// A failed fetch has already been reported as a notice; exit non-zero.
fn failed(outcome: Refresh) -> anyhow::Result<()> {
    match outcome {
        Refresh::Failed(err) => Err(err).context("request failed"),
        Refresh::Applied | Refresh::Superseded | Refresh::Skipped => Ok(()),
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
