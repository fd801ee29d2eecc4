//! # dp-controllers
//!
//! Screen controllers for the donor portal. Each controller owns its state,
//! calls the backend through the `dp-core` ports, and reports failures as
//! notices instead of errors the user has to deal with.
//!
//! # Developer Note
//! Controllers take `&self` everywhere so a front end can run operations
//! concurrently. No lock is held across a network call; fetches are ticketed
//! so only the newest request's response is ever applied.

pub mod browse_page;
pub mod conversation;
pub mod export;
pub mod follow_status;
pub mod following;
pub mod list_browser;
pub mod notify;
pub mod preferences;
pub mod scatter;
pub mod sequencer;
pub mod sessions;
pub mod tax_form;

pub use browse_page::BrowsePage;
pub use conversation::{ConversationPanel, PanelState, PanelView, SendOutcome};
pub use export::ExportTrigger;
pub use follow_status::FollowStatusAggregator;
pub use following::{FollowingList, FollowingState};
pub use list_browser::{BrowserState, ListBrowser};
pub use notify::{NoticeBoard, TracingNotifier};
pub use preferences::{EditorState, PreferenceEditor};
pub use scatter::scatter_gather;
pub use sequencer::{Refresh, RequestSequencer, Ticket};
pub use sessions::{PendingRevocation, SessionManager, SessionState};
pub use tax_form::{FormState, TaxInfoForm};
