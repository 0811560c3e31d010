use crate::api::ActivityApi;
use crate::config::BoardConfig;
use crate::errors::ClientError;
use crate::models::{ApiReply, ClickTarget, Outcome, SignupForm, StatusMessage};
use crate::ui::{self, DATA_ACTIVITY, DATA_EMAIL, DELETE_BUTTON_CLASS, LOAD_FAILURE_HTML};
use crate::view::BoardView;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const SIGNUP_SUCCESS_FALLBACK: &str = "Signed up successfully";
const SIGNUP_ERROR_FALLBACK: &str = "An error occurred";
const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
const UNREGISTER_SUCCESS_FALLBACK: &str = "Participant unregistered";
const UNREGISTER_ERROR_FALLBACK: &str = "Failed to unregister participant";
const UNREGISTER_FAILED: &str = "Failed to unregister. Please try again.";

/// The activity board: renders the catalog and submits signup/unregister
/// requests. Clones share the same backend, view and message timer state.
pub struct ActivityBoard<A, V> {
    api: Arc<A>,
    view: Arc<Mutex<V>>,
    message_ttl: Duration,
    message_generation: Arc<AtomicU64>,
}

impl<A, V> Clone for ActivityBoard<A, V> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            view: Arc::clone(&self.view),
            message_ttl: self.message_ttl,
            message_generation: Arc::clone(&self.message_generation),
        }
    }
}

impl<A: ActivityApi, V: BoardView> ActivityBoard<A, V> {
    pub fn new(api: A, view: V, config: &BoardConfig) -> Self {
        Self {
            api: Arc::new(api),
            view: Arc::new(Mutex::new(view)),
            message_ttl: config.message_ttl,
            message_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn view(&self) -> Arc<Mutex<V>> {
        Arc::clone(&self.view)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetches the catalog and re-renders the list and the select options.
    /// Failures replace the list with a notice and are not propagated.
    pub async fn load_catalog(&self) {
        match self.refresh().await {
            Ok(count) => info!(activities = count, "rendered activities"),
            Err(err) => {
                self.view.lock().await.show_list_notice(LOAD_FAILURE_HTML);
                error!("error fetching activities: {err}");
            }
        }
    }

    async fn refresh(&self) -> Result<usize, ClientError> {
        let catalog = self.api.fetch_catalog().await?;
        let cards = ui::render_catalog(&catalog)?;
        let names = catalog.names().map(str::to_string).collect();

        let mut view = self.view.lock().await;
        view.replace_activities(cards);
        view.replace_options(names);
        Ok(catalog.len())
    }

    /// Submits the signup form with whatever values it currently holds.
    pub async fn submit_signup(&self) -> Outcome {
        let form = self.view.lock().await.form_values();
        self.signup(form).await
    }

    pub async fn signup(&self, form: SignupForm) -> Outcome {
        debug!(activity = %form.activity, email = %form.email, "submitting signup");
        match self.api.signup(&form.activity, &form.email).await {
            Ok(reply) if reply.ok() => {
                let text = reply
                    .body
                    .message
                    .unwrap_or_else(|| SIGNUP_SUCCESS_FALLBACK.to_string());
                info!(activity = %form.activity, "signup accepted");
                self.show_message(StatusMessage::success(text)).await;
                self.view.lock().await.reset_form();
                self.load_catalog().await;
                Outcome::Success
            }
            Ok(reply) => {
                self.reject(reply, SIGNUP_ERROR_FALLBACK).await;
                Outcome::Rejected
            }
            Err(err) => {
                error!("error signing up: {err}");
                self.show_message(StatusMessage::error(SIGNUP_FAILED)).await;
                Outcome::Failed
            }
        }
    }

    /// Delegated click handler for the list container. Returns `None` when
    /// the target is not an unregister control.
    pub async fn handle_click(&self, target: &ClickTarget) -> Option<Outcome> {
        if !target.has_class(DELETE_BUTTON_CLASS) {
            return None;
        }
        let activity = target.attribute(DATA_ACTIVITY);
        let email = target.attribute(DATA_EMAIL);
        let (Some(activity), Some(email)) = (activity, email) else {
            debug!("unregister control without data attributes");
            return None;
        };

        Some(self.unregister(activity, email).await)
    }

    pub async fn unregister(&self, activity: &str, email: &str) -> Outcome {
        debug!(%activity, %email, "submitting unregister");
        match self.api.unregister(activity, email).await {
            Ok(reply) if reply.ok() => {
                let text = reply
                    .body
                    .message
                    .unwrap_or_else(|| UNREGISTER_SUCCESS_FALLBACK.to_string());
                info!(%activity, "unregister accepted");
                self.show_message(StatusMessage::success(text)).await;
                self.load_catalog().await;
                Outcome::Success
            }
            Ok(reply) => {
                self.reject(reply, UNREGISTER_ERROR_FALLBACK).await;
                Outcome::Rejected
            }
            Err(err) => {
                error!("error unregistering participant: {err}");
                self.show_message(StatusMessage::error(UNREGISTER_FAILED)).await;
                Outcome::Failed
            }
        }
    }

    async fn reject(&self, reply: ApiReply, fallback: &str) {
        warn!(status = reply.status, detail = ?reply.body.detail, "request rejected");
        let text = reply.body.detail.unwrap_or_else(|| fallback.to_string());
        self.show_message(StatusMessage::error(text)).await;
    }

    /// Shows `message` and hides it after the configured ttl, unless a newer
    /// message has replaced it by then.
    pub async fn show_message(&self, message: StatusMessage) {
        let generation = self.message_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.view.lock().await.show_message(&message);

        let view = Arc::clone(&self.view);
        let current = Arc::clone(&self.message_generation);
        let ttl = self.message_ttl;
        tokio::spawn(async move {
            sleep(ttl).await;
            if current.load(Ordering::SeqCst) == generation {
                view.lock().await.hide_message();
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Activity, ActivityCatalog, MessageBody, Severity};
    use crate::ui::unregister_control;
    use crate::view::Page;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicBool;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Fetch,
        Signup(String, String),
        Unregister(String, String),
    }

    /// Scripted backend: one catalog, one canned reply for writes.
    #[derive(Default)]
    pub(crate) struct ScriptedApi {
        pub catalog: StdMutex<Option<ActivityCatalog>>,
        pub reply: StdMutex<Option<ApiReply>>,
        pub calls: StdMutex<Vec<Call>>,
        pub fetch_delay: StdMutex<Option<Duration>>,
        pub panic_on_unregister: AtomicBool,
    }

    impl ScriptedApi {
        pub fn with_catalog(catalog: ActivityCatalog) -> Self {
            let api = Self::default();
            *api.catalog.lock().unwrap() = Some(catalog);
            api
        }

        pub fn reply(self, status: u16, body: MessageBody) -> Self {
            *self.reply.lock().unwrap() = Some(ApiReply { status, body });
            self
        }

        pub fn slow_fetch(self, delay: Duration) -> Self {
            *self.fetch_delay.lock().unwrap() = Some(delay);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn fetches(&self) -> usize {
            self.calls().iter().filter(|call| **call == Call::Fetch).count()
        }

        fn canned(&self) -> Result<ApiReply, ClientError> {
            match self.reply.lock().unwrap().clone() {
                Some(reply) => Ok(reply),
                None => Err(broken_body()),
            }
        }
    }

    fn broken_body() -> ClientError {
        serde_json::from_str::<serde_json::Value>("<html>").unwrap_err().into()
    }

    #[async_trait]
    impl ActivityApi for ScriptedApi {
        async fn fetch_catalog(&self) -> Result<ActivityCatalog, ClientError> {
            self.calls.lock().unwrap().push(Call::Fetch);
            let delay = *self.fetch_delay.lock().unwrap();
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            self.catalog.lock().unwrap().clone().ok_or_else(broken_body)
        }

        async fn signup(&self, activity: &str, email: &str) -> Result<ApiReply, ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Signup(activity.into(), email.into()));
            self.canned()
        }

        async fn unregister(&self, activity: &str, email: &str) -> Result<ApiReply, ClientError> {
            if self.panic_on_unregister.load(Ordering::SeqCst) {
                panic!("scripted unregister panic");
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Unregister(activity.into(), email.into()));
            self.canned()
        }
    }

    pub(crate) fn chess_catalog() -> ActivityCatalog {
        let mut catalog = ActivityCatalog::new();
        catalog.insert(
            "Chess Club",
            Activity {
                description: "d".into(),
                schedule: "Mon".into(),
                max_participants: 2,
                participants: vec!["a@x.com".into()],
            },
        );
        catalog
    }

    fn message(text: &str) -> MessageBody {
        MessageBody {
            message: Some(text.into()),
            detail: None,
        }
    }

    fn detail(text: &str) -> MessageBody {
        MessageBody {
            message: None,
            detail: Some(text.into()),
        }
    }

    fn board(api: ScriptedApi) -> ActivityBoard<ScriptedApi, Page> {
        let config = BoardConfig::new("http://localhost/").unwrap();
        ActivityBoard::new(api, Page::new(), &config)
    }

    async fn visible(board: &ActivityBoard<ScriptedApi, Page>) -> Option<(String, Severity)> {
        board
            .view()
            .lock()
            .await
            .visible_message()
            .map(|m| (m.text.clone(), m.severity))
    }

    #[tokio::test]
    async fn load_renders_cards_and_options() {
        let board = board(ScriptedApi::with_catalog(chess_catalog()));
        board.load_catalog().await;

        let view = board.view();
        let page = view.lock().await;
        assert_eq!(page.card_count(), 1);
        assert!(page.activities_html.contains("<h4>Chess Club</h4>"));
        assert!(page.activities_html.contains("1 spots left"));
        assert_eq!(page.options, ["Chess Club"]);
    }

    #[tokio::test]
    async fn load_replaces_previous_render() {
        let board = board(ScriptedApi::with_catalog(chess_catalog()));
        board.load_catalog().await;
        board.load_catalog().await;

        let view = board.view();
        let page = view.lock().await;
        assert_eq!(page.card_count(), 1);
        assert_eq!(page.options.len(), 1);
    }

    #[tokio::test]
    async fn load_failure_shows_notice() {
        let board = board(ScriptedApi::default());
        board.load_catalog().await;

        let view = board.view();
        let page = view.lock().await;
        assert_eq!(page.activities_html, LOAD_FAILURE_HTML);
        assert!(page.visible_message().is_none());
    }

    #[tokio::test]
    async fn signup_success_resets_form_and_refetches_once() {
        let api = ScriptedApi::with_catalog(chess_catalog()).reply(200, message("Signed up"));
        let board = board(api);
        board.view().lock().await.fill_form("b@x.com", "Chess Club");

        assert_eq!(board.submit_signup().await, Outcome::Success);
        assert_eq!(visible(&board).await, Some(("Signed up".into(), Severity::Success)));
        assert_eq!(board.view().lock().await.form_values(), SignupForm::default());
        assert_eq!(
            board.api().calls(),
            [Call::Signup("Chess Club".into(), "b@x.com".into()), Call::Fetch]
        );
    }

    #[tokio::test]
    async fn signup_rejection_shows_detail_without_refetch() {
        let api =
            ScriptedApi::with_catalog(chess_catalog()).reply(400, detail("Already signed up"));
        let board = board(api);
        board.view().lock().await.fill_form("a@x.com", "Chess Club");

        assert_eq!(board.submit_signup().await, Outcome::Rejected);
        assert_eq!(
            visible(&board).await,
            Some(("Already signed up".into(), Severity::Error))
        );
        assert_eq!(board.api().fetches(), 0);
        assert_eq!(board.view().lock().await.form.email, "a@x.com");
    }

    #[tokio::test]
    async fn signup_rejection_without_detail_uses_fallback() {
        let api = ScriptedApi::with_catalog(chess_catalog()).reply(500, MessageBody::default());
        let board = board(api);

        assert_eq!(board.submit_signup().await, Outcome::Rejected);
        assert_eq!(
            visible(&board).await,
            Some((SIGNUP_ERROR_FALLBACK.into(), Severity::Error))
        );
    }

    #[tokio::test]
    async fn signup_transport_failure_shows_generic_message() {
        let board = board(ScriptedApi::with_catalog(chess_catalog()));

        assert_eq!(board.submit_signup().await, Outcome::Failed);
        assert_eq!(visible(&board).await, Some((SIGNUP_FAILED.into(), Severity::Error)));
        assert_eq!(board.api().fetches(), 0);
    }

    #[tokio::test]
    async fn click_on_unregister_control_issues_delete() {
        let api = ScriptedApi::with_catalog(chess_catalog())
            .reply(200, message("Unregistered a@x.com"));
        let board = board(api);

        let outcome = board
            .handle_click(&unregister_control("Chess Club", "a@x.com"))
            .await;
        assert_eq!(outcome, Some(Outcome::Success));
        assert_eq!(
            board.api().calls(),
            [Call::Unregister("Chess Club".into(), "a@x.com".into()), Call::Fetch]
        );
        assert_eq!(
            visible(&board).await,
            Some(("Unregistered a@x.com".into(), Severity::Success))
        );
    }

    #[tokio::test]
    async fn unregister_success_without_message_uses_fallback() {
        let api = ScriptedApi::with_catalog(chess_catalog()).reply(200, MessageBody::default());
        let board = board(api);

        board.unregister("Chess Club", "a@x.com").await;
        assert_eq!(
            visible(&board).await,
            Some((UNREGISTER_SUCCESS_FALLBACK.into(), Severity::Success))
        );
    }

    #[tokio::test]
    async fn unregister_failures_do_not_refetch() {
        let rejected =
            board(ScriptedApi::with_catalog(chess_catalog()).reply(404, MessageBody::default()));
        assert_eq!(rejected.unregister("Chess Club", "z@x.com").await, Outcome::Rejected);
        assert_eq!(
            visible(&rejected).await,
            Some((UNREGISTER_ERROR_FALLBACK.into(), Severity::Error))
        );
        assert_eq!(rejected.api().fetches(), 0);

        let failed = board(ScriptedApi::with_catalog(chess_catalog()));
        assert_eq!(failed.unregister("Chess Club", "z@x.com").await, Outcome::Failed);
        assert_eq!(
            visible(&failed).await,
            Some((UNREGISTER_FAILED.into(), Severity::Error))
        );
        assert_eq!(failed.api().fetches(), 0);
    }

    #[tokio::test]
    async fn clicks_elsewhere_are_ignored() {
        let board = board(ScriptedApi::with_catalog(chess_catalog()));

        let heading = ClickTarget::new().with_class("activity-card");
        assert_eq!(board.handle_click(&heading).await, None);

        let incomplete = ClickTarget::new()
            .with_class(DELETE_BUTTON_CLASS)
            .with_attribute(DATA_ACTIVITY, "Chess Club");
        assert_eq!(board.handle_click(&incomplete).await, None);
        assert!(board.api().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn message_hides_after_ttl() {
        let board = board(ScriptedApi::default());
        board.show_message(StatusMessage::success("hello")).await;

        sleep(Duration::from_secs(4)).await;
        assert!(visible(&board).await.is_some());

        sleep(Duration::from_secs(2)).await;
        assert!(visible(&board).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_does_not_hide_newer_message() {
        let board = board(ScriptedApi::default());
        board.show_message(StatusMessage::success("first")).await;

        sleep(Duration::from_secs(3)).await;
        board.show_message(StatusMessage::error("second")).await;

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(visible(&board).await, Some(("second".into(), Severity::Error)));

        sleep(Duration::from_secs(3)).await;
        assert!(visible(&board).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_signup_message_hides_after_ttl() {
        let board = board(ScriptedApi::with_catalog(chess_catalog()));
        assert_eq!(board.submit_signup().await, Outcome::Failed);
        assert_eq!(board.view().lock().await.message_class(), "error");

        sleep(Duration::from_secs(6)).await;
        assert!(visible(&board).await.is_none());
        assert_eq!(board.view().lock().await.message_class(), "error hidden");
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_unregister_message_hides_after_ttl() {
        let api = ScriptedApi::with_catalog(chess_catalog()).reply(404, detail("Not registered"));
        let board = board(api);
        assert_eq!(board.unregister("Chess Club", "z@x.com").await, Outcome::Rejected);

        sleep(Duration::from_secs(4)).await;
        assert_eq!(
            visible(&board).await,
            Some(("Not registered".into(), Severity::Error))
        );

        sleep(Duration::from_secs(2)).await;
        assert!(visible(&board).await.is_none());
    }

    #[tokio::test]
    async fn success_message_carries_success_class() {
        let api = ScriptedApi::with_catalog(chess_catalog()).reply(200, message("Signed up"));
        let board = board(api);
        board.submit_signup().await;
        assert_eq!(board.view().lock().await.message_class(), "success");
    }
}
