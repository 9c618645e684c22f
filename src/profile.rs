//! State of one open profile page and the user actions that change it.
//!
//! Nothing here performs I/O. Every operation returns [`Effect`]s which the
//! app loop carries out (send on the channel, push a history entry, show a
//! popup, ...).

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::api::types::{Comment, CommunityUser, GetUserDetailsForm, Post, UserView};
use crate::api::{ClientRequest, UserOperation};
use crate::feed::{self, FeedItem};
use crate::session::SessionStore;
use crate::settings::SettingsForm;
use crate::view_state::{LocationParams, SortType, Target, ViewMode, ViewState};

/// Side effects requested by the profile view.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a request on the shared channel.
    Send {
        request: ClientRequest,
        request_id: Uuid,
    },
    /// Record a new navigation path.
    PushLocation(String),
    /// Blocking, modal error notice.
    ShowError(String),
    /// Non-blocking confirmation.
    Notice(String),
    SetTitle(String),
    ScrollToTop,
}

/// Knobs the profile view takes from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOptions {
    pub fetch_limit: i64,
    pub site_name: Option<String>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            fetch_limit: 20,
            site_name: None,
        }
    }
}

pub struct ProfileView {
    pub view_state: ViewState,
    pub user: UserView,
    pub follows: Vec<CommunityUser>,
    pub moderates: Vec<CommunityUser>,
    pub comments: Vec<Comment>,
    pub posts: Vec<Post>,
    pub loading: bool,
    pub settings: SettingsForm,
    pub settings_loading: bool,
    /// Latest outstanding request id per operation.
    pub(crate) pending: HashMap<UserOperation, Uuid>,
    pub(crate) session: Arc<dyn SessionStore>,
    options: ProfileOptions,
}

impl ProfileView {
    pub fn new(
        location: &LocationParams,
        session: Arc<dyn SessionStore>,
        options: ProfileOptions,
    ) -> Self {
        Self {
            view_state: ViewState::from_location(location),
            user: UserView::default(),
            follows: Vec::new(),
            moderates: Vec::new(),
            comments: Vec::new(),
            posts: Vec::new(),
            loading: true,
            settings: SettingsForm::default(),
            settings_loading: false,
            pending: HashMap::new(),
            session,
            options,
        }
    }

    /// Whether the loaded profile belongs to the signed-in user.
    pub fn is_current_user(&self) -> bool {
        self.session
            .current_user()
            .is_some_and(|claims| claims.id == self.user.id)
    }

    /// Path for the current state. Profiles opened by id switch to the
    /// `/u/{name}` form once the user has loaded.
    pub fn location(&self) -> String {
        match self.view_state.target {
            Target::Id(_) if !self.user.name.is_empty() => ViewState {
                target: Target::Name(self.user.name.clone()),
                ..self.view_state.clone()
            }
            .to_location(),
            _ => self.view_state.to_location(),
        }
    }

    /// Items to display for the active view, merged and sorted as needed.
    pub fn feed(&self) -> Vec<FeedItem<'_>> {
        feed::items_for_view(
            self.view_state.view,
            &self.comments,
            &self.posts,
            self.view_state.sort,
        )
    }

    pub fn title(&self) -> String {
        match self.options.site_name {
            Some(ref site) => format!("/u/{} - {site}", self.user.name),
            None => format!("/u/{}", self.user.name),
        }
    }

    // -- Requests -----------------------------------------------------------

    /// Build a `GetUserDetails` request for the current view state and
    /// remember its id as the latest outstanding fetch.
    pub fn refetch(&mut self) -> Effect {
        let (user_id, username) = match self.view_state.target {
            Target::Id(id) => (Some(id), None),
            Target::Name(ref name) => (None, Some(name.clone())),
        };
        let form = GetUserDetailsForm {
            user_id,
            username,
            sort: self.view_state.sort,
            saved_only: self.view_state.view == ViewMode::Saved,
            page: self.view_state.page,
            limit: self.options.fetch_limit,
            auth: self.session.jwt(),
        };
        self.track(ClientRequest::GetUserDetails(form))
    }

    pub(crate) fn track(&mut self, request: ClientRequest) -> Effect {
        let request_id = Uuid::new_v4();
        self.pending.insert(request.op(), request_id);
        Effect::Send {
            request,
            request_id,
        }
    }

    // -- Paginator & selectors ----------------------------------------------

    /// Whether the previous-page control should be offered.
    pub fn has_prev_page(&self) -> bool {
        self.view_state.page > 1
    }

    pub fn next_page(&mut self) -> Vec<Effect> {
        self.view_state.page += 1;
        self.changed()
    }

    /// Goes back one page unconditionally; callers gate on
    /// [`ProfileView::has_prev_page`].
    pub fn prev_page(&mut self) -> Vec<Effect> {
        self.view_state.page -= 1;
        self.changed()
    }

    /// The previous-page control: does nothing on the first page.
    pub fn page_back(&mut self) -> Vec<Effect> {
        if self.has_prev_page() {
            self.prev_page()
        } else {
            Vec::new()
        }
    }

    pub fn set_view(&mut self, view: ViewMode) -> Vec<Effect> {
        self.view_state.view = view;
        self.view_state.page = 1;
        self.changed()
    }

    pub fn set_sort(&mut self, sort: SortType) -> Vec<Effect> {
        self.view_state.sort = sort;
        self.view_state.page = 1;
        self.changed()
    }

    /// Jump straight to a page, as the `:page` command does.
    pub fn set_page(&mut self, page: i64) -> Vec<Effect> {
        self.view_state.page = page;
        self.changed()
    }

    fn changed(&mut self) -> Vec<Effect> {
        vec![Effect::PushLocation(self.location()), self.refetch()]
    }

    // -- Navigation ---------------------------------------------------------

    /// Browser-style "back": throw away everything loaded and rebuild from
    /// the path, not from the in-memory state.
    pub fn navigate_back(&mut self, location: &LocationParams) -> Vec<Effect> {
        self.reset();
        self.view_state = ViewState::from_location(location);
        vec![self.refetch()]
    }

    /// Open another profile (or another state of this one) as a new
    /// history entry.
    pub fn open(&mut self, location: &LocationParams) -> Vec<Effect> {
        let mut effects = self.navigate_back(location);
        effects.insert(0, Effect::PushLocation(self.location()));
        effects
    }

    /// Return profile, collections and form to their initial values.
    pub(crate) fn reset(&mut self) {
        self.user = UserView::default();
        self.follows.clear();
        self.moderates.clear();
        self.comments.clear();
        self.posts.clear();
        self.loading = true;
        self.settings = SettingsForm::default();
        self.settings_loading = false;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::LocalSession;
    use crate::session::tests::token_for;

    pub(crate) fn view_for(path: &str, session: Arc<dyn SessionStore>) -> ProfileView {
        let location = LocationParams::parse(path).expect("profile path");
        ProfileView::new(&location, session, ProfileOptions::default())
    }

    pub(crate) fn anonymous(path: &str) -> ProfileView {
        view_for(path, Arc::new(LocalSession::anonymous()))
    }

    pub(crate) fn sent_form(effect: &Effect) -> &GetUserDetailsForm {
        match effect {
            Effect::Send {
                request: ClientRequest::GetUserDetails(form),
                ..
            } => form,
            other => panic!("expected a GetUserDetails send, got {other:?}"),
        }
    }

    #[test]
    fn starts_loading_with_state_from_path() {
        let view = anonymous("/u/alice/view/comments/sort/topweek/page/4");
        assert!(view.loading);
        assert_eq!(view.view_state.view, ViewMode::Comments);
        assert_eq!(view.view_state.sort, SortType::TopWeek);
        assert_eq!(view.view_state.page, 4);
        assert!(view.comments.is_empty());
    }

    #[test]
    fn refetch_builds_form_from_view_state() {
        let mut view = anonymous("/u/alice/view/saved/sort/topday/page/2");
        let effect = view.refetch();
        let form = sent_form(&effect);
        assert_eq!(form.username.as_deref(), Some("alice"));
        assert_eq!(form.user_id, None);
        assert_eq!(form.sort, SortType::TopDay);
        assert!(form.saved_only);
        assert_eq!(form.page, 2);
        assert_eq!(form.limit, 20);
        assert_eq!(form.auth, None);
    }

    #[test]
    fn saved_only_is_exclusive_to_saved_view() {
        for view_mode in ViewMode::ALL {
            let mut view = anonymous("/u/a");
            view.view_state.view = view_mode;
            let effect = view.refetch();
            assert_eq!(sent_form(&effect).saved_only, view_mode == ViewMode::Saved);
        }
    }

    #[test]
    fn refetch_by_id_and_with_session_token() {
        let token = token_for(3, "me", false);
        let session = Arc::new(LocalSession::in_memory(&token).unwrap());
        let mut view = view_for("/user/99", session);
        let effect = view.refetch();
        let form = sent_form(&effect);
        assert_eq!(form.user_id, Some(99));
        assert_eq!(form.username, None);
        assert_eq!(form.auth.as_deref(), Some(token.as_str()));
    }

    #[test]
    fn refetch_records_latest_request_id() {
        let mut view = anonymous("/u/a");
        let Effect::Send { request_id: first, .. } = view.refetch() else {
            panic!("expected send");
        };
        let Effect::Send { request_id: second, .. } = view.refetch() else {
            panic!("expected send");
        };
        assert_ne!(first, second);
        assert_eq!(view.pending.get(&UserOperation::GetUserDetails), Some(&second));
    }

    #[test]
    fn next_then_prev_returns_to_same_page_and_request() {
        let mut view = anonymous("/u/bob/view/posts/sort/topall/page/3");
        let before = sent_form(&view.refetch()).clone();

        let next = view.next_page();
        assert_eq!(view.view_state.page, 4);
        assert_eq!(
            next[0],
            Effect::PushLocation("/u/bob/view/posts/sort/topall/page/4".into())
        );
        assert_eq!(sent_form(&next[1]).page, 4);

        let prev = view.prev_page();
        assert_eq!(view.view_state.page, 3);
        assert_eq!(
            prev[0],
            Effect::PushLocation("/u/bob/view/posts/sort/topall/page/3".into())
        );
        assert_eq!(sent_form(&prev[1]), &before);
    }

    #[test]
    fn profile_opened_by_id_uses_name_once_loaded() {
        let mut view = anonymous("/user/42/view/posts");
        assert_eq!(view.location(), "/user/42/view/posts/sort/new/page/1");

        view.user.id = 42;
        view.user.name = "alice".into();
        let next = view.next_page();
        assert_eq!(
            next[0],
            Effect::PushLocation("/u/alice/view/posts/sort/new/page/2".into())
        );
        // The request still targets the id it was opened with.
        assert_eq!(sent_form(&next[1]).user_id, Some(42));
    }

    #[test]
    fn prev_page_is_only_offered_past_first_page() {
        let mut view = anonymous("/u/a");
        assert!(!view.has_prev_page());
        view.next_page();
        assert!(view.has_prev_page());
    }

    #[test]
    fn page_back_control_is_inert_on_first_page() {
        let mut view = anonymous("/u/a/view/posts");
        assert!(view.page_back().is_empty());
        assert_eq!(view.view_state.page, 1);

        view.next_page();
        let effects = view.page_back();
        assert_eq!(view.view_state.page, 1);
        assert_eq!(
            effects[0],
            Effect::PushLocation("/u/a/view/posts/sort/new/page/1".into())
        );
    }

    #[test]
    fn prev_page_itself_does_not_floor() {
        let mut view = anonymous("/u/a");
        let effects = view.prev_page();
        assert_eq!(view.view_state.page, 0);
        assert_eq!(sent_form(&effects[1]).page, 0);
    }

    #[test]
    fn selector_changes_reset_page_and_refetch() {
        let mut view = anonymous("/u/a/view/overview/sort/new/page/5");
        let effects = view.set_sort(SortType::TopYear);
        assert_eq!(view.view_state.page, 1);
        assert_eq!(
            effects[0],
            Effect::PushLocation("/u/a/view/overview/sort/topyear/page/1".into())
        );
        assert_eq!(sent_form(&effects[1]).sort, SortType::TopYear);

        view.next_page();
        let effects = view.set_view(ViewMode::Saved);
        assert_eq!(view.view_state.page, 1);
        assert!(sent_form(&effects[1]).saved_only);
    }

    #[test]
    fn back_navigation_rebuilds_from_path() {
        let mut view = anonymous("/u/a/view/posts/sort/topall/page/7");
        view.loading = false;
        view.comments.push(Comment {
            id: 1,
            ..Default::default()
        });
        view.posts.push(Post {
            id: 2,
            ..Default::default()
        });
        view.user.name = "a".into();

        let location = LocationParams::parse("/u/a/view/comments/sort/new/page/2").unwrap();
        let effects = view.navigate_back(&location);

        assert!(view.loading);
        assert!(view.comments.is_empty());
        assert!(view.posts.is_empty());
        assert_eq!(view.user, UserView::default());
        assert_eq!(view.view_state.view, ViewMode::Comments);
        assert_eq!(view.view_state.page, 2);
        assert_eq!(effects.len(), 1);
        assert_eq!(sent_form(&effects[0]).page, 2);
    }

    #[test]
    fn open_pushes_new_location_and_reloads() {
        let mut view = anonymous("/u/a/view/posts/sort/topall/page/7");
        view.loading = false;
        view.posts.push(Post {
            id: 2,
            ..Default::default()
        });

        let effects = view.open(&LocationParams::for_user("b"));
        assert!(view.loading);
        assert!(view.posts.is_empty());
        assert_eq!(
            effects[0],
            Effect::PushLocation("/u/b/view/overview/sort/new/page/1".into())
        );
        assert_eq!(sent_form(&effects[1]).username.as_deref(), Some("b"));
    }

    #[test]
    fn set_page_keeps_view_and_sort() {
        let mut view = anonymous("/u/a/view/comments/sort/topday/page/1");
        let effects = view.set_page(6);
        assert_eq!(
            effects[0],
            Effect::PushLocation("/u/a/view/comments/sort/topday/page/6".into())
        );
        assert_eq!(sent_form(&effects[1]).page, 6);
    }

    #[test]
    fn title_includes_site_name_when_configured() {
        let location = LocationParams::for_user("alice");
        let mut view = ProfileView::new(
            &location,
            Arc::new(LocalSession::anonymous()),
            ProfileOptions {
                fetch_limit: 10,
                site_name: Some("Lemmy".into()),
            },
        );
        view.user.name = "alice".into();
        assert_eq!(view.title(), "/u/alice - Lemmy");
        assert_eq!(sent_form(&view.refetch()).limit, 10);
    }
}
