//! The user-settings form shown on one's own profile.

use crate::api::ClientRequest;
use crate::api::types::{LoginResponse, UserSettingsForm};
use crate::profile::{Effect, ProfileView};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub show_nsfw: bool,
    pub auth: Option<String>,
}

impl ProfileView {
    pub fn toggle_show_nsfw(&mut self) {
        self.settings.show_nsfw = !self.settings.show_nsfw;
    }

    /// Send the form. Refused without a signed-in session.
    pub fn submit_settings(&mut self) -> Vec<Effect> {
        let Some(jwt) = self.session.jwt() else {
            return vec![Effect::ShowError("not_logged_in".into())];
        };
        self.settings.auth = Some(jwt.clone());
        self.settings_loading = true;
        let form = UserSettingsForm {
            show_nsfw: self.settings.show_nsfw,
            auth: jwt,
        };
        vec![self.track(ClientRequest::SaveUserSettings(form))]
    }

    /// The server accepted the settings and issued a fresh token. Everything
    /// loaded is thrown away and fetched again under the new session.
    pub(crate) fn on_settings_saved(&mut self, response: LoginResponse) -> Vec<Effect> {
        self.reset();
        self.settings_loading = false;

        let mut effects = Vec::new();
        if let Err(e) = self.session.login(&response.jwt) {
            tracing::warn!("settings saved but new token was rejected: {e}");
            effects.push(Effect::ShowError(e.to_string()));
        }
        effects.push(self.refetch());
        effects
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::types::{Comment, UserView};
    use crate::profile::tests::{anonymous, sent_form, view_for};
    use crate::session::tests::token_for;
    use crate::session::{LocalSession, SessionStore};

    #[test]
    fn toggle_flips_flag() {
        let mut view = anonymous("/u/a");
        view.toggle_show_nsfw();
        assert!(view.settings.show_nsfw);
        view.toggle_show_nsfw();
        assert!(!view.settings.show_nsfw);
    }

    #[test]
    fn submit_without_session_is_refused() {
        let mut view = anonymous("/u/a");
        let effects = view.submit_settings();
        assert!(matches!(effects.as_slice(), [Effect::ShowError(_)]));
        assert!(!view.settings_loading);
    }

    #[test]
    fn submit_sends_form_with_session_token() {
        let token = token_for(4, "me", false);
        let mut view = view_for("/u/me", Arc::new(LocalSession::in_memory(&token).unwrap()));
        view.toggle_show_nsfw();

        let effects = view.submit_settings();
        assert!(view.settings_loading);
        assert_eq!(view.settings.auth.as_deref(), Some(token.as_str()));
        match effects.as_slice() {
            [Effect::Send {
                request: ClientRequest::SaveUserSettings(form),
                ..
            }] => {
                assert!(form.show_nsfw);
                assert_eq!(form.auth, token);
            }
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    #[test]
    fn acknowledgement_resets_state_and_updates_session() {
        let session = Arc::new(LocalSession::in_memory(&token_for(4, "me", false)).unwrap());
        let mut view = view_for("/u/me/view/comments/sort/topall/page/3", session.clone());
        view.loading = false;
        view.settings_loading = true;
        view.settings.show_nsfw = true;
        view.user = UserView {
            id: 4,
            name: "me".into(),
            ..Default::default()
        };
        view.comments.push(Comment {
            id: 9,
            ..Default::default()
        });

        let fresh = token_for(4, "me", true);
        let effects = view.on_settings_saved(LoginResponse { jwt: fresh.clone() });

        assert!(view.loading);
        assert!(!view.settings_loading);
        assert!(view.comments.is_empty());
        assert_eq!(view.user, UserView::default());
        assert_eq!(view.settings, SettingsForm::default());
        assert_eq!(session.jwt(), Some(fresh.clone()));

        assert_eq!(effects.len(), 1);
        let form = sent_form(&effects[0]);
        assert_eq!(form.auth.as_deref(), Some(fresh.as_str()));
        assert_eq!(form.page, 3);
    }

    #[test]
    fn rejected_token_is_reported_but_state_still_resets() {
        let session = Arc::new(LocalSession::in_memory(&token_for(4, "me", false)).unwrap());
        let mut view = view_for("/u/me", session);
        view.settings_loading = true;

        let effects = view.on_settings_saved(LoginResponse {
            jwt: "not-a-token".into(),
        });
        assert!(matches!(effects[0], Effect::ShowError(_)));
        assert!(!view.settings_loading);
        assert!(view.loading);
    }
}
