//! Routes inbound channel messages to the profile view.
//!
//! One message is handled to completion before the next. Messages carrying
//! an error mutate nothing; messages for operations this view doesn't know
//! belong to other views sharing the channel and are skipped.

use crate::api::types::{Comment, CommentResponse, UserDetailsResponse};
use crate::api::{Envelope, ServerMessage, UserOperation};
use crate::profile::{Effect, ProfileView};

impl ProfileView {
    pub fn handle_message(&mut self, envelope: Envelope) -> Vec<Effect> {
        let Some(op) = envelope.operation() else {
            tracing::debug!(op = %envelope.op, "ignoring message for another view");
            return Vec::new();
        };

        if let Some(error) = envelope.error {
            tracing::debug!(op = op.tag(), %error, "server reported an error");
            return vec![Effect::ShowError(error)];
        }

        if self.is_stale(op, &envelope) {
            tracing::debug!(op = op.tag(), "discarding stale response");
            return Vec::new();
        }

        let message = match ServerMessage::decode(op, envelope.payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("skipping message: {e}");
                return Vec::new();
            }
        };

        match message {
            ServerMessage::UserDetails(details) => self.on_user_details(details),
            ServerMessage::CommentEdited(CommentResponse { comment }) => {
                self.with_comment(op, comment.id, |loaded| {
                    loaded.content = comment.content;
                    loaded.updated = comment.updated;
                    loaded.removed = comment.removed;
                    loaded.deleted = comment.deleted;
                    loaded.upvotes = comment.upvotes;
                    loaded.downvotes = comment.downvotes;
                    loaded.score = comment.score;
                });
                Vec::new()
            }
            ServerMessage::CommentCreated(_) => {
                // The new comment is not added to the loaded feed.
                vec![Effect::Notice("Reply sent".into())]
            }
            ServerMessage::CommentSaved(CommentResponse { comment }) => {
                self.with_comment(op, comment.id, |loaded| loaded.saved = comment.saved);
                Vec::new()
            }
            ServerMessage::CommentVoted(CommentResponse { comment }) => {
                self.with_comment(op, comment.id, |loaded| {
                    loaded.score = comment.score;
                    loaded.upvotes = comment.upvotes;
                    loaded.downvotes = comment.downvotes;
                    if comment.my_vote.is_some() {
                        loaded.my_vote = comment.my_vote;
                    }
                });
                Vec::new()
            }
            ServerMessage::SettingsSaved(login) => self.on_settings_saved(login),
        }
    }

    /// A response echoing an id that isn't the latest one we sent for its
    /// operation. Responses without an id can't be checked and are accepted.
    fn is_stale(&self, op: UserOperation, envelope: &Envelope) -> bool {
        match (envelope.request_id, self.pending.get(&op)) {
            (Some(echoed), Some(latest)) => echoed != *latest,
            _ => false,
        }
    }

    fn on_user_details(&mut self, details: UserDetailsResponse) -> Vec<Effect> {
        let UserDetailsResponse {
            user,
            follows,
            moderates,
            comments,
            posts,
        } = details;
        self.user = user;
        self.follows = follows;
        self.moderates = moderates;
        self.comments = comments;
        self.posts = posts;
        self.loading = false;

        if let Some(claims) = self.session.current_user()
            && claims.id == self.user.id
        {
            self.settings.show_nsfw = claims.show_nsfw;
        }

        vec![Effect::SetTitle(self.title()), Effect::ScrollToTop]
    }

    fn with_comment(&mut self, op: UserOperation, id: i32, update: impl FnOnce(&mut Comment)) {
        match self.comments.iter_mut().find(|c| c.id == id) {
            Some(comment) => update(comment),
            None => tracing::warn!(op = op.tag(), id, "comment is not loaded; ignoring update"),
        }
    }
}
