//! Message routing: an ordered table of routes, first match wins.

use crate::{
    app::{App, MAINTENANCE_NOTICE},
    correlator,
    domain::ChatId,
    live_chat,
    messaging::types::{ChatKind, IncomingMessage},
    wizard, Result,
};

/// Handling paths for plain (non-command) messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Maintenance,
    AdminWizard,
    LiveChat,
    AdminReply,
}

/// Precedence order. Wizard input beats live chat so configuration replies from an
/// admin who is also chatting with support are never relayed.
pub const ROUTES: [Route; 4] = [
    Route::Maintenance,
    Route::AdminWizard,
    Route::LiveChat,
    Route::AdminReply,
];

/// A matched route and whatever its guard already looked up.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Matched {
    Maintenance,
    Wizard(String),
    LiveChat,
    AdminReply(ChatId),
}

impl Route {
    async fn guard(self, app: &App, msg: &IncomingMessage) -> Result<Option<Matched>> {
        let actor = msg.actor_id();
        Ok(match self {
            Route::Maintenance => app
                .blocked_by_maintenance(&msg.from)
                .await?
                .then_some(Matched::Maintenance),
            Route::AdminWizard => app.state.admin_label(actor).await?.map(Matched::Wizard),
            Route::LiveChat => (msg.chat.kind == ChatKind::Private
                && app.state.in_live_chat(actor).await?)
                .then_some(Matched::LiveChat),
            Route::AdminReply => {
                if msg.reply_to.is_none() {
                    None
                } else {
                    app.settings
                        .admin_group()
                        .await?
                        .filter(|group| *group == msg.chat.id)
                        .map(Matched::AdminReply)
                }
            }
        })
    }
}

/// Which route, if any, would take `msg`. Guards run in table order and stop at the
/// first match, so later guards never touch the store.
pub async fn select(app: &App, msg: &IncomingMessage) -> Result<Option<Route>> {
    Ok(first_match(app, msg).await?.map(|(route, _)| route))
}

async fn first_match(app: &App, msg: &IncomingMessage) -> Result<Option<(Route, Matched)>> {
    for route in ROUTES {
        if let Some(matched) = route.guard(app, msg).await? {
            return Ok(Some((route, matched)));
        }
    }
    Ok(None)
}

pub(crate) async fn route_message(app: &App, msg: &IncomingMessage) -> Result<()> {
    let Some((route, matched)) = first_match(app, msg).await? else {
        tracing::debug!(actor_id = msg.from.id, chat_id = msg.chat.id.0, "message ignored");
        return Ok(());
    };
    tracing::debug!(
        actor_id = msg.from.id,
        chat_id = msg.chat.id.0,
        route = ?route,
        "routing message"
    );

    match matched {
        Matched::Maintenance => app.reply(msg.chat.id, MAINTENANCE_NOTICE).await,
        Matched::Wizard(label) => wizard::handle(app, msg, &label).await,
        Matched::LiveChat => live_chat::handle_message(app, msg).await,
        Matched::AdminReply(group) => correlator::handle(app, msg, group).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::test_support::*,
        domain::{MessageId, MessageRef, UserId},
        messaging::{
            payload::Payload,
            types::{Content, IncomingUpdate, RepliedMessage},
        },
        state::WizardStep,
    };

    #[tokio::test]
    async fn wizard_beats_live_chat() {
        let h = harness().with_admin(ADMIN).await;
        h.app.state.enter_live_chat(UserId(ADMIN)).await.unwrap();
        h.app
            .state
            .set_admin_step(UserId(ADMIN), WizardStep::WelcomeText)
            .await
            .unwrap();

        let msg = text(ADMIN, "New welcome");
        assert_eq!(select(&h.app, &msg).await.unwrap(), Some(Route::AdminWizard));
    }

    #[tokio::test]
    async fn maintenance_stops_non_admins_only() {
        let h = harness_with(true).with_admin(ADMIN).await;
        h.app.state.enter_live_chat(UserId(7)).await.unwrap();

        assert_eq!(
            select(&h.app, &text(7, "hi")).await.unwrap(),
            Some(Route::Maintenance)
        );
        assert_eq!(select(&h.app, &text(ADMIN, "hi")).await.unwrap(), None);

        h.app.handle(IncomingUpdate::Message(text(7, "hi"))).await;
        assert_eq!(h.messenger.texts_to(7), vec![MAINTENANCE_NOTICE.to_string()]);
        assert!(h.messenger.sent_to(STAFF_GROUP).is_empty());
    }

    #[tokio::test]
    async fn idle_private_message_is_ignored() {
        let h = harness().with_staff_group().await;
        route_message(&h.app, &text(7, "hello?")).await.unwrap();
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn only_replies_in_the_staff_group_reach_the_correlator() {
        let h = harness().with_staff_group().await;
        let mut reply = in_group(STAFF_GROUP, 3, Content::Payload(Payload::text("ok")));
        assert_eq!(select(&h.app, &reply).await.unwrap(), None);

        reply.reply_to = Some(RepliedMessage {
            message: MessageRef {
                chat_id: ChatId(STAFF_GROUP),
                message_id: MessageId(5),
            },
            text: None,
        });
        assert_eq!(select(&h.app, &reply).await.unwrap(), Some(Route::AdminReply));

        let mut elsewhere = reply.clone();
        elsewhere.chat.id = ChatId(-42);
        assert_eq!(select(&h.app, &elsewhere).await.unwrap(), None);
    }

    #[tokio::test]
    async fn live_chat_only_applies_in_private_chats() {
        let h = harness().with_staff_group().await;
        h.app.state.enter_live_chat(UserId(8)).await.unwrap();
        assert_eq!(
            select(&h.app, &text(8, "help")).await.unwrap(),
            Some(Route::LiveChat)
        );
        let group_msg = in_group(-42, 8, Content::Unsupported("poll".into()));
        assert_eq!(select(&h.app, &group_msg).await.unwrap(), None);
    }
}
