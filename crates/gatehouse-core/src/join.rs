//! Channel/group join requests: approve, register, welcome, audit.

use crate::{
    app::App,
    audit::{AuditRecord, JoinRecord},
    messaging::types::JoinRequest,
    settings, welcome, Result,
};

pub(crate) async fn handle(app: &App, req: &JoinRequest) -> Result<()> {
    let user = &req.from;
    if !app.settings.flag(settings::AUTO_ACCEPT_ENABLED).await? {
        tracing::info!(
            actor_id = user.id,
            chat_id = req.chat_id.0,
            "auto-accept off; join request left pending"
        );
        return Ok(());
    }

    if let Err(e) = app
        .messenger
        .approve_join_request(req.chat_id, user.user_id())
        .await
    {
        tracing::error!(
            actor_id = user.id,
            chat_id = req.chat_id.0,
            "failed to approve join request: {e}"
        );
        let failed = JoinRecord::new(
            user.id,
            user.username.as_deref(),
            false,
            Some(&e.to_string()),
        );
        record(app, failed).await;
        return Ok(());
    }

    app.registry.upsert_user(user).await?;

    let entry = match welcome::send(app, user.user_id()).await {
        Ok(_) => JoinRecord::new(user.id, user.username.as_deref(), true, None),
        Err(e) => {
            tracing::warn!(actor_id = user.id, "join approved but welcome failed: {e}");
            JoinRecord::new(
                user.id,
                user.username.as_deref(),
                false,
                Some(&e.to_string()),
            )
        }
    };
    tracing::info!(
        actor_id = user.id,
        chat_id = req.chat_id.0,
        dm_sent = entry.dm_sent,
        "join request approved"
    );
    record(app, entry).await;
    Ok(())
}

async fn record(app: &App, entry: JoinRecord) {
    if let Err(e) = app.audit.append(AuditRecord::Join(entry)).await {
        tracing::error!("failed to record join: {e}");
    }
}
