//! The admin panel: an inline-keyboard menu over settings, admins, stats and the wizard.

use crate::{
    app::App,
    callbacks::Answer,
    domain::{ChatId, UserId},
    messaging::types::{CallbackEvent, InlineButton, InlineKeyboard},
    settings::{self, MAX_WELCOME_BUTTONS},
    state::WizardStep,
    store::UserRecord,
    utils::{escape_html, truncate_text},
    welcome, Result,
};

pub const ACCESS_DENIED: &str = "❌ Access denied. You are not authorized as an admin.";
pub const PANEL_TEXT: &str =
    "🔧 <b>Advanced Admin Panel</b>\n\nUse the buttons below to configure the bot:";

pub const CB_BACK: &str = "back_to_admin";
const CB_REMOVE_BUTTON: &str = "remove_custom_btn_";
const CB_REMOVE_ADMIN: &str = "remove_admin_";

const LOGS_MAX_CHARS: usize = 4000;

/// Buttons that only arm a wizard step and show its prompt.
const PROMPTS: [(&str, WizardStep, &str); 9] = [
    (
        "set_welcome_text",
        WizardStep::WelcomeText,
        "📝 <b>Set Welcome Text</b>\n\nSend the new welcome message text.",
    ),
    (
        "set_welcome_image",
        WizardStep::WelcomeImage,
        "🖼️ <b>Set Welcome Image</b>\n\nSend the image.",
    ),
    (
        "set_admin_group",
        WizardStep::AdminGroup,
        "👥 <b>Set Admin Group</b>\n\nSend the numeric ID of the group that receives live chat \
         messages. Run /id inside that group to find it.",
    ),
    (
        "set_signup_url",
        WizardStep::SignupUrl,
        "🔑 <b>Set Signup URL</b>\n\nSend the link (https://...).",
    ),
    (
        "set_join_group_url",
        WizardStep::JoinGroupUrl,
        "📢 <b>Set Join Group URL</b>\n\nSend the link (https://...).",
    ),
    (
        "set_daily_bonuses",
        WizardStep::DailyBonusesUrl,
        "🎁 <b>Set Daily Bonuses URL</b>\n\nSend the link (https://...).",
    ),
    (
        "set_download_apk",
        WizardStep::DownloadFile,
        "📥 <b>Set Download File</b>\n\nSend the file users receive from the Download button.",
    ),
    (
        "send_broadcast",
        WizardStep::Broadcast,
        "📡 <b>Send Message to All Users</b>\n\nSend the message (text, photo, video, etc.) to broadcast.",
    ),
    (
        "add_admin_prompt",
        WizardStep::AddAdminId,
        "👑 <b>Add Admin</b>\n\nSend the Telegram <b>User ID</b> (numbers only), or <b>forward a \
         message</b> from the user you want to add.",
    ),
];

pub fn panel_keyboard() -> InlineKeyboard {
    fn cb(label: &str, data: &str) -> InlineButton {
        InlineButton::callback(label, data)
    }
    InlineKeyboard::new(vec![
        vec![
            cb("📝 Set Welcome Text", "set_welcome_text"),
            cb("🖼️ Set Welcome Image", "set_welcome_image"),
        ],
        vec![cb("👁 Preview Welcome Message", "preview_welcome")],
        vec![cb(
            &format!("🔘 Custom Welcome Buttons (max {MAX_WELCOME_BUTTONS})"),
            "custom_welcome_buttons",
        )],
        vec![
            cb("🔑 Signup URL", "set_signup_url"),
            cb("📢 Join Group URL", "set_join_group_url"),
        ],
        vec![
            cb("🎁 Daily Bonuses URL", "set_daily_bonuses"),
            cb("📥 Download File", "set_download_apk"),
        ],
        vec![cb("👥 Set Admin Group", "set_admin_group")],
        vec![cb("⚙️ Bot Configuration", "bot_config")],
        vec![
            cb("🔄 Toggle Auto-Accept Join", "toggle_auto_accept"),
            cb("💬 Toggle Live Chat", "toggle_live_chat"),
        ],
        vec![
            cb("📡 Send Message to All Users", "send_broadcast"),
            cb("📊 View User Stats", "view_users"),
        ],
        vec![cb("👑 Manage Admins", "manage_admins")],
        vec![cb("📑 View Logs", "view_logs")],
    ])
}

fn back_keyboard() -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![back_button()])
}

fn back_button() -> InlineButton {
    InlineButton::callback("🔙 Back to Admin Panel", CB_BACK)
}

/// Replace the pressed message, or post a new one when it can't be edited.
pub(crate) async fn show(
    app: &App,
    cb: &CallbackEvent,
    html: &str,
    keyboard: Option<InlineKeyboard>,
) -> Result<()> {
    if let Some(msg) = cb.message {
        match app.messenger.edit_html(msg, html, keyboard.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!(actor_id = cb.from.id, "edit failed, sending instead: {e}");
            }
        }
    }
    app.send(ChatId::from(cb.from.user_id()), html, keyboard)
        .await
        .map(|_| ())
}

pub(crate) async fn handle(app: &App, cb: &CallbackEvent) -> Result<Answer> {
    let admin = cb.from.user_id();
    if !app.is_admin(admin).await? {
        tracing::warn!(actor_id = admin.0, data = %cb.data, "admin callback from non-admin");
        return Ok(Answer::alert(ACCESS_DENIED));
    }

    let data = cb.data.as_str();
    if let Some((_, step, prompt)) = PROMPTS.iter().find(|(d, ..)| *d == data) {
        app.state.set_admin_step(admin, *step).await?;
        show(app, cb, prompt, Some(back_keyboard())).await?;
        return Ok(Answer::silent());
    }
    if let Some(idx) = data.strip_prefix(CB_REMOVE_BUTTON) {
        return remove_button(app, cb, idx).await;
    }
    if let Some(id) = data.strip_prefix(CB_REMOVE_ADMIN) {
        return remove_admin(app, cb, id).await;
    }

    match data {
        CB_BACK => {
            app.state.clear_admin(admin).await?;
            app.drafts.discard(admin).await;
            show(app, cb, PANEL_TEXT, Some(panel_keyboard())).await?;
        }
        "preview_welcome" => preview_welcome(app, cb).await?,
        "custom_welcome_buttons" => show_buttons(app, cb).await?,
        "add_custom_btn" => return add_button(app, cb).await,
        "bot_config" => show_config(app, cb).await?,
        "toggle_auto_accept" => {
            let on = app.settings.toggle(settings::AUTO_ACCEPT_ENABLED).await?;
            tracing::info!(actor_id = admin.0, on, "auto-accept toggled");
            let html = format!(
                "🔄 <b>Auto-Accept Join</b> is now <b>{}</b>\n\nWhen OFF, join requests are left \
                 pending. /start, live chat and broadcasts keep working.",
                on_off(on)
            );
            show(app, cb, &html, Some(back_keyboard())).await?;
        }
        "toggle_live_chat" => {
            let on = app.settings.toggle(settings::LIVE_CHAT_ENABLED).await?;
            tracing::info!(actor_id = admin.0, on, "live chat toggled");
            let html = format!(
                "💬 <b>Live Chat</b> is now <b>{}</b>\n\nWhen OFF, the Live Chat button is hidden \
                 from the welcome message.",
                on_off(on)
            );
            show(app, cb, &html, Some(back_keyboard())).await?;
        }
        "view_users" => show_users(app, cb).await?,
        "manage_admins" => show_admins(app, cb).await?,
        "noop_superadmin" => return Ok(Answer::alert("Superadmin cannot be removed.")),
        "view_logs" => show_logs(app, cb).await?,
        other => {
            tracing::debug!(actor_id = admin.0, data = other, "unknown callback");
        }
    }
    Ok(Answer::silent())
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

async fn preview_welcome(app: &App, cb: &CallbackEvent) -> Result<()> {
    let html = match welcome::send(app, cb.from.user_id()).await {
        Ok(_) => "✅ <b>Preview sent!</b>\n\nThe welcome message above is exactly what new users \
                  will see."
            .to_string(),
        Err(e) => {
            tracing::warn!(actor_id = cb.from.id, "welcome preview failed: {e}");
            format!(
                "❌ <b>Preview failed</b>\n\n{}\n\nCheck welcome text/image and try again.",
                escape_html(&e.to_string())
            )
        }
    };
    show(app, cb, &html, Some(back_keyboard())).await
}

async fn show_buttons(app: &App, cb: &CallbackEvent) -> Result<()> {
    let buttons = app.settings.welcome_buttons().await?;

    let lines = buttons
        .iter()
        .enumerate()
        .map(|(i, b)| {
            format!(
                "{}. {} → {}",
                i + 1,
                escape_html(&b.label),
                escape_html(&truncate_text(&b.url, 40))
            )
        })
        .collect::<Vec<_>>();
    let listing = if lines.is_empty() {
        "None. Add buttons below.".to_string()
    } else {
        lines.join("\n")
    };

    let mut rows = buttons
        .iter()
        .enumerate()
        .map(|(i, b)| {
            vec![InlineButton::callback(
                format!("❌ Remove {}. {}", i + 1, truncate_text(&b.label, 20)),
                format!("{CB_REMOVE_BUTTON}{i}"),
            )]
        })
        .collect::<Vec<_>>();
    if buttons.len() < MAX_WELCOME_BUTTONS {
        rows.push(vec![InlineButton::callback("➕ Add Button", "add_custom_btn")]);
    }
    rows.push(vec![back_button()]);

    let html = format!(
        "🔘 <b>Custom Welcome Buttons</b> ({}/{MAX_WELCOME_BUTTONS})\n\n<b>Current buttons:</b>\n\
         {listing}\n\n• <b>Add:</b> label + URL, one row per button under the welcome message.\n\
         • <b>Remove:</b> use the ❌ button.",
        buttons.len()
    );
    show(app, cb, &html, Some(InlineKeyboard::new(rows))).await
}

async fn add_button(app: &App, cb: &CallbackEvent) -> Result<Answer> {
    let admin = cb.from.user_id();
    if app.settings.welcome_buttons().await?.len() >= MAX_WELCOME_BUTTONS {
        return Ok(Answer::alert(format!(
            "The button list is full ({MAX_WELCOME_BUTTONS}/{MAX_WELCOME_BUTTONS}). Remove one first."
        )));
    }
    app.drafts.discard(admin).await;
    app.state
        .set_admin_step(admin, WizardStep::CustomButtonLabel)
        .await?;
    show(
        app,
        cb,
        "🔘 <b>Add Button</b>\n\nSend the <b>button label</b> (text shown on the button).",
        Some(back_keyboard()),
    )
    .await?;
    Ok(Answer::silent())
}

async fn remove_button(app: &App, cb: &CallbackEvent, raw: &str) -> Result<Answer> {
    let Ok(idx) = raw.parse::<usize>() else {
        return Ok(Answer::alert("Invalid data."));
    };
    let mut buttons = app.settings.welcome_buttons().await?;
    if idx >= buttons.len() {
        return Ok(Answer::alert("Button not found."));
    }
    let removed = buttons.remove(idx);
    app.settings.set_welcome_buttons(buttons).await?;
    tracing::info!(actor_id = cb.from.id, label = %removed.label, "welcome button removed");
    show_buttons(app, cb).await?;
    Ok(Answer::toast("✅ Button removed."))
}

async fn show_config(app: &App, cb: &CallbackEvent) -> Result<()> {
    let cfg = app.settings.snapshot().await?;
    let value = |key: &str| cfg.get(key).map(|v| v.trim()).unwrap_or_default();
    let set = |key: &str| {
        if value(key).is_empty() {
            "❌ Not Set"
        } else {
            "✅ Set"
        }
    };
    let group = match value(settings::ADMIN_GROUP_ID) {
        "" => "❌ Not Set".to_string(),
        id => format!("<code>{}</code>", escape_html(id)),
    };

    let html = format!(
        "⚙️ <b>Bot Configuration</b>\n\n\
         📝 <b>Welcome Text:</b> {}\n\
         🖼️ <b>Welcome Image:</b> {}\n\
         🔘 <b>Welcome Buttons:</b> {}/{MAX_WELCOME_BUTTONS}\n\
         🔑 <b>Signup URL:</b> {}\n\
         📢 <b>Join Group URL:</b> {}\n\
         🎁 <b>Daily Bonuses URL:</b> {}\n\
         📥 <b>Download File:</b> {}\n\
         👥 <b>Admin Group:</b> {group}\n\
         💬 <b>Live Chat:</b> {}\n\
         🔄 <b>Auto-Accept Join:</b> {}",
        escape_html(&truncate_text(value(settings::WELCOME_TEXT), 50)),
        set(settings::WELCOME_IMAGE),
        app.settings.welcome_buttons().await?.len(),
        set(settings::SIGNUP_URL),
        set(settings::JOIN_GROUP_URL),
        set(settings::DAILY_BONUSES_URL),
        set(settings::DOWNLOAD_APK),
        on_off(app.settings.flag(settings::LIVE_CHAT_ENABLED).await?),
        on_off(app.settings.flag(settings::AUTO_ACCEPT_ENABLED).await?),
    );
    show(app, cb, &html, Some(back_keyboard())).await
}

fn describe_user(u: &UserRecord) -> String {
    let handle = u
        .username
        .as_deref()
        .map(|n| format!("@{n}"))
        .unwrap_or_else(|| "No username".to_string());
    format!(
        "• {} ({})",
        escape_html(&handle),
        escape_html(u.first_name.as_deref().unwrap_or_default())
    )
}

async fn show_users(app: &App, cb: &CallbackEvent) -> Result<()> {
    let total = app.registry.user_count().await?;
    let recent = app.registry.recent_users(5).await?;
    let listing = if recent.is_empty() {
        "No users yet".to_string()
    } else {
        recent.iter().map(describe_user).collect::<Vec<_>>().join("\n")
    };
    let html = format!(
        "👥 <b>User Statistics</b>\n\n📊 <b>Total Users:</b> {total}\n\n<b>Recent Users:</b>\n{listing}"
    );
    show(app, cb, &html, Some(back_keyboard())).await
}

async fn show_admins(app: &App, cb: &CallbackEvent) -> Result<()> {
    let mut lines = Vec::new();
    let mut rows = Vec::new();
    for id in app.registry.admin_ids().await? {
        let display = match app.registry.get_user(id).await? {
            Some(UserRecord {
                username: Some(name),
                ..
            }) => format!("@{name}"),
            Some(UserRecord {
                first_name: Some(name),
                ..
            }) => format!("{name} (ID: {})", id.0),
            _ => format!("ID {}", id.0),
        };
        if app.is_superadmin(id) {
            lines.push(format!("• {} — <code>{}</code> 👑", escape_html(&display), id.0));
            rows.push(vec![InlineButton::callback(
                format!("🔒 {display} (Superadmin)"),
                "noop_superadmin",
            )]);
        } else {
            lines.push(format!("• {} — <code>{}</code>", escape_html(&display), id.0));
            rows.push(vec![InlineButton::callback(
                format!("❌ Remove {display}"),
                format!("{CB_REMOVE_ADMIN}{}", id.0),
            )]);
        }
    }
    rows.push(vec![InlineButton::callback("➕ Add Admin", "add_admin_prompt")]);
    rows.push(vec![back_button()]);

    let listing = if lines.is_empty() {
        "None yet.".to_string()
    } else {
        lines.join("\n")
    };
    let html = format!(
        "👑 <b>Manage Admins</b>\n\n<b>Current admins:</b>\n{listing}\n\n\
         • <b>Add:</b> use the button below, then send a User ID or forward a message from that user.\n\
         • <b>Remove:</b> use the ❌ button (Superadmin cannot be removed)."
    );
    show(app, cb, &html, Some(InlineKeyboard::new(rows))).await
}

async fn remove_admin(app: &App, cb: &CallbackEvent, raw: &str) -> Result<Answer> {
    let Ok(id) = raw.parse::<i64>().map(UserId) else {
        return Ok(Answer::alert("Invalid data."));
    };
    if app.is_superadmin(id) {
        return Ok(Answer::alert("Cannot remove Superadmin."));
    }
    if !app.registry.remove_admin(id).await? {
        show_admins(app, cb).await?;
        return Ok(Answer::alert("That user is not an admin."));
    }
    tracing::info!(actor_id = cb.from.id, target = id.0, "admin removed");
    show_admins(app, cb).await?;
    Ok(Answer::toast("✅ Admin removed."))
}

async fn show_logs(app: &App, cb: &CallbackEvent) -> Result<()> {
    let joins = app.audit.recent_joins(10).await?;
    let last_broadcast = app.audit.recent_broadcasts(1).await?.into_iter().next();

    if joins.is_empty() && last_broadcast.is_none() {
        return show(
            app,
            cb,
            "📑 <b>No Logs Available</b>\n\nNo activity logged yet.",
            Some(back_keyboard()),
        )
        .await;
    }

    let mut html = String::from("📑 <b>Recent Logs</b>\n");
    if let Some(b) = last_broadcast {
        html.push_str(&format!(
            "\n<b>Last broadcast</b> ({}): {} of {} delivered, {} blocked, {} failed [{}]\n",
            escape_html(&b.timestamp),
            b.delivered,
            b.total,
            b.blocked,
            b.failed,
            b.message_type
        ));
    }
    if !joins.is_empty() {
        html.push_str("\n<b>Join requests</b>\n");
    }
    for j in &joins {
        let status = if j.dm_sent { "✅" } else { "❌" };
        let err = match (&j.error, j.dm_sent) {
            (Some(e), false) => format!(" ({})", escape_html(e)),
            _ => String::new(),
        };
        html.push_str(&format!(
            "• @{} (ID: {}) - {status}{err}\n",
            escape_html(&j.username),
            j.user_id
        ));
    }

    if html.chars().count() > LOGS_MAX_CHARS {
        html = html.chars().take(LOGS_MAX_CHARS).collect();
        html.push_str("\n\n... (truncated)");
    }
    show(app, cb, &html, Some(back_keyboard())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::test_support::*,
        audit::{AuditRecord, AuditSink, JoinRecord},
        domain::Actor,
        messaging::types::{ButtonAction, IncomingUpdate},
        settings::WelcomeButton,
        store::Registry,
    };

    async fn press(h: &Harness, from: i64, data: &str) {
        h.app.handle(IncomingUpdate::Callback(callback(from, data))).await;
    }

    fn callbacks_of(kb: &InlineKeyboard) -> Vec<String> {
        kb.rows
            .iter()
            .flatten()
            .filter_map(|b| match &b.action {
                ButtonAction::Callback(d) => Some(d.clone()),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }

    fn buttons(n: usize) -> Vec<WelcomeButton> {
        (0..n)
            .map(|i| WelcomeButton {
                label: format!("B{i}"),
                url: format!("https://b{i}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn non_admin_is_denied() {
        let h = harness();
        press(&h, 7, "bot_config").await;
        assert_eq!(h.messenger.answers(), vec![Some(ACCESS_DENIED.to_string())]);
        assert!(h.messenger.sent_to(7).is_empty());
    }

    #[tokio::test]
    async fn every_prompt_arms_its_step() {
        let h = harness().with_admin(ADMIN).await;
        for (data, step, prompt) in PROMPTS {
            press(&h, ADMIN, data).await;
            assert_eq!(
                h.app.state.admin_label(UserId(ADMIN)).await.unwrap().as_deref(),
                Some(step.label())
            );
            assert_eq!(h.messenger.last_text_to(ADMIN), prompt);
        }
    }

    #[tokio::test]
    async fn every_prompt_is_reachable_from_a_screen() {
        let h = harness().with_admin(ADMIN).await;
        press(&h, ADMIN, "manage_admins").await;
        let admins_kb = h
            .messenger
            .last_keyboard_in(ADMIN)
            .expect("manage admins keyboard");

        let mut datas = callbacks_of(&panel_keyboard());
        datas.extend(callbacks_of(&admins_kb));
        for (data, ..) in PROMPTS {
            assert!(datas.iter().any(|d| d == data), "{data} has no button");
        }
        assert!(!callbacks_of(&panel_keyboard()).iter().any(|d| d == "add_admin_prompt"));
    }

    #[tokio::test]
    async fn back_clears_wizard_and_draft() {
        let h = harness().with_admin(ADMIN).await;
        h.app
            .state
            .set_admin_step(UserId(ADMIN), WizardStep::CustomButtonUrl)
            .await
            .unwrap();
        h.app.drafts.put(UserId(ADMIN), "Site".into()).await;

        press(&h, ADMIN, CB_BACK).await;
        assert_eq!(h.app.state.admin_label(UserId(ADMIN)).await.unwrap(), None);
        assert_eq!(h.app.drafts.peek(UserId(ADMIN)).await, None);
        assert_eq!(h.messenger.last_text_to(ADMIN), PANEL_TEXT);
        assert_eq!(h.messenger.last_keyboard_in(ADMIN), Some(panel_keyboard()));
    }

    #[tokio::test]
    async fn custom_buttons_list_and_remove() {
        let h = harness().with_admin(ADMIN).await;
        h.app.settings.set_welcome_buttons(buttons(3)).await.unwrap();

        press(&h, ADMIN, "custom_welcome_buttons").await;
        let kb = h.messenger.last_keyboard_in(ADMIN).unwrap();
        assert_eq!(
            callbacks_of(&kb),
            vec![
                "remove_custom_btn_0",
                "remove_custom_btn_1",
                "remove_custom_btn_2",
                "add_custom_btn",
                CB_BACK
            ]
        );

        press(&h, ADMIN, "remove_custom_btn_1").await;
        let left = h.app.settings.welcome_buttons().await.unwrap();
        assert_eq!(
            left.iter().map(|b| b.label.as_str()).collect::<Vec<_>>(),
            vec!["B0", "B2"]
        );
        assert_eq!(
            h.messenger.answers().last().cloned().flatten().as_deref(),
            Some("✅ Button removed.")
        );

        press(&h, ADMIN, "remove_custom_btn_9").await;
        press(&h, ADMIN, "remove_custom_btn_x").await;
        let answers = h.messenger.answers();
        assert_eq!(answers[answers.len() - 2].as_deref(), Some("Button not found."));
        assert_eq!(answers[answers.len() - 1].as_deref(), Some("Invalid data."));
        assert_eq!(h.app.settings.welcome_buttons().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn full_button_list_hides_add() {
        let h = harness().with_admin(ADMIN).await;
        h.app
            .settings
            .set_welcome_buttons(buttons(MAX_WELCOME_BUTTONS))
            .await
            .unwrap();

        press(&h, ADMIN, "custom_welcome_buttons").await;
        let kb = h.messenger.last_keyboard_in(ADMIN).unwrap();
        assert!(!callbacks_of(&kb).contains(&"add_custom_btn".to_string()));

        press(&h, ADMIN, "add_custom_btn").await;
        assert_eq!(h.app.state.admin_label(UserId(ADMIN)).await.unwrap(), None);
        assert!(h
            .messenger
            .answers()
            .last()
            .cloned()
            .flatten()
            .unwrap_or_default()
            .contains("full"));
    }

    #[tokio::test]
    async fn toggles_flip_settings() {
        let h = harness().with_admin(ADMIN).await;
        press(&h, ADMIN, "toggle_auto_accept").await;
        assert!(!h.app.settings.flag(settings::AUTO_ACCEPT_ENABLED).await.unwrap());
        assert!(h.messenger.last_text_to(ADMIN).contains("<b>OFF</b>"));

        press(&h, ADMIN, "toggle_live_chat").await;
        press(&h, ADMIN, "toggle_live_chat").await;
        assert!(h.app.settings.flag(settings::LIVE_CHAT_ENABLED).await.unwrap());
    }

    #[tokio::test]
    async fn config_summary_escapes_welcome_text() {
        let h = harness().with_admin(ADMIN).await;
        h.app
            .settings
            .set(settings::WELCOME_TEXT, "<b>hi</b>")
            .await
            .unwrap();
        press(&h, ADMIN, "bot_config").await;
        let html = h.messenger.last_text_to(ADMIN);
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("Admin Group:</b> ❌ Not Set"));
    }

    #[tokio::test]
    async fn superadmin_cannot_be_removed() {
        let h = harness().with_admin(ADMIN).await;
        h.app.seed_superadmin().await.unwrap();

        press(&h, ADMIN, "manage_admins").await;
        let kb = h.messenger.last_keyboard_in(ADMIN).unwrap();
        let datas = callbacks_of(&kb);
        assert!(datas.contains(&"noop_superadmin".to_string()));
        assert!(datas.contains(&format!("remove_admin_{ADMIN}")));

        press(&h, ADMIN, &format!("remove_admin_{SUPERADMIN}")).await;
        assert!(h.app.is_admin(UserId(SUPERADMIN)).await.unwrap());
        assert_eq!(
            h.messenger.answers().last().cloned().flatten().as_deref(),
            Some("Cannot remove Superadmin.")
        );
    }

    #[tokio::test]
    async fn removing_an_admin() {
        let h = harness().with_admin(ADMIN).await.with_admin(11).await;
        press(&h, ADMIN, "remove_admin_11").await;
        assert!(!h.store.is_admin(UserId(11)).await.unwrap());
        assert_eq!(
            h.messenger.answers().last().cloned().flatten().as_deref(),
            Some("✅ Admin removed.")
        );
    }

    #[tokio::test]
    async fn user_stats_list_recent_users() {
        let h = harness().with_admin(ADMIN).await;
        let mut a = Actor::new(40);
        a.username = Some("zed".into());
        a.first_name = Some("Zed".into());
        h.store.upsert_user(&a).await.unwrap();

        press(&h, ADMIN, "view_users").await;
        let html = h.messenger.last_text_to(ADMIN);
        assert!(html.contains("Total Users:</b> 1"));
        assert!(html.contains("• @zed (Zed)"));
    }

    #[tokio::test]
    async fn logs_show_joins() {
        let h = harness().with_admin(ADMIN).await;
        press(&h, ADMIN, "view_logs").await;
        assert!(h.messenger.last_text_to(ADMIN).contains("No Logs Available"));

        h.store
            .append(AuditRecord::Join(JoinRecord::new(
                5,
                Some("eve"),
                false,
                Some("blocked"),
            )))
            .await
            .unwrap();
        press(&h, ADMIN, "view_logs").await;
        assert!(h
            .messenger
            .last_text_to(ADMIN)
            .contains("• @eve (ID: 5) - ❌ (blocked)"));
    }

    #[tokio::test]
    async fn preview_sends_welcome_to_admin() {
        let h = harness().with_admin(ADMIN).await;
        press(&h, ADMIN, "preview_welcome").await;
        let texts = h.messenger.texts_to(ADMIN);
        assert_eq!(texts[0], "Welcome to our channel! 🎉");
        assert!(texts[1].contains("Preview sent"));
    }
}
