use std::{
    collections::HashMap,
    sync::{Arc, MutexGuard, PoisonError},
};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use gatehouse_core::{config::Config, messaging::port::MessagingPort, App};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
    pub chat_locks: Arc<ChatLocks>,
}

/// One async lock per actor id. An entry lives only while someone holds or awaits it.
#[derive(Default)]
pub struct ChatLocks {
    inner: std::sync::Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    fn map(&self) -> MutexGuard<'_, HashMap<i64, Arc<Mutex<()>>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn lock_chat(self: &Arc<Self>, chat_id: i64) -> ChatGuard {
        let lock = self
            .map()
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        ChatGuard {
            guard: Some(lock.lock_owned().await),
            chat_id,
            locks: self.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds an actor's lock; drops the map entry when nobody else is waiting on it.
pub struct ChatGuard {
    guard: Option<OwnedMutexGuard<()>>,
    chat_id: i64,
    locks: Arc<ChatLocks>,
}

impl Drop for ChatGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.map();
        if map
            .get(&self.chat_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.chat_id);
        }
    }
}

pub fn bot(cfg: &Config) -> Bot {
    Bot::new(cfg.telegram_bot_token.clone())
}

pub fn messenger(bot: &Bot) -> Arc<dyn MessagingPort> {
    Arc::new(TelegramMessenger::new(bot.clone()))
}

/// Long-poll until the process is stopped.
pub async fn run_polling(bot: Bot, app: Arc<App>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "gatehouse started"),
        Err(e) => tracing::warn!("get_me failed: {e}"),
    }

    let state = Arc::new(AppState {
        app,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_chat_join_request().endpoint(handlers::handle_join_request))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("dispatcher stopped");
    Ok(())
}
