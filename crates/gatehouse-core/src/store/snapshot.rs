use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Actor, UserId},
    store::{Namespace, UserRecord},
    utils::iso_timestamp_utc,
};

/// Everything the stores hold, in a serializable shape.
///
/// Both [`super::MemoryStore`] and [`super::JsonFileStore`] keep one of these behind a
/// mutex; the file store additionally writes it out after every mutation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Snapshot {
    pub user_states: BTreeMap<i64, String>,
    pub admin_states: BTreeMap<i64, String>,
    pub config: BTreeMap<String, String>,
    pub users: BTreeMap<i64, UserRecord>,
    pub admins: BTreeSet<i64>,
}

impl Snapshot {
    fn states(&self, ns: Namespace) -> &BTreeMap<i64, String> {
        match ns {
            Namespace::User => &self.user_states,
            Namespace::Admin => &self.admin_states,
        }
    }

    fn states_mut(&mut self, ns: Namespace) -> &mut BTreeMap<i64, String> {
        match ns {
            Namespace::User => &mut self.user_states,
            Namespace::Admin => &mut self.admin_states,
        }
    }

    pub fn get_state(&self, ns: Namespace, actor: UserId) -> Option<String> {
        self.states(ns).get(&actor.0).cloned()
    }

    pub fn set_state(&mut self, ns: Namespace, actor: UserId, label: Option<&str>) {
        let map = self.states_mut(ns);
        match label {
            Some(l) if !l.is_empty() => {
                map.insert(actor.0, l.to_string());
            }
            _ => {
                map.remove(&actor.0);
            }
        }
    }

    pub fn upsert_user(&mut self, actor: &Actor) {
        let rec = self.users.entry(actor.id).or_insert_with(|| UserRecord {
            id: actor.id,
            username: None,
            first_name: None,
            last_name: None,
            joined_at: iso_timestamp_utc(),
        });
        if actor.username.is_some() {
            rec.username = actor.username.clone();
        }
        if actor.first_name.is_some() {
            rec.first_name = actor.first_name.clone();
        }
        if actor.last_name.is_some() {
            rec.last_name = actor.last_name.clone();
        }
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        self.users.keys().copied().map(UserId).collect()
    }

    pub fn admin_ids(&self) -> Vec<UserId> {
        self.admins.iter().copied().map(UserId).collect()
    }

    pub fn recent_users(&self, limit: usize) -> Vec<UserRecord> {
        let mut all: Vec<UserRecord> = self.users.values().cloned().collect();
        // RFC3339 UTC strings sort chronologically; ties fall back to the higher id.
        all.sort_by(|a, b| b.joined_at.cmp(&a.joined_at).then(b.id.cmp(&a.id)));
        all.truncate(limit);
        all
    }
}
