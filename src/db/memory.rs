use std::collections::HashMap;

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use tokio::sync::RwLock;

use crate::{
    auth::{error::AuthError, policy::IdentityPolicy},
    error::Error,
    model::{Session, User, normalize_username},
};

use super::{SessionStore, UserStore};

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Users {
    next_id: i64,
    by_normalized_name: HashMap<String, StoredUser>,
}

/// Process-local user store. Contents are lost on restart.
pub struct MemoryUserStore {
    users: RwLock<Users>,
    policy: IdentityPolicy,
}

impl MemoryUserStore {
    pub fn new(policy: IdentityPolicy) -> Self {
        Self {
            users: RwLock::new(Users::default()),
            policy,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_name(&self, username: &str) -> Result<Option<User>, Error> {
        let users = self.users.read().await;

        Ok(users
            .by_normalized_name
            .get(&normalize_username(username))
            .map(|stored| stored.user.clone()))
    }

    async fn find_credential(&self, username: &str) -> Result<Option<(User, String)>, Error> {
        let users = self.users.read().await;

        Ok(users
            .by_normalized_name
            .get(&normalize_username(username))
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn insert(&self, username: &str, password_hash: String) -> Result<User, Error> {
        let mut users = self.users.write().await;

        let normalized = normalize_username(username);
        if users.by_normalized_name.contains_key(&normalized) {
            return Err(Error::Auth(AuthError::DuplicateUserName));
        }

        users.next_id += 1;
        let user = User {
            id: users.next_id,
            username: username.to_string(),
        };
        users.by_normalized_name.insert(
            normalized,
            StoredUser {
                user: user.clone(),
                password_hash,
            },
        );

        Ok(user)
    }

    fn users(&self) -> BoxStream<'_, Result<User, Error>> {
        futures::stream::once(async move {
            let users = self.users.read().await;
            let mut snapshot: Vec<User> = users
                .by_normalized_name
                .values()
                .map(|stored| stored.user.clone())
                .collect();
            snapshot.sort_by_key(|user| user.id);

            futures::stream::iter(snapshot.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    fn policy(&self) -> &IdentityPolicy {
        &self.policy
    }
}

pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    lifetime_minutes: i64,
}

impl MemorySessionStore {
    pub fn new(lifetime_minutes: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            lifetime_minutes,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn sign_in(&self, user: &User) -> Result<Session, Error> {
        let session = Session::issue(user, self.lifetime_minutes);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, existing| !existing.is_expired());
        sessions.insert(session.id.clone(), session.clone());

        Ok(session)
    }

    async fn find(&self, session_id: &str) -> Result<Option<Session>, Error> {
        let sessions = self.sessions.read().await;

        Ok(sessions
            .get(session_id)
            .filter(|session| !session.is_expired())
            .cloned())
    }

    async fn sign_out(&self, session: &Session) -> Result<(), Error> {
        self.sessions.write().await.remove(&session.id);

        Ok(())
    }
}
