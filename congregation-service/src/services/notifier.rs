//! In-app notification delivery.
//!
//! Notifications are a side effect of the action that triggers them: a
//! failed insert is logged and never fails the request.

use tracing::instrument;
use uuid::Uuid;

use super::Database;
use crate::models::{Congregation, Notification, NotificationKind};

#[derive(Clone)]
pub struct Notifier {
    db: Database,
}

impl Notifier {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, kind, title, body), fields(kind = kind.as_str()))]
    pub async fn notify(
        &self,
        user_id: Uuid,
        congregation_id: Option<Uuid>,
        kind: NotificationKind,
        title: String,
        body: Option<String>,
        link: Option<String>,
    ) {
        let notification = Notification::new(user_id, congregation_id, kind, title, body, link);
        if let Err(e) = self.db.insert_notification(&notification).await {
            tracing::warn!(error = %e, user_id = %user_id, "Failed to store notification");
        }
    }

    /// Tell every congregation admin, except `actor_id`, about `kind`.
    pub async fn notify_admins(
        &self,
        congregation: &Congregation,
        actor_id: Uuid,
        kind: NotificationKind,
        title: String,
    ) {
        let admins = match self.db.list_admin_user_ids(congregation.congregation_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load congregation admins for notification");
                return;
            }
        };

        let link = Some(format!(
            "/congregations/{}/requests",
            congregation.congregation_id
        ));
        for admin_id in admins.into_iter().filter(|id| *id != actor_id) {
            self.notify(
                admin_id,
                Some(congregation.congregation_id),
                kind,
                title.clone(),
                None,
                link.clone(),
            )
            .await;
        }
    }
}
