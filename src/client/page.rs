/*!
 * Resource Page
 * State and transitions of one management page: the list, the draft form,
 * edit mode and the notifications raised by each operation
 */
use uuid::Uuid;

use super::drafts::Draft;
use super::notify::Notifications;
use super::{ApiClient, ClientError};
use crate::db::Document;

pub struct ResourcePage<D: Draft> {
    client: ApiClient,
    items: Vec<Document<D::Entity>>,
    pub draft: D,
    editing: Option<Uuid>,
    loading: bool,
    pub notifications: Notifications,
}

impl<D: Draft> ResourcePage<D> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            items: Vec::new(),
            draft: D::default(),
            editing: None,
            loading: false,
            notifications: Notifications::default(),
        }
    }

    pub fn items(&self) -> &[Document<D::Entity>] {
        &self.items
    }

    /// Id of the record the next save overwrites
    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replaces the list with the server's; empties it when the fetch fails.
    pub async fn refresh(&mut self) {
        self.loading = true;
        match self.client.list::<D::Entity>(D::ENDPOINT).await {
            Ok(items) => self.items = items,
            Err(e) => {
                tracing::error!(endpoint = D::ENDPOINT, error = %e, "failed to load list");
                self.items.clear();
                self.notifications
                    .error(format!("Error loading {} entries: {}", D::LABEL, e));
            }
        }
        self.loading = false;
    }

    /// Creates, or updates the record in edit mode. The draft is kept when
    /// anything fails.
    pub async fn save(&mut self) -> Result<(), ClientError> {
        let payload = match self.draft.payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.notifications.error(e.to_string());
                return Err(e);
            }
        };

        self.loading = true;
        let (result, action) = match self.editing {
            Some(id) => (self.client.update(D::ENDPOINT, id, payload).await, "updated"),
            None => (self.client.create(D::ENDPOINT, payload).await, "saved"),
        };
        self.loading = false;

        match result {
            Ok(_) => {
                self.notifications
                    .success(format!("{} {} successfully", D::LABEL, action));
                self.refresh().await;
                self.draft = D::default();
                self.editing = None;
                Ok(())
            }
            Err(e) => {
                let verb = if self.editing.is_some() { "updating" } else { "saving" };
                self.notifications
                    .error(format!("Error {} {}: {}", verb, D::LABEL, e));
                Err(e)
            }
        }
    }

    pub fn start_edit(&mut self, doc: &Document<D::Entity>) {
        self.draft = D::from_document(doc);
        self.editing = Some(doc.id);
    }

    pub fn cancel_edit(&mut self) {
        self.draft = D::default();
        self.editing = None;
    }

    pub async fn remove(&mut self, id: Uuid) -> Result<(), ClientError> {
        self.loading = true;
        let result = self.client.delete(D::ENDPOINT, id).await;
        self.loading = false;

        match result {
            Ok(_) => {
                self.notifications
                    .success(format!("{} deleted successfully", D::LABEL));
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.notifications
                    .error(format!("Error deleting {}: {}", D::LABEL, e));
                Err(e)
            }
        }
    }
}
