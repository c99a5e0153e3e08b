use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::maintenance::domain::{
    Category, MaintenanceRequest, RequestId, Role, Status, TransitionError, Urgency, User, UserId,
};
use crate::maintenance::service::{MaintenanceService, SubmitRequest};
use crate::maintenance::store::{
    NewRequest, NewUser, RequestFilter, RequestStore, StoreError, UpdateError, UserDirectory,
};

pub(super) struct MemoryStore {
    requests: Mutex<BTreeMap<RequestId, MaintenanceRequest>>,
    next_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            requests: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl RequestStore for MemoryStore {
    fn insert(&self, request: NewRequest) -> Result<MaintenanceRequest, StoreError> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = MaintenanceRequest {
            id,
            tenant_id: request.tenant_id,
            unit_number: request.unit_number,
            category: request.category,
            urgency: request.urgency,
            description: request.description,
            status: request.status,
            created_at: request.created_at,
            resolved_at: request.resolved_at,
            assigned_worker_id: request.assigned_worker_id,
        };
        let mut guard = self.requests.lock().expect("request store mutex poisoned");
        guard.insert(id, record.clone());
        Ok(record)
    }

    fn get(&self, id: RequestId) -> Result<Option<MaintenanceRequest>, StoreError> {
        let guard = self.requests.lock().expect("request store mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list(&self, filter: RequestFilter) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let guard = self.requests.lock().expect("request store mutex poisoned");
        Ok(guard
            .values()
            .filter(|request| match filter {
                RequestFilter::All => true,
                RequestFilter::ExcludeStatus(status) => request.status != status,
            })
            .cloned()
            .collect())
    }

    fn list_by_tenant(&self, tenant_id: UserId) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let guard = self.requests.lock().expect("request store mutex poisoned");
        let mut rows: Vec<MaintenanceRequest> = guard
            .values()
            .filter(|request| request.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    fn update(
        &self,
        id: RequestId,
        apply: &dyn Fn(&mut MaintenanceRequest) -> Result<(), TransitionError>,
    ) -> Result<MaintenanceRequest, UpdateError> {
        let mut guard = self.requests.lock().expect("request store mutex poisoned");
        let record = guard.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply(record)?;
        Ok(record.clone())
    }
}

pub(super) struct MemoryDirectory {
    users: Mutex<BTreeMap<UserId, User>>,
    next_id: AtomicU64,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self {
            users: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl UserDirectory for MemoryDirectory {
    fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        if guard.values().any(|known| known.username == user.username) {
            return Err(StoreError::Conflict);
        }
        let id = UserId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        };
        guard.insert(id, record.clone());
        Ok(record)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}

pub(super) struct Accounts {
    pub(super) tenant: User,
    pub(super) worker: User,
    pub(super) manager: User,
}

pub(super) struct Harness {
    pub(super) service: MaintenanceService<MemoryStore, MemoryDirectory>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) directory: Arc<MemoryDirectory>,
    pub(super) accounts: Accounts,
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    let accounts = Accounts {
        tenant: add_user(&directory, "tenant", Role::Tenant),
        worker: add_user(&directory, "worker", Role::Worker),
        manager: add_user(&directory, "manager", Role::Manager),
    };
    let service = MaintenanceService::new(store.clone(), directory.clone());
    Harness {
        service,
        store,
        directory,
        accounts,
    }
}

pub(super) fn add_user(directory: &MemoryDirectory, username: &str, role: Role) -> User {
    directory
        .insert(NewUser {
            username: username.to_string(),
            password_hash: format!("$2b$12$opaque-{username}"),
            role,
        })
        .expect("seed user inserts")
}

pub(super) fn submission() -> SubmitRequest {
    SubmitRequest {
        unit_number: "104".to_string(),
        category: "Plumbing".to_string(),
        urgency: "High".to_string(),
        description: "Kitchen sink drains slowly".to_string(),
    }
}

pub(super) fn seed_request(
    store: &MemoryStore,
    tenant: &User,
    worker: &User,
    urgency: Urgency,
    status: Status,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
) -> MaintenanceRequest {
    store
        .insert(NewRequest {
            tenant_id: tenant.id,
            unit_number: "101".to_string(),
            category: Category::General,
            urgency,
            description: format!("{} issue in unit", urgency.label()),
            status,
            created_at,
            resolved_at,
            assigned_worker_id: if matches!(status, Status::Pending) {
                None
            } else {
                Some(worker.id)
            },
        })
        .expect("seed request inserts")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
