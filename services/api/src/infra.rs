use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use upkeep::maintenance::{
    Category, MaintenanceRequest, NewRequest, NewUser, RequestFilter, RequestId, RequestStore,
    Role, Status, StoreError, TransitionError, UpdateError, Urgency, User, UserDirectory, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-guarded map keyed by id. The BTreeMap keeps retrieval in id order,
/// which the queue ranking relies on for its tie-break, and `update` runs
/// its closure under the same lock acquisition as the read.
#[derive(Clone)]
pub(crate) struct InMemoryRequestStore {
    requests: Arc<Mutex<BTreeMap<RequestId, MaintenanceRequest>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for InMemoryRequestStore {
    fn default() -> Self {
        Self {
            requests: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl RequestStore for InMemoryRequestStore {
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

#[derive(Clone)]
pub(crate) struct InMemoryUserDirectory {
    users: Arc<Mutex<BTreeMap<UserId, User>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self {
            users: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl UserDirectory for InMemoryUserDirectory {
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

/// One login per role, matching the accounts the original deployment ships
/// with. The hash is an opaque placeholder; credential verification lives
/// outside this service.
const SEED_PASSWORD_HASH: &str = "$2b$12$seeded-demo-credential";

pub(crate) struct SeedAccounts {
    pub(crate) tenant: User,
    pub(crate) worker: User,
    pub(crate) manager: User,
}

pub(crate) fn seed_accounts<D: UserDirectory>(directory: &D) -> Result<SeedAccounts, StoreError> {
    Ok(SeedAccounts {
        tenant: directory.insert(seed_user("tenant", Role::Tenant))?,
        worker: directory.insert(seed_user("worker", Role::Worker))?,
        manager: directory.insert(seed_user("manager", Role::Manager))?,
    })
}

fn seed_user(username: &str, role: Role) -> NewUser {
    NewUser {
        username: username.to_string(),
        password_hash: SEED_PASSWORD_HASH.to_string(),
        role,
    }
}

/// Deterministic sample requests across units 101-108, every category,
/// urgency, and status, with resolution times between one hour and two
/// days.
pub(crate) fn seed_requests<S: RequestStore>(
    store: &S,
    accounts: &SeedAccounts,
) -> Result<usize, StoreError> {
    let now = Utc::now();
    let samples: [(&str, Category, Urgency, &str, Status, i64, Option<i64>); 12] = [
        (
            "101",
            Category::Plumbing,
            Urgency::Emergency,
            "Burst pipe under the kitchen sink",
            Status::Pending,
            2,
            None,
        ),
        (
            "102",
            Category::Electrical,
            Urgency::High,
            "Outlet sparking in the hallway",
            Status::InProgress,
            8,
            None,
        ),
        (
            "103",
            Category::Hvac,
            Urgency::Medium,
            "Radiator barely warms up",
            Status::Pending,
            20,
            None,
        ),
        (
            "104",
            Category::General,
            Urgency::Low,
            "Stairwell light flickering",
            Status::Pending,
            30,
            None,
        ),
        (
            "105",
            Category::Plumbing,
            Urgency::High,
            "Shower drain backing up",
            Status::InProgress,
            44,
            None,
        ),
        (
            "106",
            Category::Hvac,
            Urgency::Emergency,
            "No heat overnight",
            Status::InProgress,
            50,
            None,
        ),
        (
            "107",
            Category::Electrical,
            Urgency::Medium,
            "Doorbell stopped working",
            Status::Completed,
            72,
            Some(30),
        ),
        (
            "108",
            Category::General,
            Urgency::Low,
            "Scuffed paint in the entryway",
            Status::Completed,
            96,
            Some(48),
        ),
        (
            "104",
            Category::Plumbing,
            Urgency::Medium,
            "Bathroom faucet dripping",
            Status::Completed,
            120,
            Some(6),
        ),
        (
            "102",
            Category::General,
            Urgency::Medium,
            "Mailbox latch jammed",
            Status::Completed,
            150,
            Some(12),
        ),
        (
            "101",
            Category::Hvac,
            Urgency::Low,
            "AC unit rattles at night",
            Status::Pending,
            160,
            None,
        ),
        (
            "103",
            Category::Electrical,
            Urgency::High,
            "Breaker trips when the oven runs",
            Status::Completed,
            200,
            Some(3),
        ),
    ];
    let count = samples.len();

    for (unit, category, urgency, description, status, age_hours, resolve_hours) in samples {
        let created_at = now - Duration::hours(age_hours);
        store.insert(NewRequest {
            tenant_id: accounts.tenant.id,
            unit_number: unit.to_string(),
            category,
            urgency,
            description: description.to_string(),
            status,
            created_at,
            resolved_at: resolve_hours.map(|hours| created_at + Duration::hours(hours)),
            assigned_worker_id: match status {
                Status::Pending => None,
                _ => Some(accounts.worker.id),
            },
        })?;
    }

    Ok(count)
}
