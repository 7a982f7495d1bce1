//! Fully wired router over an in-memory database and virtual hardware.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use reefhub_adapter_storage_sqlite_sqlx::{Config, SqliteEntityStore, SqliteUsageStore};
use reefhub_adapter_virtual::{VirtualDriver, VirtualProbe};
use reefhub_app::macro_engine::MacroEngine;
use reefhub_app::ports::SystemClock;
use reefhub_app::registry::SubsystemRegistry;
use reefhub_app::services::{
    AtoService, DoserService, EquipmentService, MacroService, TemperatureService, TimerService,
};
use reefhub_domain::equipment::Equipment;
use reefhub_domain::macros::Macro;
use reefhub_domain::timer::Job;

use crate::router;
use crate::state::AppState;

type Store<T> = SqliteEntityStore<T>;

pub(crate) struct Harness {
    pub state: AppState<Store<Macro>, Store<Job>>,
    pub driver: Arc<VirtualDriver>,
    pub equipment: Arc<EquipmentService<Store<Equipment>, Arc<VirtualDriver>>>,
    pub shutdown: CancellationToken,
}

impl Harness {
    pub async fn new() -> Self {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let pool = db.pool().clone();
        let shutdown = CancellationToken::new();
        let driver = Arc::new(VirtualDriver::new());
        let probe = Arc::new(VirtualProbe::new());

        let equipment = Arc::new(EquipmentService::new(
            Store::new(pool.clone()),
            Arc::clone(&driver),
        ));
        let dosers = Arc::new(DoserService::new(
            Store::new(pool.clone()),
            Arc::clone(&driver),
            SqliteUsageStore::new(pool.clone()),
            SystemClock,
        ));
        let atos = Arc::new(AtoService::new(Store::new(pool.clone()), Arc::clone(&driver)));
        let temperatures = Arc::new(TemperatureService::new(Store::new(pool.clone()), probe));
        let macros = Arc::new(MacroService::new(
            Store::new(pool.clone()),
            MacroEngine::new(),
            shutdown.child_token(),
        ));
        let timers = Arc::new(TimerService::new(
            Store::new(pool),
            Arc::clone(&macros),
            shutdown.child_token(),
        ));

        let registry = SubsystemRegistry::builder()
            .register(equipment.clone())
            .register(atos)
            .register(dosers)
            .register(temperatures)
            .register(macros.clone())
            .register(timers.clone())
            .build()
            .unwrap();

        Self {
            state: AppState::new(Arc::new(registry), macros, timers),
            driver,
            equipment,
            shutdown,
        }
    }

    pub fn app(&self) -> Router {
        router::build(self.state.clone())
    }

    /// Create an outlet and return its id.
    pub async fn add_equipment(&self, name: &str, outlet: u32) -> String {
        let created = self
            .equipment
            .records()
            .create(Equipment::new(name, outlet))
            .await
            .unwrap();
        created.id.to_string()
    }

    /// Create a macro through the API and return its id.
    pub async fn create_macro(&self, body: Value) -> String {
        let resp = send(&self.app(), "POST", "/api/macros", Some(body)).await;
        assert!(resp.status().is_success(), "create failed: {}", resp.status());
        let created = json_body(resp).await;
        created["id"].as_str().unwrap().to_string()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub(crate) async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub(crate) async fn json_body(resp: Response<Body>) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
