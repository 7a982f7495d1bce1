//! In-memory fakes of the ports and a fully wired registry for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use reefhub_domain::ato::Ato;
use reefhub_domain::doser::{DosingPump, Usage};
use reefhub_domain::equipment::Equipment;
use reefhub_domain::error::{ActuatorError, NotFoundError, ReefHubError};
use reefhub_domain::id::EntityId;
use reefhub_domain::macros::Macro;
use reefhub_domain::record::Record;
use reefhub_domain::temperature::TemperatureController;
use reefhub_domain::time::Timestamp;
use reefhub_domain::timer::Job;

use crate::macro_engine::MacroEngine;
use crate::ports::{ActuatorDriver, Clock, EntityStore, TemperatureProbe, UsageRecorder};
use crate::registry::SubsystemRegistry;
use crate::services::{
    AtoService, DoserService, EquipmentService, MacroService, TemperatureService, TimerService,
};

pub struct InMemoryStore<T> {
    records: Mutex<Vec<T>>,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Record> EntityStore<T> for InMemoryStore<T> {
    fn create(&self, mut record: T) -> impl Future<Output = Result<T, ReefHubError>> + Send {
        record.set_id(T::Id::default());
        self.records.lock().unwrap().push(record.clone());
        async move { Ok(record) }
    }

    fn get_by_id(&self, id: T::Id) -> impl Future<Output = Result<Option<T>, ReefHubError>> + Send {
        let found = self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned();
        async move { Ok(found) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<T>, ReefHubError>> + Send {
        let all = self.records.lock().unwrap().clone();
        async move { Ok(all) }
    }

    fn update(&self, record: T) -> impl Future<Output = Result<T, ReefHubError>> + Send {
        let mut records = self.records.lock().unwrap();
        let result = match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(NotFoundError {
                entity: T::KIND,
                id: record.id().to_string(),
            }
            .into()),
        };
        async move { result }
    }

    fn delete(&self, id: T::Id) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        self.records.lock().unwrap().retain(|r| r.id() != id);
        async { Ok(()) }
    }
}

/// A hardware call observed by [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Dose {
        pump: EntityId,
        speed: f64,
        duration: Duration,
    },
    Relay {
        channel: u32,
        on: bool,
    },
}

/// Actuator driver that records every successful call in order.
#[derive(Default)]
pub struct RecordingDriver {
    effects: Mutex<Vec<SideEffect>>,
    failing_channels: Mutex<HashSet<u32>>,
    failing_pumps: Mutex<HashSet<EntityId>>,
}

impl RecordingDriver {
    pub fn effects(&self) -> Vec<SideEffect> {
        self.effects.lock().unwrap().clone()
    }

    /// Last state applied to `channel`.
    pub fn relay_state(&self, channel: u32) -> Option<bool> {
        self.effects
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|effect| match effect {
                SideEffect::Relay { channel: c, on } if *c == channel => Some(*on),
                _ => None,
            })
    }

    pub fn fail_channel(&self, channel: u32) {
        self.failing_channels.lock().unwrap().insert(channel);
    }

    pub fn fail_pump(&self, pump: EntityId) {
        self.failing_pumps.lock().unwrap().insert(pump);
    }
}

impl ActuatorDriver for RecordingDriver {
    fn dose(
        &self,
        pump: &DosingPump,
        speed: f64,
        duration: Duration,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        let result = if self.failing_pumps.lock().unwrap().contains(&pump.id) {
            Err(ActuatorError::Fault {
                device: pump.name.clone(),
                source: "motor stalled".into(),
            }
            .into())
        } else {
            self.effects.lock().unwrap().push(SideEffect::Dose {
                pump: pump.id,
                speed,
                duration,
            });
            Ok(())
        };
        async move { result }
    }

    fn set_state(
        &self,
        channel: u32,
        on: bool,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        let result = if self.failing_channels.lock().unwrap().contains(&channel) {
            Err(ActuatorError::UnknownChannel { channel }.into())
        } else {
            self.effects
                .lock()
                .unwrap()
                .push(SideEffect::Relay { channel, on });
            Ok(())
        };
        async move { result }
    }
}

/// Probe returning queued readings; the last one repeats forever.
#[derive(Default)]
pub struct FakeProbe {
    readings: Mutex<HashMap<String, VecDeque<f64>>>,
    reads: Mutex<HashMap<String, usize>>,
}

impl FakeProbe {
    pub fn set(&self, sensor: &str, celsius: f64) {
        self.queue(sensor, &[celsius]);
    }

    pub fn queue(&self, sensor: &str, readings: &[f64]) {
        self.readings
            .lock()
            .unwrap()
            .insert(sensor.to_string(), readings.iter().copied().collect());
    }

    pub fn reads(&self, sensor: &str) -> usize {
        self.reads.lock().unwrap().get(sensor).copied().unwrap_or(0)
    }
}

impl TemperatureProbe for FakeProbe {
    fn read(&self, sensor: &str) -> impl Future<Output = Result<f64, ReefHubError>> + Send {
        *self
            .reads
            .lock()
            .unwrap()
            .entry(sensor.to_string())
            .or_default() += 1;
        let mut readings = self.readings.lock().unwrap();
        let result = match readings.get_mut(sensor) {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
            Some(queue) if !queue.is_empty() => Ok(queue[0]),
            _ => Err(ActuatorError::SensorUnavailable {
                sensor: sensor.to_string(),
            }
            .into()),
        };
        async move { result }
    }
}

#[derive(Default)]
pub struct InMemoryUsage {
    records: Mutex<Vec<(EntityId, Usage)>>,
}

impl InMemoryUsage {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl UsageRecorder for InMemoryUsage {
    fn record(
        &self,
        pump: EntityId,
        usage: Usage,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        self.records.lock().unwrap().push((pump, usage));
        async { Ok(()) }
    }

    fn history(
        &self,
        pump: EntityId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Usage>, ReefHubError>> + Send {
        let history: Vec<Usage> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|(id, _)| *id == pump)
            .take(limit)
            .map(|(_, usage)| usage.clone())
            .collect();
        async move { Ok(history) }
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn at(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

pub type Driver = Arc<RecordingDriver>;
pub type Dosers =
    DoserService<InMemoryStore<DosingPump>, Driver, Arc<InMemoryUsage>, Arc<ManualClock>>;
pub type Atos = AtoService<InMemoryStore<Ato>, Driver>;
pub type Outlets = EquipmentService<InMemoryStore<Equipment>, Driver>;
pub type Temperatures = TemperatureService<InMemoryStore<TemperatureController>, Arc<FakeProbe>>;
pub type Macros = MacroService<InMemoryStore<Macro>>;
pub type Timers = TimerService<InMemoryStore<Job>, InMemoryStore<Macro>>;

/// Every subsystem wired against the fakes.
pub struct Fixture {
    pub registry: Arc<SubsystemRegistry>,
    pub driver: Driver,
    pub probe: Arc<FakeProbe>,
    pub usage: Arc<InMemoryUsage>,
    pub clock: Arc<ManualClock>,
    pub dosers: Arc<Dosers>,
    pub atos: Arc<Atos>,
    pub equipment: Arc<Outlets>,
    pub temperatures: Arc<Temperatures>,
    pub macros: Arc<Macros>,
    pub timers: Arc<Timers>,
}

impl Fixture {
    pub fn new() -> Self {
        let driver = Arc::new(RecordingDriver::default());
        let probe = Arc::new(FakeProbe::default());
        let usage = Arc::new(InMemoryUsage::default());
        let clock = Arc::new(ManualClock::at(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let shutdown = CancellationToken::new();

        let dosers = Arc::new(DoserService::new(
            InMemoryStore::default(),
            Arc::clone(&driver),
            Arc::clone(&usage),
            Arc::clone(&clock),
        ));
        let atos = Arc::new(AtoService::new(InMemoryStore::default(), Arc::clone(&driver)));
        let equipment = Arc::new(EquipmentService::new(
            InMemoryStore::default(),
            Arc::clone(&driver),
        ));
        let temperatures = Arc::new(TemperatureService::new(
            InMemoryStore::default(),
            Arc::clone(&probe),
        ));
        let macros = Arc::new(MacroService::new(
            InMemoryStore::default(),
            MacroEngine::new(),
            shutdown.clone(),
        ));
        let timers = Arc::new(TimerService::new(
            InMemoryStore::default(),
            Arc::clone(&macros),
            shutdown,
        ));

        let registry = SubsystemRegistry::builder()
            .register(dosers.clone())
            .register(atos.clone())
            .register(equipment.clone())
            .register(temperatures.clone())
            .register(macros.clone())
            .register(timers.clone())
            .build()
            .unwrap();

        Self {
            registry: Arc::new(registry),
            driver,
            probe,
            usage,
            clock,
            dosers,
            atos,
            equipment,
            temperatures,
            macros,
            timers,
        }
    }

    pub async fn add_equipment(&self, equipment: Equipment) -> Equipment {
        self.equipment.records().create(equipment).await.unwrap()
    }

    pub async fn add_ato(&self, ato: Ato) -> Ato {
        self.atos.records().create(ato).await.unwrap()
    }

    pub async fn add_doser(&self, pump: DosingPump) -> DosingPump {
        self.dosers.records().create(pump).await.unwrap()
    }

    pub async fn add_temperature(&self, tc: TemperatureController) -> TemperatureController {
        self.temperatures.records().create(tc).await.unwrap()
    }

    pub async fn ato_enabled(&self, id: EntityId) -> bool {
        self.atos.records().get(id).await.unwrap().enable
    }
}
