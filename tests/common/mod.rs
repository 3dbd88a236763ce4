//! Scriptable in-memory backend shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lighting_sync::api::{ControlRequest, ControlResponse, RemoteSource};
use lighting_sync::models::{
    ColorSlot, CommandRecord, Device, EnergySummary, EnergyTimelineEntry, EnergyWindow,
    LightColor,
};
use lighting_sync::{AppError, Result};

pub fn device(id: &str, color: LightColor, last_seen: Option<DateTime<Utc>>) -> Device {
    Device {
        id: id.to_string(),
        ip_address: "192.168.1.50".to_string(),
        color_slots: vec![ColorSlot {
            led_id: None,
            color,
        }],
        last_seen,
    }
}

pub fn command(id: i64, device_id: &str) -> CommandRecord {
    CommandRecord {
        id,
        command_text: Some(format!("SET {}", id)),
        command_sent: "RED".to_string(),
        device_id: device_id.to_string(),
        success: true,
        timestamp: Some(Utc::now()),
    }
}

fn unavailable() -> AppError {
    AppError::Api {
        status: 503,
        message: "backend unavailable".to_string(),
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub devices: Mutex<Vec<Device>>,
    pub commands: Mutex<Vec<CommandRecord>>,
    pub summary: Mutex<EnergySummary>,
    pub timeline: Mutex<Vec<EnergyTimelineEntry>>,
    /// Scripted device answers, consumed in call order before `devices`
    pub device_script: Mutex<VecDeque<(Duration, Vec<Device>)>>,
    pub control_response: Mutex<ControlResponse>,
    pub fail_reads: AtomicBool,
    pub fail_control: AtomicBool,
    pub device_calls: AtomicUsize,
    pub command_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
    pub timeline_calls: AtomicUsize,
    pub control_calls: AtomicUsize,
    pub windows: Mutex<Vec<EnergyWindow>>,
    pub command_limits: Mutex<Vec<u32>>,
    pub controls: Mutex<Vec<ControlRequest>>,
}

impl FakeSource {
    pub fn with_devices(devices: Vec<Device>) -> Self {
        let source = Self::default();
        *source.devices.lock().unwrap() = devices;
        source
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = devices;
    }

    pub fn device_calls(&self) -> usize {
        self.device_calls.load(Ordering::SeqCst)
    }

    pub fn control_calls(&self) -> usize {
        self.control_calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn failing(&self) -> bool {
        self.fail_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for FakeSource {
    async fn devices(&self) -> Result<Vec<Device>> {
        self.device_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.device_script.lock().unwrap().pop_front();
        if let Some((delay, devices)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(devices);
        }
        if self.failing() {
            return Err(unavailable());
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn commands(&self, limit: u32) -> Result<Vec<CommandRecord>> {
        self.command_calls.fetch_add(1, Ordering::SeqCst);
        self.command_limits.lock().unwrap().push(limit);
        if self.failing() {
            return Err(unavailable());
        }
        Ok(self.commands.lock().unwrap().clone())
    }

    async fn energy_summary(&self, window: EnergyWindow) -> Result<EnergySummary> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().unwrap().push(window);
        if self.failing() {
            return Err(unavailable());
        }
        Ok(self.summary.lock().unwrap().clone())
    }

    async fn energy_timeline(&self, window: EnergyWindow) -> Result<Vec<EnergyTimelineEntry>> {
        self.timeline_calls.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().unwrap().push(window);
        if self.failing() {
            return Err(unavailable());
        }
        Ok(self.timeline.lock().unwrap().clone())
    }

    async fn control(&self, request: &ControlRequest) -> Result<ControlResponse> {
        self.control_calls.fetch_add(1, Ordering::SeqCst);
        self.controls.lock().unwrap().push(request.clone());
        if self.fail_control.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.control_response.lock().unwrap().clone())
    }
}
