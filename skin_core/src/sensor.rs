//! Composes Layout, Profile, Cell/Patch State, Frame Reader, Pipeline,
//! Aggregator, and the Calibration Controller behind one handle that owns
//! the ingest thread.
//!
//! Lock poisoning here means the ingest thread panicked mid-update; there
//! is no meaningful recovery, so this module unwraps lock results rather
//! than threading a poison error through every accessor.
#![allow(clippy::unwrap_used, clippy::expect_used)]
use crate::aggregator;
use crate::calibration_controller::{CalibrationController, CalibrationState};
use crate::cell::PatchState;
use crate::counters::{Counters, RecordTally};
use crate::error::SensorError;
use crate::frame_reader::{FrameReader, WireParams};
use crate::layout::Layout;
use crate::pipeline;
use crate::profile::Profile;
use skin_traits::{Clock, DeviceOpener, MonotonicClock};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write as _;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

pub struct Missing;
pub struct Set;

/// Builds a `Sensor`. `DeviceOpener` and `Layout` are the two required
/// inputs; everything else has a sensible default and is set via chained
/// `with_*` calls, mirroring the rest of this workspace's builder idiom.
pub struct SensorBuilder<O = Missing, L = Missing> {
    opener: Option<Arc<dyn DeviceOpener>>,
    layout: Option<Layout>,
    profile: Option<Profile>,
    alpha: f64,
    pressure_alpha: f64,
    history_len: usize,
    target_pressure: f64,
    wire: WireParams,
    clock: Arc<dyn Clock + Send + Sync>,
    _opener_state: PhantomData<O>,
    _layout_state: PhantomData<L>,
}

impl Default for SensorBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBuilder<Missing, Missing> {
    pub fn new() -> Self {
        Self {
            opener: None,
            layout: None,
            profile: None,
            alpha: 1.0,
            pressure_alpha: 1.0,
            history_len: 0,
            target_pressure: 1.0,
            wire: WireParams::default(),
            clock: Arc::new(MonotonicClock::new()),
            _opener_state: PhantomData,
            _layout_state: PhantomData,
        }
    }
}

impl<O, L> SensorBuilder<O, L> {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_pressure_alpha(mut self, alpha: f64) -> Self {
        self.pressure_alpha = alpha;
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_history_len(mut self, len: usize) -> Self {
        self.history_len = len;
        self
    }

    pub fn with_target_pressure(mut self, v: f64) -> Self {
        self.target_pressure = v;
        self
    }

    pub fn with_wire_params(mut self, wire: WireParams) -> Self {
        self.wire = wire;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }
}

impl<L> SensorBuilder<Missing, L> {
    pub fn with_device_opener(self, opener: impl DeviceOpener + 'static) -> SensorBuilder<Set, L> {
        SensorBuilder {
            opener: Some(Arc::new(opener)),
            layout: self.layout,
            profile: self.profile,
            alpha: self.alpha,
            pressure_alpha: self.pressure_alpha,
            history_len: self.history_len,
            target_pressure: self.target_pressure,
            wire: self.wire,
            clock: self.clock,
            _opener_state: PhantomData,
            _layout_state: PhantomData,
        }
    }
}

impl<O> SensorBuilder<O, Missing> {
    pub fn with_layout(self, layout: Layout) -> SensorBuilder<O, Set> {
        SensorBuilder {
            opener: self.opener,
            layout: Some(layout),
            profile: self.profile,
            alpha: self.alpha,
            pressure_alpha: self.pressure_alpha,
            history_len: self.history_len,
            target_pressure: self.target_pressure,
            wire: self.wire,
            clock: self.clock,
            _opener_state: PhantomData,
            _layout_state: PhantomData,
        }
    }
}

impl SensorBuilder<Set, Set> {
    pub fn try_build(self) -> Result<Sensor, SensorError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(SensorError::InvalidArgument(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.pressure_alpha > 0.0 && self.pressure_alpha <= 1.0) {
            return Err(SensorError::InvalidArgument(format!(
                "pressure_alpha must be in (0, 1], got {}",
                self.pressure_alpha
            )));
        }

        let layout = self.layout.expect("type-state guarantees layout is set");
        let profile = self
            .profile
            .unwrap_or_else(|| Profile::identity_for(&layout));

        let patch_ids = layout.patches();
        let mut patch_index = HashMap::with_capacity(patch_ids.len());
        let mut patches = Vec::with_capacity(patch_ids.len());
        for (idx, &patch) in patch_ids.iter().enumerate() {
            patch_index.insert(patch, idx);
            let cell_count = layout.cell_count(patch);
            patches.push(Arc::new(Mutex::new(PatchState::new(
                patch,
                cell_count,
                self.history_len,
            ))));
        }

        Ok(Sensor {
            opener: self.opener.expect("type-state guarantees opener is set"),
            layout: Arc::new(layout),
            profile: Arc::new(RwLock::new(profile)),
            patches: patches.into(),
            patch_index: Arc::new(patch_index),
            counters: Arc::new(Counters::default()),
            alpha: Arc::new(RwLock::new(self.alpha)),
            pressure_alpha: Arc::new(RwLock::new(self.pressure_alpha)),
            target_pressure: self.target_pressure,
            wire: self.wire,
            history_len: self.history_len,
            calibration: Arc::new(CalibrationController::new()),
            running: Arc::new(AtomicBool::new(false)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            reader_handle: None,
            last_error: Arc::new(Mutex::new(None)),
            sample_log: Arc::new(Mutex::new(None)),
            debug_log: Arc::new(Mutex::new(None)),
            clock: self.clock,
        })
    }
}

struct SampleLog {
    file: File,
    header_written: bool,
    columns: Vec<(u32, u32)>,
    column_index: HashMap<(u32, u32), usize>,
    frame: Vec<Option<i32>>,
    records_since_frame: usize,
}

/// Owns the ingest thread and all sensor-scoped state. Dropping a running
/// `Sensor` signals stop and joins, same as explicit `stop()`.
pub struct Sensor {
    opener: Arc<dyn DeviceOpener>,
    layout: Arc<Layout>,
    profile: Arc<RwLock<Profile>>,
    patches: Arc<[Arc<Mutex<PatchState>>]>,
    patch_index: Arc<HashMap<u32, usize>>,
    counters: Arc<Counters>,
    alpha: Arc<RwLock<f64>>,
    pressure_alpha: Arc<RwLock<f64>>,
    target_pressure: f64,
    wire: WireParams,
    history_len: usize,
    calibration: Arc<CalibrationController>,
    running: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    reader_handle: Option<JoinHandle<()>>,
    last_error: Arc<Mutex<Option<String>>>,
    sample_log: Arc<Mutex<Option<SampleLog>>>,
    debug_log: Arc<Mutex<Option<File>>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Sensor {
    fn patch_by_id(&self, patch: u32) -> Result<&Arc<Mutex<PatchState>>, SensorError> {
        self.patch_index
            .get(&patch)
            .map(|&idx| &self.patches[idx])
            .ok_or(SensorError::UnknownCell { patch, cell: 0 })
    }

    pub fn set_alpha(&self, alpha: f64) -> Result<(), SensorError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(SensorError::InvalidArgument(format!(
                "alpha must be in (0, 1], got {alpha}"
            )));
        }
        *self.alpha.write().unwrap() = alpha;
        Ok(())
    }

    pub fn set_pressure_alpha(&self, alpha: f64) -> Result<(), SensorError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(SensorError::InvalidArgument(format!(
                "pressure_alpha must be in (0, 1], got {alpha}"
            )));
        }
        *self.pressure_alpha.write().unwrap() = alpha;
        Ok(())
    }

    pub fn read_profile(&self, path: &Path) -> Result<(), SensorError> {
        let file = File::open(path)
            .map_err(|e| SensorError::DeviceIoError(format!("opening {}: {e}", path.display())))?;
        let rows = skin_config::load_profile_csv(file).map_err(|_| SensorError::ParseError {
            file: path.display().to_string(),
            line: 0,
        })?;
        let profile = Profile::load(&rows, &self.layout)?;
        *self.profile.write().unwrap() = profile;
        Ok(())
    }

    pub fn save_profile(&self, path: &Path) -> Result<(), SensorError> {
        let rows = self.profile.read().unwrap().save_rows();
        let file = File::create(path)
            .map_err(|e| SensorError::DeviceIoError(format!("creating {}: {e}", path.display())))?;
        skin_config::save_profile_csv(file, &rows)
            .map_err(|e| SensorError::DeviceIoError(e.to_string()))?;
        Ok(())
    }

    /// Spawns the ingest thread. Idempotent: calling `start()` while
    /// already running is a no-op.
    pub fn start(&mut self) -> Result<(), SensorError> {
        if self.running.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut device = self
            .opener
            .open()
            .map_err(|e| SensorError::DeviceNotFound(e.to_string()))?;
        let _ = device.write_all(&[self.wire.start_token]);

        self.stop_flag.store(false, Ordering::Release);
        *self.last_error.lock().unwrap() = None;

        let layout = self.layout.clone();
        let profile = self.profile.clone();
        let patches = self.patches.clone();
        let patch_index = self.patch_index.clone();
        let counters = self.counters.clone();
        let alpha = self.alpha.clone();
        let calibration = self.calibration.clone();
        let stop_flag = self.stop_flag.clone();
        let last_error = self.last_error.clone();
        let sample_log = self.sample_log.clone();
        let debug_log = self.debug_log.clone();
        let wire = self.wire.clone();
        let history_len = self.history_len;
        let stop_token = self.wire.stop_token;

        let handle = std::thread::Builder::new()
            .name("skin-reader".into())
            .spawn(move || {
                let mut reader = FrameReader::new(&wire);
                loop {
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    match reader.next_record(device.as_mut(), &layout, &counters) {
                        Ok(Some(record)) => {
                            let Some(&patch_idx) = patch_index.get(&record.patch) else {
                                continue;
                            };
                            let Some(slot) = layout.cell_slot(record.patch, record.cell) else {
                                continue;
                            };
                            let cal = profile.read().unwrap().get(record.patch, record.cell);
                            let a = *alpha.read().unwrap();
                            let calibrating =
                                calibration.state() == CalibrationState::Capturing;
                            let mut guard = patches[patch_idx].lock().unwrap();
                            pipeline::apply_record(
                                record, slot, &mut guard, cal, a, calibrating, history_len,
                            );
                            let raw_latest = guard.cells[slot].raw_latest;
                            drop(guard);

                            if let Some(log) = sample_log.lock().unwrap().as_mut() {
                                log.note_record(record.patch, record.cell, raw_latest);
                            }
                        }
                        Ok(None) => {
                            tracing::info!("device reached EOF, reader thread exiting");
                            break;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "fatal device error, reader thread exiting");
                            *last_error.lock().unwrap() = Some(e.to_string());
                            if let Some(dbg) = debug_log.lock().unwrap().as_mut() {
                                let _ = writeln!(dbg, "fatal device error: {e}");
                            }
                            break;
                        }
                    }
                }
                let _ = device.write_all(&[stop_token]);
            })
            .expect("failed to spawn reader thread");

        self.reader_handle = Some(handle);
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    /// Signals the reader thread and joins it within a bounded grace
    /// period, then transitions to `STOPPED`. If the thread is stuck in a
    /// blocking `read` on a misbehaving driver and does not exit in time,
    /// the handle is detached rather than blocking the caller forever.
    /// Idempotent: calling `stop()` while already stopped is a no-op.
    pub fn stop(&mut self) -> Result<(), SensorError> {
        if !self.running.load(Ordering::Acquire) {
            return Ok(());
        }
        self.stop_flag.store(true, Ordering::Release);
        if let Some(handle) = self.reader_handle.take() {
            join_with_grace_period(handle, STOP_GRACE_PERIOD);
        }
        self.running.store(false, Ordering::Release);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    pub fn calibrate_start(&self) {
        self.calibration.start(&self.patches, self.clock.as_ref());
    }

    pub fn calibrate_stop(&self) -> Result<(), SensorError> {
        self.calibration.stop(&self.patches, &self.layout, &self.profile)
    }

    pub fn get_patch_state(&self, patch: u32) -> Result<Vec<f64>, SensorError> {
        let cell = self.patch_by_id(patch)?;
        let guard = cell.lock().unwrap();
        Ok(aggregator::patch_state(&self.layout, &guard))
    }

    pub fn get_patch_mean(&self, patch: u32) -> Result<f64, SensorError> {
        let cell = self.patch_by_id(patch)?;
        let guard = cell.lock().unwrap();
        let profile = self.profile.read().unwrap();
        Ok(aggregator::patch_mean(&self.layout, &profile, &guard))
    }

    pub fn get_patch_pressure(&self, patch: u32) -> Result<(f64, f64, f64), SensorError> {
        let cell = self.patch_by_id(patch)?;
        let mut guard = cell.lock().unwrap();
        let profile = self.profile.read().unwrap();
        let pressure_alpha = *self.pressure_alpha.read().unwrap();
        Ok(aggregator::patch_pressure(
            &self.layout,
            &profile,
            &mut guard,
            pressure_alpha,
        ))
    }

    pub fn get_history(&self, patch: u32, cell: u32) -> Result<Vec<i32>, SensorError> {
        if !self.layout.has(patch, cell) {
            return Err(SensorError::UnknownCell { patch, cell });
        }
        let slot = self.layout.cell_slot(patch, cell).expect("validated above");
        let patch_arc = self.patch_by_id(patch)?;
        let guard = patch_arc.lock().unwrap();
        Ok(guard.cells[slot].history_snapshot())
    }

    pub fn set_c1(&self, patch: u32, cell: u32, v: f64) -> Result<(), SensorError> {
        self.profile.write().unwrap().set_c1(patch, cell, v)
    }

    pub fn get_c1(&self, patch: u32, cell: u32) -> Result<f64, SensorError> {
        if !self.layout.has(patch, cell) {
            return Err(SensorError::UnknownCell { patch, cell });
        }
        Ok(self.profile.read().unwrap().get(patch, cell).c1)
    }

    pub fn log(&self, path: &Path) -> Result<(), SensorError> {
        let file = File::create(path)
            .map_err(|e| SensorError::DeviceIoError(format!("opening {}: {e}", path.display())))?;
        let mut columns = Vec::new();
        let mut column_index = HashMap::new();
        for patch in self.layout.patches() {
            for cell in self.layout.cells(patch) {
                column_index.insert((patch, cell), columns.len());
                columns.push((patch, cell));
            }
        }
        let frame = vec![None; columns.len()];
        *self.sample_log.lock().unwrap() = Some(SampleLog {
            file,
            header_written: false,
            columns,
            column_index,
            frame,
            records_since_frame: 0,
        });
        Ok(())
    }

    pub fn debuglog(&self, path: &Path) -> Result<(), SensorError> {
        let file = File::create(path)
            .map_err(|e| SensorError::DeviceIoError(format!("opening {}: {e}", path.display())))?;
        *self.debug_log.lock().unwrap() = Some(file);
        Ok(())
    }

    pub fn get_record_tally(&self) -> RecordTally {
        self.counters.snapshot()
    }

    /// A display-oriented constant used by UI clients to pick a pressure
    /// color scale; not derived from the profile, but a configured
    /// constant set at build time.
    pub fn target_pressure(&self) -> f64 {
        self.target_pressure
    }
}

impl SampleLog {
    /// Records one emitted record into the in-progress frame row. A frame
    /// boundary is a full pass over every declared cell: once every column
    /// has been touched, the row is flushed and the frame resets.
    fn note_record(&mut self, patch: u32, cell: u32, raw: i32) {
        if !self.header_written {
            let mut header = vec!["time".to_string()];
            for &(p, c) in &self.columns {
                header.push(format!("patch{p}_cell{c}"));
            }
            let _ = writeln!(self.file, "{}", header.join(","));
            self.header_written = true;
        }
        if let Some(&idx) = self.column_index.get(&(patch, cell)) {
            self.frame[idx] = Some(raw);
            self.records_since_frame += 1;
        }
        if self.records_since_frame >= self.columns.len() {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            let mut row = vec![format!("{now}")];
            for value in &self.frame {
                row.push(value.map(|v| v.to_string()).unwrap_or_default());
            }
            let _ = writeln!(self.file, "{}", row.join(","));
            self.records_since_frame = 0;
            self.frame.fill(None);
        }
    }
}

impl Drop for Sensor {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            self.stop_flag.store(true, Ordering::Release);
            if let Some(handle) = self.reader_handle.take() {
                join_with_grace_period(handle, STOP_GRACE_PERIOD);
            }
        }
    }
}

/// Bound on how long `stop()`/`Drop` will wait for the reader thread to
/// exit before giving up and detaching it.
const STOP_GRACE_PERIOD: std::time::Duration = std::time::Duration::from_secs(2);

/// Joins `handle` on a helper thread and waits up to `grace` for it to
/// report back. A stuck reader thread (blocked in a device `read` that
/// never returns) is left detached rather than hanging the caller.
fn join_with_grace_period(handle: JoinHandle<()>, grace: std::time::Duration) {
    let (tx, rx) = std::sync::mpsc::channel();
    let joiner = std::thread::Builder::new()
        .name("skin-reader-joiner".into())
        .spawn(move || {
            let result = handle.join();
            let _ = tx.send(result.is_err());
        });
    let Ok(joiner) = joiner else {
        tracing::warn!("failed to spawn join-watcher thread; detaching reader thread");
        return;
    };
    match rx.recv_timeout(grace) {
        Ok(panicked) => {
            if panicked {
                tracing::warn!("reader thread panicked during stop");
            }
            let _ = joiner.join();
        }
        Err(_) => {
            tracing::warn!("reader thread did not exit within the grace period, detaching");
        }
    }
}
