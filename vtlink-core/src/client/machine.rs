//! Client internals: the shared mutable state behind the coarse lock and
//! the state-machine/upload/heartbeat logic driven from `update()`.

use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, info, trace, warn};

use crate::capabilities::Capabilities;
use crate::codec::event::{Event, KeyEvent, PointingEvent, SelectInputEvent};
use crate::codec::Command;
use crate::dispatch::{
    EventDispatcher, KeyEventCallback, PointingEventCallback, SelectInputEventCallback,
};
use crate::error::VtError;
use crate::network::{TxCompleteCallback, ECU_TO_VT_PGN, WORKING_SET_MASTER_PGN};
use crate::pool::{transfer_chunk_source, PoolRegistry};
use crate::state::ConnectionState;
use crate::status::VtStatus;
use crate::types::KeyActivationCode;

use super::{
    VirtualTerminalClient, STATE_MACHINE_TIMEOUT_MS, VT_STATUS_TIMEOUT_MS,
    WORKING_SET_MAINTENANCE_TIMEOUT_MS,
};

bitflags! {
    /// Deferred-send flags, re-drained on the next tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct RetryFlags: u8 {
        const SEND_WORKING_SET_MAINTENANCE = 0x01;
    }
}

/// Progress of the pool currently moving through the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum PoolUploadState {
    #[default]
    Uninitialized,
    InProgress,
    Success,
    Failed,
}

#[derive(Debug, Default)]
pub(crate) struct UploadProgress {
    pub pool_index: Option<u8>,
    pub state: PoolUploadState,
}

// ── Shared ───────────────────────────────────────────────────────

/// Everything behind the client's coarse mutex.
pub(crate) struct Shared {
    pub state: ConnectionState,
    pub state_entered_ms: u64,
    /// `None` until the partner server has been seen this session.
    pub status: Option<VtStatus>,
    pub capabilities: Capabilities,
    pub pools: PoolRegistry,
    pub upload: UploadProgress,
    pub dispatcher: EventDispatcher,
    pub retry_flags: RetryFlags,
    pub last_maintenance_ms: u64,
    /// The next maintenance message carries the initiating bit.
    pub maintenance_initializing: bool,
    pub last_error: Option<VtError>,
    version_conflict_logged: bool,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            state_entered_ms: 0,
            status: None,
            capabilities: Capabilities::new(),
            pools: PoolRegistry::new(),
            upload: UploadProgress::default(),
            dispatcher: EventDispatcher::new(),
            retry_flags: RetryFlags::empty(),
            last_maintenance_ms: 0,
            maintenance_initializing: false,
            last_error: None,
            version_conflict_logged: false,
        }
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState, now: u64) {
        if state != self.state {
            debug!(from = %self.state, to = %state, "connection state transition");
        }
        self.state = state;
        self.state_entered_ms = now;
    }

    /// Forget everything learned from the previous server session; pools
    /// stay registered but must re-upload.
    pub(crate) fn reset_connection(&mut self) {
        self.status = None;
        self.capabilities.clear();
        self.pools.reset_uploaded();
        self.upload = UploadProgress::default();
        self.retry_flags = RetryFlags::empty();
        self.last_maintenance_ms = 0;
        self.maintenance_initializing = false;
        self.last_error = None;
        self.version_conflict_logged = false;
    }

    fn fail(&mut self, error: VtError, now: u64) {
        warn!(error = %error, "entering Failed state");
        self.last_error = Some(error);
        self.set_state(ConnectionState::Failed, now);
    }

    // ── Inbound processing ───────────────────────────────────────

    /// Apply a decoded event to the connection state. Returns the
    /// callbacks to run (outside the lock) for user-input events.
    pub(crate) fn handle_event(&mut self, event: Event, now: u64) -> Option<DispatchWork> {
        match event {
            Event::VtStatus {
                working_set_master_address,
                data_mask_object_id,
                soft_key_mask_object_id,
                busy_flags,
                command_function,
            } => {
                self.status = Some(VtStatus {
                    last_seen_ms: now,
                    active_working_set_master_address: working_set_master_address,
                    active_data_mask_id: data_mask_object_id,
                    active_softkey_mask_id: soft_key_mask_object_id,
                    busy_flags,
                    current_command_function: command_function,
                });
                None
            }

            Event::SoftKeyActivation(key) => Some(DispatchWork::SoftKey(
                self.dispatcher.soft_key_handlers(),
                key,
            )),
            Event::ButtonActivation(key) => {
                Some(DispatchWork::Button(self.dispatcher.button_handlers(), key))
            }
            Event::Pointing { x, y, touch_state } => {
                let pointing = PointingEvent {
                    activation: touch_state.unwrap_or(KeyActivationCode::ButtonPressedOrLatched),
                    x,
                    y,
                };
                Some(DispatchWork::Pointing(
                    self.dispatcher.pointing_handlers(),
                    pointing,
                ))
            }
            Event::SelectInputObject(select) => Some(DispatchWork::SelectInput(
                self.dispatcher.select_input_handlers(),
                select,
            )),

            Event::GetMemoryResponse {
                version,
                enough_memory,
            } => {
                if self.state == ConnectionState::WaitForGetMemoryResponse {
                    self.capabilities.apply_connected_version(version);
                    if enough_memory {
                        self.set_state(ConnectionState::SendGetNumberSoftkeys, now);
                    } else {
                        self.fail(VtError::InsufficientMemory, now);
                    }
                }
                None
            }
            Event::GetNumberOfSoftkeysResponse {
                x_pixels,
                y_pixels,
                virtual_keys,
                physical_keys,
            } => {
                if self.state == ConnectionState::WaitForGetNumberSoftkeysResponse {
                    self.capabilities
                        .apply_soft_key_data(x_pixels, y_pixels, virtual_keys, physical_keys);
                    self.set_state(ConnectionState::SendGetTextFontData, now);
                }
                None
            }
            Event::GetTextFontDataResponse {
                small_sizes,
                large_sizes,
                styles,
            } => {
                if self.state == ConnectionState::WaitForGetTextFontDataResponse {
                    self.capabilities
                        .apply_font_data(small_sizes, large_sizes, styles);
                    self.set_state(ConnectionState::SendGetHardware, now);
                }
                None
            }
            Event::GetHardwareResponse {
                boot_time_s: _,
                graphic_mode,
                features,
                x_pixels,
                y_pixels,
            } => {
                if self.state == ConnectionState::WaitForGetHardwareResponse {
                    self.capabilities
                        .apply_hardware_data(graphic_mode, features, x_pixels, y_pixels);
                    self.upload = UploadProgress::default();
                    self.set_state(ConnectionState::UploadObjectPool, now);
                }
                None
            }
            Event::EndOfObjectPoolResponse {
                success,
                parent_object_id,
                object_id,
                error_codes,
            } => {
                if self.state == ConnectionState::WaitForEndOfObjectPoolResponse {
                    if success {
                        info!("object pool accepted; client connected");
                        self.maintenance_initializing = true;
                        self.last_maintenance_ms = 0;
                        self.set_state(ConnectionState::Connected, now);
                    } else {
                        self.fail(
                            VtError::EndOfObjectPoolRejected {
                                parent_object_id,
                                object_id,
                                error_codes,
                            },
                            now,
                        );
                    }
                }
                None
            }

            Event::UnsupportedFunction { function } => {
                warn!(function, "VT server reports unsupported function");
                None
            }
            Event::Esc {
                object_id,
                error_code,
            } => {
                trace!(object_id, error_code, "input aborted at the server");
                None
            }
            Event::ChangedNumericValue { object_id, value } => {
                trace!(object_id, value, "server changed a numeric value");
                None
            }
            Event::ChangedActiveMask { mask_object_id, .. } => {
                trace!(mask_object_id, "server changed the active mask");
                None
            }
            Event::ChangedSoftKeyMask { mask_object_id, .. } => {
                trace!(mask_object_id, "server changed a soft key mask");
                None
            }
            Event::ChangedStringValue { object_id, .. } => {
                trace!(object_id, "server changed a string value");
                None
            }
            Event::UserLayoutHideShow { object_id, shown } => {
                trace!(object_id, shown, "user layout hide/show");
                None
            }
            Event::AudioSignalTerminated { terminated } => {
                trace!(terminated, "audio signal termination");
                None
            }
        }
    }
}

/// Callbacks snapshotted under the lock, to be invoked after it is
/// released so handlers can issue follow-up commands.
pub(crate) enum DispatchWork {
    SoftKey(Vec<KeyEventCallback>, KeyEvent),
    Button(Vec<KeyEventCallback>, KeyEvent),
    Pointing(Vec<PointingEventCallback>, PointingEvent),
    SelectInput(Vec<SelectInputEventCallback>, SelectInputEvent),
}

impl DispatchWork {
    pub(crate) fn run(self) {
        match self {
            DispatchWork::SoftKey(handlers, event) => {
                for handler in handlers {
                    handler(&event);
                }
            }
            DispatchWork::Button(handlers, event) => {
                for handler in handlers {
                    handler(&event);
                }
            }
            DispatchWork::Pointing(handlers, event) => {
                for handler in handlers {
                    handler(&event);
                }
            }
            DispatchWork::SelectInput(handlers, event) => {
                for handler in handlers {
                    handler(&event);
                }
            }
        }
    }
}

// ── Tick logic ───────────────────────────────────────────────────

impl VirtualTerminalClient {
    /// One cooperative step: drain retry flags, then advance the state
    /// machine by at most one send or timeout transition.
    pub(super) fn tick(&self, shared: &mut Shared, now: u64) {
        if shared
            .retry_flags
            .contains(RetryFlags::SEND_WORKING_SET_MAINTENANCE)
            && shared.state.is_connected()
            && self.send_maintenance(shared, now)
        {
            shared
                .retry_flags
                .remove(RetryFlags::SEND_WORKING_SET_MAINTENANCE);
        }

        if shared.state.awaits_response()
            && now.saturating_sub(shared.state_entered_ms) >= STATE_MACHINE_TIMEOUT_MS
        {
            let state = shared.state;
            shared.fail(VtError::ProtocolTimeout { state }, now);
            return;
        }

        match shared.state {
            ConnectionState::Disconnected => {
                // Still initialized, so a previous session ended; start over.
                shared.reset_connection();
                shared.set_state(ConnectionState::WaitForPartnerVTStatus, now);
            }
            ConnectionState::WaitForPartnerVTStatus => {
                if shared.status.is_some() {
                    shared.set_state(ConnectionState::SendWorkingSetMaster, now);
                }
            }
            ConnectionState::SendWorkingSetMaster => {
                // One working set member (ourselves), rest reserved.
                let frame = [0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
                if self
                    .network
                    .send_frame(WORKING_SET_MASTER_PGN, &self.source, None, &frame, None)
                {
                    shared.set_state(ConnectionState::ReadyForObjectPool, now);
                }
            }
            ConnectionState::ReadyForObjectPool => {
                if shared.pools.is_empty() {
                    return;
                }
                if !shared.pools.versions_consistent() {
                    if !shared.version_conflict_logged {
                        warn!("registered object pools declare different VT versions; refusing to continue");
                        shared.version_conflict_logged = true;
                    }
                    return;
                }
                shared.set_state(ConnectionState::SendGetMemory, now);
            }
            ConnectionState::SendGetMemory => {
                let required_bytes = shared.pools.total_size();
                if self.submit(&Command::GetMemory { required_bytes }) {
                    shared.set_state(ConnectionState::WaitForGetMemoryResponse, now);
                }
            }
            ConnectionState::SendGetNumberSoftkeys => {
                if self.submit(&Command::GetNumberOfSoftkeys) {
                    shared.set_state(ConnectionState::WaitForGetNumberSoftkeysResponse, now);
                }
            }
            ConnectionState::SendGetTextFontData => {
                if self.submit(&Command::GetTextFontData) {
                    shared.set_state(ConnectionState::WaitForGetTextFontDataResponse, now);
                }
            }
            ConnectionState::SendGetHardware => {
                if self.submit(&Command::GetHardware) {
                    shared.set_state(ConnectionState::WaitForGetHardwareResponse, now);
                }
            }
            ConnectionState::UploadObjectPool => self.pump_upload(shared, now),
            ConnectionState::SendEndOfObjectPool => {
                if self.submit(&Command::EndOfObjectPool) {
                    shared.set_state(ConnectionState::WaitForEndOfObjectPoolResponse, now);
                }
            }
            ConnectionState::Connected => {
                let status_stale = shared
                    .status
                    .map_or(true, |s| now.saturating_sub(s.last_seen_ms) > VT_STATUS_TIMEOUT_MS);
                if status_stale {
                    info!("VT status lost; server considered offline");
                    shared.set_state(ConnectionState::Disconnected, now);
                } else if now.saturating_sub(shared.last_maintenance_ms)
                    >= WORKING_SET_MAINTENANCE_TIMEOUT_MS
                    && !self.send_maintenance(shared, now)
                {
                    shared
                        .retry_flags
                        .insert(RetryFlags::SEND_WORKING_SET_MAINTENANCE);
                }
            }
            // Waits are handled by the timeout check above; Failed is
            // terminal until re-initialization.
            ConnectionState::WaitForGetMemoryResponse
            | ConnectionState::WaitForGetNumberSoftkeysResponse
            | ConnectionState::WaitForGetTextFontDataResponse
            | ConnectionState::WaitForGetHardwareResponse
            | ConnectionState::WaitForEndOfObjectPoolResponse
            | ConnectionState::Failed => {}
        }
    }

    fn send_maintenance(&self, shared: &mut Shared, now: u64) -> bool {
        let command = Command::WorkingSetMaintenance {
            initializing: shared.maintenance_initializing,
            version: shared.pools.declared_version().unwrap_or_default(),
        };
        if self.submit(&command) {
            shared.last_maintenance_ms = now;
            shared.maintenance_initializing = false;
            true
        } else {
            false
        }
    }

    /// Drive the pool currently uploading, or start the next pending one.
    fn pump_upload(&self, shared: &mut Shared, now: u64) {
        match shared.upload.state {
            PoolUploadState::Uninitialized => {
                let (index, total_size, fetch) = match shared.pools.next_pending() {
                    Some(pool) => (
                        pool.index,
                        pool.source.size() + 1,
                        transfer_chunk_source(&pool.source),
                    ),
                    None => {
                        shared.set_state(ConnectionState::SendEndOfObjectPool, now);
                        return;
                    }
                };

                let weak = Arc::downgrade(&self.shared);
                let on_complete: TxCompleteCallback = Box::new(move |success| {
                    let Some(shared) = weak.upgrade() else {
                        return; // client already gone; tolerate late completion
                    };
                    let Ok(mut shared) = shared.lock() else {
                        return;
                    };
                    if success {
                        shared.pools.mark_uploaded(index);
                        shared.upload.state = PoolUploadState::Success;
                    } else {
                        shared.upload.state = PoolUploadState::Failed;
                    }
                });

                if self.network.send_transport(
                    ECU_TO_VT_PGN,
                    &self.source,
                    Some(&self.partner),
                    total_size,
                    fetch,
                    on_complete,
                ) {
                    debug!(pool = index, bytes = total_size, "object pool upload started");
                    shared.upload.pool_index = Some(index);
                    shared.upload.state = PoolUploadState::InProgress;
                }
                // Submission failure: stay Uninitialized and retry next tick.
            }
            PoolUploadState::InProgress => {}
            PoolUploadState::Success => {
                shared.upload = UploadProgress::default();
                if shared.pools.all_uploaded() {
                    shared.set_state(ConnectionState::SendEndOfObjectPool, now);
                }
            }
            PoolUploadState::Failed => {
                let pool_index = shared.upload.pool_index.unwrap_or(0);
                shared.upload = UploadProgress::default();
                shared.fail(VtError::UploadAborted { pool_index }, now);
            }
        }
    }
}
