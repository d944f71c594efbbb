//! The virtual terminal client facade.
//!
//! Construct with the network manager and the two control functions,
//! register at least one object pool, then call [`VirtualTerminalClient::initialize`].
//! The state machine announces the working set, queries the server's
//! capabilities, streams the pools up, and settles in the Connected state,
//! after which the `send_*` command family and the event subscriptions are
//! live.
//!
//! Progress is cooperative: either let `initialize(true)` spawn the
//! internal update thread, or call [`VirtualTerminalClient::update`]
//! cyclically (every 50 ms or faster keeps the 1 s maintenance heartbeat
//! well within its deadline).
//!
//! All shared state sits behind one coarse mutex, taken at the top of
//! `update()`, every send function, and the receive path. Send functions
//! never block on I/O: they hand the frame to the network manager and
//! report whether it was accepted for transmission.

mod machine;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, warn};

use crate::capabilities::HardwareFeatures;
use crate::codec::event::{Event, KeyEvent, PointingEvent, SelectInputEvent};
use crate::codec::{Command, GraphicsContextCommand};
use crate::dispatch::SubscriptionId;
use crate::error::VtError;
use crate::network::{
    CanMessage, ControlFunction, DataChunkCallback, NetworkManager, ECU_TO_VT_PGN, VT_TO_ECU_PGN,
};
use crate::state::ConnectionState;
use crate::status::VtStatus;
use crate::time::{Clock, MonotonicClock};
use crate::types::{
    AlarmMaskPriority, EnableDisableState, FillType, FontSize, FontStyle, GraphicMode,
    HideShowState, LineDirection, MaskLockState, MaskType, SelectInputOption, VtVersion,
};

use machine::Shared;

/// Max allowable silence between VT status messages before the server is
/// considered offline.
pub const VT_STATUS_TIMEOUT_MS: u64 = 3000;

/// Cadence of the working set maintenance heartbeat while connected.
pub const WORKING_SET_MAINTENANCE_TIMEOUT_MS: u64 = 1000;

/// Per-step wait window for handshake responses.
pub const STATE_MACHINE_TIMEOUT_MS: u64 = 3000;

/// Sleep between iterations of the internal update thread.
const UPDATE_INTERVAL_MS: u64 = 50;

// ── VirtualTerminalClient ────────────────────────────────────────

/// A client connection to one ISOBUS virtual terminal server.
pub struct VirtualTerminalClient {
    network: Arc<dyn NetworkManager>,
    partner: Arc<ControlFunction>,
    source: Arc<ControlFunction>,
    clock: Arc<dyn Clock>,
    pub(crate) shared: Arc<Mutex<Shared>>,
    initialized: AtomicBool,
    rx_registered: AtomicBool,
    should_terminate: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl VirtualTerminalClient {
    /// Create a client that sends from `source` and partners with the VT
    /// server at `partner`.
    pub fn new(
        network: Arc<dyn NetworkManager>,
        partner: Arc<ControlFunction>,
        source: Arc<ControlFunction>,
    ) -> Arc<Self> {
        Self::with_clock(network, partner, source, Arc::new(MonotonicClock::new()))
    }

    /// Like [`VirtualTerminalClient::new`] with an injected clock, so
    /// tests and simulations can drive time.
    pub fn with_clock(
        network: Arc<dyn NetworkManager>,
        partner: Arc<ControlFunction>,
        source: Arc<ControlFunction>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            network,
            partner,
            source,
            clock,
            shared: Arc::new(Mutex::new(Shared::new())),
            initialized: AtomicBool::new(false),
            rx_registered: AtomicBool::new(false),
            should_terminate: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start the state machine. Call once at least one object pool is
    /// registered (registering afterwards, while still waiting for a
    /// server, is also fine).
    ///
    /// With `spawn_thread` the client runs its own update thread;
    /// otherwise the embedder must call [`VirtualTerminalClient::update`]
    /// cyclically. Re-initializing after `Failed` or `terminate` restarts
    /// the handshake from scratch.
    pub fn initialize(self: &Arc<Self>, spawn_thread: bool) {
        self.should_terminate.store(false, Ordering::SeqCst);
        {
            let now = self.clock.now_ms();
            let mut shared = self.lock();
            shared.reset_connection();
            shared.set_state(ConnectionState::WaitForPartnerVTStatus, now);
        }

        if !self.rx_registered.swap(true, Ordering::SeqCst) {
            let weak = Arc::downgrade(self);
            self.network.register_rx(
                VT_TO_ECU_PGN,
                Arc::new(move |message| {
                    if let Some(client) = weak.upgrade() {
                        client.process_rx_message(message);
                    }
                }),
            );
        }

        self.initialized.store(true, Ordering::SeqCst);

        if spawn_thread {
            let mut worker = match self.worker.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if worker.is_none() {
                let client = Arc::clone(self);
                let stop = Arc::clone(&self.should_terminate);
                let spawned = std::thread::Builder::new()
                    .name("vt-client-update".into())
                    .spawn(move || {
                        while !stop.load(Ordering::SeqCst) {
                            client.update();
                            std::thread::sleep(Duration::from_millis(UPDATE_INTERVAL_MS));
                        }
                    });
                match spawned {
                    Ok(handle) => *worker = Some(handle),
                    Err(e) => error!(error = %e, "could not spawn update thread; call update() manually"),
                }
            }
        }
    }

    /// Whether [`VirtualTerminalClient::initialize`] has been called (and
    /// not since undone by [`VirtualTerminalClient::terminate`]).
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Stop the client and join the internal update thread if one is
    /// running. Safe to call repeatedly; completion callbacks that fire
    /// after this become no-ops.
    pub fn terminate(&self) {
        self.should_terminate.store(true, Ordering::SeqCst);
        let handle = {
            let mut worker = match self.worker.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            worker.take()
        };
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        if self.initialized.swap(false, Ordering::SeqCst) {
            let now = self.clock.now_ms();
            self.lock().set_state(ConnectionState::Disconnected, now);
        }
    }

    /// One cooperative step of the periodic driver: drains retry flags,
    /// checks VT status freshness and the maintenance schedule, and
    /// advances the state machine by at most one transition.
    pub fn update(&self) {
        if !self.is_initialized() {
            return;
        }
        let now = self.clock.now_ms();
        let mut shared = self.lock();
        self.tick(&mut shared, now);
    }

    /// Receive entry point; wire this to the network manager's delivery
    /// of the VT-to-ECU parameter group (done automatically when the
    /// network manager honours `register_rx`).
    pub fn process_rx_message(&self, message: &CanMessage) {
        if message.pgn != VT_TO_ECU_PGN
            || message.source_address != self.partner.address()
            || !self.is_initialized()
        {
            return;
        }
        let event = match Event::decode(&message.data) {
            Ok(event) => event,
            Err(VtError::UnknownFunction { value }) => {
                tracing::trace!(function = value, "discarding unrecognized VT function");
                return;
            }
            Err(e) => {
                tracing::trace!(error = %e, "discarding undecodable VT message");
                return;
            }
        };

        let now = self.clock.now_ms();
        let work = {
            let mut shared = self.lock();
            shared.handle_event(event, now)
        };
        // Callbacks run outside the lock so they may send commands.
        if let Some(work) = work {
            work.run();
        }
    }

    // ── Event subscriptions ──────────────────────────────────────

    /// Register a callback for soft key presses and releases.
    pub fn register_soft_key_event_callback(
        &self,
        callback: impl Fn(&KeyEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.lock().dispatcher.add_soft_key(Arc::new(callback))
    }

    pub fn remove_soft_key_event_callback(&self, id: SubscriptionId) -> bool {
        self.lock().dispatcher.remove_soft_key(id)
    }

    /// Register a callback for button presses and releases.
    pub fn register_button_event_callback(
        &self,
        callback: impl Fn(&KeyEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.lock().dispatcher.add_button(Arc::new(callback))
    }

    pub fn remove_button_event_callback(&self, id: SubscriptionId) -> bool {
        self.lock().dispatcher.remove_button(id)
    }

    /// Register a callback for pointing (touch) events.
    pub fn register_pointing_event_callback(
        &self,
        callback: impl Fn(&PointingEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.lock().dispatcher.add_pointing(Arc::new(callback))
    }

    pub fn remove_pointing_event_callback(&self, id: SubscriptionId) -> bool {
        self.lock().dispatcher.remove_pointing(id)
    }

    /// Register a callback for input object selection events.
    pub fn register_select_input_object_event_callback(
        &self,
        callback: impl Fn(&SelectInputEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.lock().dispatcher.add_select_input(Arc::new(callback))
    }

    pub fn remove_select_input_object_event_callback(&self, id: SubscriptionId) -> bool {
        self.lock().dispatcher.remove_select_input(id)
    }

    // ── Object pools ─────────────────────────────────────────────

    /// Assign an in-memory object pool. The bytes are shared, not copied,
    /// and stay alive at least until the client reaches Connected.
    ///
    /// Returns `false` once the handshake has progressed past the point
    /// where pools may still be added, or for an empty pool. All pools
    /// must declare the same VT version.
    pub fn set_object_pool(
        &self,
        pool_index: u8,
        version: VtVersion,
        pool: impl Into<Arc<[u8]>>,
    ) -> bool {
        let pool = pool.into();
        if pool.is_empty() {
            return false;
        }
        let mut shared = self.lock();
        if !registration_open(shared.state) {
            warn!(pool_index, "object pool registered too late; ignoring");
            return false;
        }
        shared
            .pools
            .insert(pool_index, version, crate::pool::PoolSource::InMemory(pool));
        true
    }

    /// Assign an object pool whose bytes are pulled in chunks during
    /// upload; best for huge pools or pools paged in from storage. The
    /// callback must stay callable until the pool has uploaded.
    pub fn register_object_pool_data_chunk_callback(
        &self,
        pool_index: u8,
        version: VtVersion,
        total_size: u32,
        fetch: DataChunkCallback,
    ) -> bool {
        if total_size == 0 {
            return false;
        }
        let mut shared = self.lock();
        if !registration_open(shared.state) {
            warn!(pool_index, "object pool registered too late; ignoring");
            return false;
        }
        shared.pools.insert(
            pool_index,
            version,
            crate::pool::PoolSource::Chunked {
                total_size,
                fetch: Arc::new(Mutex::new(fetch)),
            },
        );
        true
    }

    // ── Connection queries ───────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.lock().state.is_connected()
    }

    /// The reason the machine last entered `Failed`, if it did.
    pub fn last_error(&self) -> Option<VtError> {
        self.lock().last_error.clone()
    }

    /// The most recent VT status snapshot, or `None` if no status has
    /// been seen this session.
    pub fn vt_status(&self) -> Option<VtStatus> {
        self.lock().status
    }

    // ── Capability getters ───────────────────────────────────────

    pub fn connected_vt_version(&self) -> VtVersion {
        self.lock().capabilities.connected_version()
    }

    /// Soft key width in pixels, as reported by the server.
    pub fn softkey_x_axis_pixels(&self) -> u8 {
        self.lock().capabilities.soft_key_x_pixels()
    }

    /// Soft key height in pixels, as reported by the server.
    pub fn softkey_y_axis_pixels(&self) -> u8 {
        self.lock().capabilities.soft_key_y_pixels()
    }

    pub fn number_virtual_softkeys(&self) -> u8 {
        self.lock().capabilities.virtual_soft_keys()
    }

    pub fn number_physical_softkeys(&self) -> u8 {
        self.lock().capabilities.physical_soft_keys()
    }

    pub fn font_size_supported(&self, size: FontSize) -> bool {
        self.lock().capabilities.font_size_supported(size)
    }

    pub fn font_style_supported(&self, style: FontStyle) -> bool {
        self.lock().capabilities.font_style_supported(style)
    }

    pub fn graphic_mode(&self) -> GraphicMode {
        self.lock().capabilities.graphic_mode()
    }

    /// Hardware feature bits; test individual features with
    /// [`HardwareFeatures::contains`].
    pub fn hardware_features(&self) -> HardwareFeatures {
        self.lock().capabilities.hardware_features()
    }

    /// Width of the data mask area in pixels.
    pub fn number_x_pixels(&self) -> u16 {
        self.lock().capabilities.x_pixels()
    }

    /// Height of the data mask area in pixels.
    pub fn number_y_pixels(&self) -> u16 {
        self.lock().capabilities.y_pixels()
    }

    // ── Command messages ─────────────────────────────────────────
    //
    // Each returns whether the frame was accepted for transmission, not
    // whether the server acted on it. They require the Connected state
    // and never block.

    /// Hide or show a container object.
    pub fn send_hide_show_object(&self, object_id: u16, state: HideShowState) -> bool {
        self.send_command(Command::HideShowObject { object_id, state })
    }

    /// Enable or disable an input field, button, or animation object.
    pub fn send_enable_disable_object(&self, object_id: u16, state: EnableDisableState) -> bool {
        self.send_command(Command::EnableDisableObject { object_id, state })
    }

    /// Force selection of an input field, button, or key object.
    pub fn send_select_input_object(&self, object_id: u16, option: SelectInputOption) -> bool {
        self.send_command(Command::SelectInputObject { object_id, option })
    }

    /// Send the ESC command, aborting any open input at the server.
    pub fn send_esc(&self) -> bool {
        self.send_command(Command::Esc)
    }

    /// Control the audio signal. Replaces any audio the server is
    /// currently playing for this working set.
    pub fn send_control_audio_signal(
        &self,
        activations: u8,
        frequency_hz: u16,
        duration_ms: u16,
        off_time_ms: u16,
    ) -> bool {
        self.send_command(Command::ControlAudioSignal {
            activations,
            frequency_hz,
            duration_ms,
            off_time_ms,
        })
    }

    /// Set the audio volume applied to subsequent audio signal commands.
    pub fn send_set_audio_volume(&self, volume_percent: u8) -> bool {
        self.send_command(Command::SetAudioVolume { volume_percent })
    }

    /// Move an object relative to its current position within a parent.
    ///
    /// The deltas carry a −127 bias on the wire: a value of 255 moves
    /// +128 px, 0 moves −127 px. Positive is down/right.
    pub fn send_change_child_location(
        &self,
        object_id: u16,
        parent_object_id: u16,
        relative_x: u8,
        relative_y: u8,
    ) -> bool {
        self.send_command(Command::ChangeChildLocation {
            object_id,
            parent_object_id,
            relative_x,
            relative_y,
        })
    }

    /// Place an object at an absolute position within its parent.
    pub fn send_change_child_position(
        &self,
        object_id: u16,
        parent_object_id: u16,
        x: u16,
        y: u16,
    ) -> bool {
        self.send_command(Command::ChangeChildPosition {
            object_id,
            parent_object_id,
            x,
            y,
        })
    }

    /// Change an object's size; zero width or height hides the object.
    pub fn send_change_size(&self, object_id: u16, width: u16, height: u16) -> bool {
        self.send_command(Command::ChangeSize {
            object_id,
            width,
            height,
        })
    }

    pub fn send_change_background_colour(&self, object_id: u16, colour: u8) -> bool {
        self.send_command(Command::ChangeBackgroundColour { object_id, colour })
    }

    /// Change the value of a numeric object (not its referenced variables).
    pub fn send_change_numeric_value(&self, object_id: u16, value: u32) -> bool {
        self.send_command(Command::ChangeNumericValue { object_id, value })
    }

    /// Change the value of a string object. The string may be shorter
    /// than the object's attribute length; the server pads with spaces.
    pub fn send_change_string_value(&self, object_id: u16, value: &str) -> bool {
        self.send_command(Command::ChangeStringValue {
            object_id,
            value: value.as_bytes().to_vec(),
        })
    }

    /// Change the endpoint of an output line object.
    pub fn send_change_endpoint(
        &self,
        object_id: u16,
        width: u16,
        height: u16,
        direction: LineDirection,
    ) -> bool {
        self.send_command(Command::ChangeEndPoint {
            object_id,
            width,
            height,
            direction,
        })
    }

    pub fn send_change_font_attributes(
        &self,
        object_id: u16,
        colour: u8,
        size: FontSize,
        font_type: u8,
        style: u8,
    ) -> bool {
        self.send_command(Command::ChangeFontAttributes {
            object_id,
            colour,
            size,
            font_type,
            style,
        })
    }

    pub fn send_change_line_attributes(
        &self,
        object_id: u16,
        colour: u8,
        width: u8,
        line_art: u16,
    ) -> bool {
        self.send_command(Command::ChangeLineAttributes {
            object_id,
            colour,
            width,
            line_art,
        })
    }

    pub fn send_change_fill_attributes(
        &self,
        object_id: u16,
        fill_type: FillType,
        colour: u8,
        pattern_object_id: u16,
    ) -> bool {
        self.send_command(Command::ChangeFillAttributes {
            object_id,
            fill_type,
            colour,
            pattern_object_id,
        })
    }

    /// Change the active mask of a working set.
    pub fn send_change_active_mask(
        &self,
        working_set_object_id: u16,
        new_mask_object_id: u16,
    ) -> bool {
        self.send_command(Command::ChangeActiveMask {
            working_set_object_id,
            new_mask_object_id,
        })
    }

    /// Change the soft key mask attached to a data or alarm mask.
    pub fn send_change_softkey_mask(
        &self,
        mask_type: MaskType,
        mask_object_id: u16,
        soft_key_mask_object_id: u16,
    ) -> bool {
        self.send_command(Command::ChangeSoftKeyMask {
            mask_type,
            mask_object_id,
            soft_key_mask_object_id,
        })
    }

    /// Change any attribute with an assigned attribute ID (not strings).
    pub fn send_change_attribute(&self, object_id: u16, attribute_id: u8, value: u32) -> bool {
        self.send_command(Command::ChangeAttribute {
            object_id,
            attribute_id,
            value,
        })
    }

    pub fn send_change_priority(
        &self,
        alarm_mask_object_id: u16,
        priority: AlarmMaskPriority,
    ) -> bool {
        self.send_command(Command::ChangePriority {
            alarm_mask_object_id,
            priority,
        })
    }

    /// Change a list item; [`crate::types::NULL_OBJECT_ID`] removes the
    /// entry without renumbering the rest.
    pub fn send_change_list_item(
        &self,
        object_id: u16,
        list_index: u8,
        new_object_id: u16,
    ) -> bool {
        self.send_command(Command::ChangeListItem {
            object_id,
            list_index,
            new_object_id,
        })
    }

    /// Freeze or unfreeze rendering of the visible mask, e.g. to make a
    /// series of changes visually atomic. The timeout only applies to
    /// lock commands.
    pub fn send_lock_unlock_mask(
        &self,
        state: MaskLockState,
        object_id: u16,
        timeout_ms: u16,
    ) -> bool {
        self.send_command(Command::LockUnlockMask {
            state,
            object_id,
            timeout_ms,
        })
    }

    pub fn send_execute_macro(&self, object_id: u16) -> bool {
        self.send_command(Command::ExecuteMacro { object_id })
    }

    pub fn send_change_object_label(
        &self,
        object_id: u16,
        label_object_id: u16,
        font_type: u8,
        graphic_object_id: u16,
    ) -> bool {
        self.send_command(Command::ChangeObjectLabel {
            object_id,
            label_object_id,
            font_type,
            graphic_object_id,
        })
    }

    pub fn send_change_polygon_point(
        &self,
        object_id: u16,
        point_index: u8,
        x: u16,
        y: u16,
    ) -> bool {
        self.send_command(Command::ChangePolygonPoint {
            object_id,
            point_index,
            x,
            y,
        })
    }

    /// Rescale a complete output polygon object.
    pub fn send_change_polygon_scale(&self, object_id: u16, width: u16, height: u16) -> bool {
        self.send_command(Command::ChangePolygonScale {
            object_id,
            width,
            height,
        })
    }

    pub fn send_select_colour_map(&self, object_id: u16) -> bool {
        self.send_command(Command::SelectColourMap { object_id })
    }

    pub fn send_execute_extended_macro(&self, object_id: u16) -> bool {
        self.send_command(Command::ExecuteExtendedMacro { object_id })
    }

    /// Select the active working set by the NAME of its master.
    pub fn send_select_active_working_set(&self, name: u64) -> bool {
        self.send_command(Command::SelectActiveWorkingSet { name })
    }

    /// Query an attribute value; the answer arrives asynchronously.
    pub fn send_get_attribute_value(&self, object_id: u16, attribute_id: u8) -> bool {
        self.send_command(Command::GetAttributeValue {
            object_id,
            attribute_id,
        })
    }

    // ── Graphics context commands ────────────────────────────────

    /// Set the graphics cursor of a graphics context object.
    pub fn send_set_graphics_cursor(&self, object_id: u16, x: i16, y: i16) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::SetGraphicsCursor { x, y })
    }

    /// Move the graphics cursor relative to its current position.
    pub fn send_move_graphics_cursor(&self, object_id: u16, dx: i16, dy: i16) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::MoveGraphicsCursor { dx, dy })
    }

    pub fn send_set_foreground_colour(&self, object_id: u16, colour: u8) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::SetForegroundColour { colour })
    }

    pub fn send_set_background_colour(&self, object_id: u16, colour: u8) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::SetBackgroundColour { colour })
    }

    /// Bind the line attributes used by subsequent drawing commands;
    /// NULL suppresses lines.
    pub fn send_set_line_attributes_object_id(
        &self,
        object_id: u16,
        line_attributes_object_id: u16,
    ) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::SetLineAttributesObjectId {
                object_id: line_attributes_object_id,
            },
        )
    }

    /// Bind the fill attributes used by subsequent drawing commands;
    /// NULL disables filling.
    pub fn send_set_fill_attributes_object_id(
        &self,
        object_id: u16,
        fill_attributes_object_id: u16,
    ) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::SetFillAttributesObjectId {
                object_id: fill_attributes_object_id,
            },
        )
    }

    /// Bind the font attributes used by subsequent text drawing; NULL if
    /// no text is drawn.
    pub fn send_set_font_attributes_object_id(
        &self,
        object_id: u16,
        font_attributes_object_id: u16,
    ) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::SetFontAttributesObjectId {
                object_id: font_attributes_object_id,
            },
        )
    }

    /// Fill a rectangle at the cursor with the background colour.
    pub fn send_erase_rectangle(&self, object_id: u16, width: u16, height: u16) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::EraseRectangle { width, height })
    }

    /// Set a pixel (relative to the cursor) to the foreground colour.
    pub fn send_draw_point(&self, object_id: u16, x: i16, y: i16) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::DrawPoint { x, y })
    }

    /// Draw a line from the cursor to the given offset.
    pub fn send_draw_line(&self, object_id: u16, x: i16, y: i16) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::DrawLine { x, y })
    }

    pub fn send_draw_rectangle(&self, object_id: u16, width: u16, height: u16) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::DrawRectangle { width, height })
    }

    pub fn send_draw_closed_ellipse(&self, object_id: u16, width: u16, height: u16) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::DrawClosedEllipse { width, height },
        )
    }

    /// Draw a polygon; offsets are relative to the cursor, and an
    /// offset of (0, 0) as the last point closes the polygon.
    pub fn send_draw_polygon(&self, object_id: u16, points: &[(i16, i16)]) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::DrawPolygon {
                points: points.to_vec(),
            },
        )
    }

    /// Draw text at the cursor using the bound font attributes.
    pub fn send_draw_text(&self, object_id: u16, transparent: bool, text: &str) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::DrawText {
                transparent,
                text: text.as_bytes().to_vec(),
            },
        )
    }

    /// Pan the viewport of the graphics context object.
    pub fn send_pan_viewport(&self, object_id: u16, x: i16, y: i16) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::PanViewport { x, y })
    }

    /// Zoom the viewport; `zoom` must lie in −32.0..=32.0.
    pub fn send_zoom_viewport(&self, object_id: u16, zoom: f32) -> bool {
        self.send_graphics(object_id, GraphicsContextCommand::ZoomViewport { zoom })
    }

    /// Pan and zoom in one command; `zoom` must lie in −32.0..=32.0.
    pub fn send_pan_and_zoom_viewport(&self, object_id: u16, x: i16, y: i16, zoom: f32) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::PanAndZoomViewport { x, y, zoom },
        )
    }

    pub fn send_change_viewport_size(&self, object_id: u16, width: u16, height: u16) -> bool {
        self.send_graphics(
            object_id,
            GraphicsContextCommand::ChangeViewportSize { width, height },
        )
    }

    /// Draw another VT object at the cursor position.
    pub fn send_draw_vt_object(&self, graphics_context_object_id: u16, object_id: u16) -> bool {
        self.send_graphics(
            graphics_context_object_id,
            GraphicsContextCommand::DrawVtObject { object_id },
        )
    }

    pub fn send_copy_canvas_to_picture_graphic(
        &self,
        graphics_context_object_id: u16,
        object_id: u16,
    ) -> bool {
        self.send_graphics(
            graphics_context_object_id,
            GraphicsContextCommand::CopyCanvasToPictureGraphic { object_id },
        )
    }

    pub fn send_copy_viewport_to_picture_graphic(
        &self,
        graphics_context_object_id: u16,
        object_id: u16,
    ) -> bool {
        self.send_graphics(
            graphics_context_object_id,
            GraphicsContextCommand::CopyViewportToPictureGraphic { object_id },
        )
    }

    // ── Submission plumbing ──────────────────────────────────────

    fn send_graphics(&self, object_id: u16, sub: GraphicsContextCommand) -> bool {
        self.send_command(Command::GraphicsContext { object_id, sub })
    }

    fn send_command(&self, command: Command) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.submit(&command)
    }

    /// Encode and hand to the network manager, routing through the
    /// transport protocol when the payload exceeds one frame.
    pub(crate) fn submit(&self, command: &Command) -> bool {
        let data = match command.encode() {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "refusing to send invalid command");
                return false;
            }
        };
        if Command::needs_transport(&data) {
            let total_size = data.len() as u32;
            let fetch: DataChunkCallback = Box::new(move |_invocation, offset, requested, out| {
                let start = offset as usize;
                let end = start + requested as usize;
                if end > data.len() || out.len() < requested as usize {
                    return false;
                }
                out[..requested as usize].copy_from_slice(&data[start..end]);
                true
            });
            self.network.send_transport(
                ECU_TO_VT_PGN,
                &self.source,
                Some(&self.partner),
                total_size,
                fetch,
                Box::new(|_| {}),
            )
        } else {
            self.network
                .send_frame(ECU_TO_VT_PGN, &self.source, Some(&self.partner), &data, None)
        }
    }
}

impl Drop for VirtualTerminalClient {
    fn drop(&mut self) {
        self.should_terminate.store(true, Ordering::SeqCst);
    }
}

/// Pools may be registered until the capability/upload sequence begins.
fn registration_open(state: ConnectionState) -> bool {
    matches!(
        state,
        ConnectionState::Disconnected
            | ConnectionState::WaitForPartnerVTStatus
            | ConnectionState::SendWorkingSetMaster
            | ConnectionState::ReadyForObjectPool
    )
}
