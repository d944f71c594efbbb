//! Integration tests — full connection lifecycle, capability handshake,
//! pool upload, heartbeat, and event dispatch against a mock network
//! manager with a manually driven clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use vtlink_core::{
    BusyFlags, CanMessage, ConnectionState, ControlFunction, DataChunkCallback, Event, FontSize,
    FontStyle, GraphicMode, HardwareFeatures, HideShowState, KeyActivationCode, KeyEvent,
    ManualClock, NetworkManager, RxHandler, TxCompleteCallback, VirtualTerminalClient, VtError,
    VtVersion, ECU_TO_VT_PGN, VT_TO_ECU_PGN, WORKING_SET_MASTER_PGN,
};

const VT_ADDRESS: u8 = 0x26;
const ECU_ADDRESS: u8 = 0x81;

// ── Mock network manager ─────────────────────────────────────────

struct PendingTransport {
    pgn: u32,
    total_size: u32,
    fetch: DataChunkCallback,
    on_complete: Option<TxCompleteCallback>,
}

#[derive(Default)]
struct MockNetwork {
    frames: Mutex<Vec<(u32, Vec<u8>)>>,
    transports: Mutex<Vec<PendingTransport>>,
    rx: Mutex<Option<RxHandler>>,
    reject_sends: AtomicBool,
}

impl MockNetwork {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn frames_on(&self, pgn: u32) -> Vec<Vec<u8>> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| *p == pgn)
            .map(|(_, data)| data.clone())
            .collect()
    }

    fn clear_frames(&self) {
        self.frames.lock().unwrap().clear();
    }

    fn take_transport(&self) -> Option<PendingTransport> {
        let mut transports = self.transports.lock().unwrap();
        if transports.is_empty() {
            None
        } else {
            Some(transports.remove(0))
        }
    }

    fn transport_count(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    fn set_reject_sends(&self, reject: bool) {
        self.reject_sends.store(reject, Ordering::SeqCst);
    }
}

impl NetworkManager for MockNetwork {
    fn send_frame(
        &self,
        pgn: u32,
        _source: &ControlFunction,
        _destination: Option<&ControlFunction>,
        payload: &[u8],
        _on_complete: Option<TxCompleteCallback>,
    ) -> bool {
        if self.reject_sends.load(Ordering::SeqCst) {
            return false;
        }
        self.frames.lock().unwrap().push((pgn, payload.to_vec()));
        true
    }

    fn send_transport(
        &self,
        pgn: u32,
        _source: &ControlFunction,
        _destination: Option<&ControlFunction>,
        total_size: u32,
        fetch: DataChunkCallback,
        on_complete: TxCompleteCallback,
    ) -> bool {
        if self.reject_sends.load(Ordering::SeqCst) {
            return false;
        }
        self.transports.lock().unwrap().push(PendingTransport {
            pgn,
            total_size,
            fetch,
            on_complete: Some(on_complete),
        });
        true
    }

    fn register_rx(&self, _pgn: u32, handler: RxHandler) {
        *self.rx.lock().unwrap() = Some(handler);
    }
}

// ── Harness ──────────────────────────────────────────────────────

struct Harness {
    network: Arc<MockNetwork>,
    clock: Arc<ManualClock>,
    client: Arc<VirtualTerminalClient>,
}

impl Harness {
    fn new() -> Self {
        let network = MockNetwork::new();
        let clock = Arc::new(ManualClock::new());
        let partner = Arc::new(ControlFunction::new(0xA002840000123456, VT_ADDRESS));
        let source = Arc::new(ControlFunction::new(0xA000840000654321, ECU_ADDRESS));
        let client = VirtualTerminalClient::with_clock(
            Arc::clone(&network) as Arc<dyn NetworkManager>,
            partner,
            source,
            Arc::clone(&clock) as Arc<dyn vtlink_core::Clock>,
        );
        Self {
            network,
            clock,
            client,
        }
    }

    fn inject(&self, event: Event) {
        self.client.process_rx_message(&CanMessage {
            pgn: VT_TO_ECU_PGN,
            source_address: VT_ADDRESS,
            destination_address: ECU_ADDRESS,
            data: event.encode().unwrap(),
        });
    }

    fn vt_status(&self) -> Event {
        Event::VtStatus {
            working_set_master_address: 0xFE,
            data_mask_object_id: 0xFFFF,
            soft_key_mask_object_id: 0xFFFF,
            busy_flags: BusyFlags::empty(),
            command_function: 0xFF,
        }
    }

    /// A few update ticks; enough to cross any chain of Send states.
    fn settle(&self) {
        for _ in 0..6 {
            self.client.update();
        }
    }

    /// Pull a pending transport dry the way the transport layer would
    /// (seven bytes per invocation) and complete it.
    fn pump_transport(&self, success: bool) -> Vec<u8> {
        let mut transport = self.network.take_transport().expect("no pending transport");
        assert_eq!(transport.pgn, ECU_TO_VT_PGN);
        let total = transport.total_size;
        let mut assembled = Vec::new();
        let mut offset = 0u32;
        let mut invocation = 0u32;
        while offset < total {
            let requested = (total - offset).min(7);
            let mut buffer = vec![0u8; requested as usize];
            assert!(
                (transport.fetch)(invocation, offset, requested, &mut buffer),
                "chunk fetch failed at offset {offset}"
            );
            assembled.extend_from_slice(&buffer);
            offset += requested;
            invocation += 1;
        }
        if let Some(complete) = transport.on_complete.take() {
            complete(success);
        }
        assembled
    }

    /// Drive the full handshake with canned responses up to Connected.
    fn connect(&self, pool: &[u8]) {
        assert!(self
            .client
            .set_object_pool(0, VtVersion::Version3, pool.to_vec()));
        self.client.initialize(false);
        self.settle();

        self.inject(self.vt_status());
        self.settle();
        assert_eq!(
            self.client.state(),
            ConnectionState::WaitForGetMemoryResponse
        );

        self.inject(Event::GetMemoryResponse {
            version: 4,
            enough_memory: true,
        });
        self.settle();
        self.inject(Event::GetNumberOfSoftkeysResponse {
            x_pixels: 60,
            y_pixels: 60,
            virtual_keys: 64,
            physical_keys: 10,
        });
        self.settle();
        self.inject(Event::GetTextFontDataResponse {
            small_sizes: 0b0000_0101,
            large_sizes: 0b0000_0001,
            styles: 0b0000_0001,
        });
        self.settle();
        self.inject(Event::GetHardwareResponse {
            boot_time_s: 0xFF,
            graphic_mode: GraphicMode::TwoHundredFiftySixColour,
            features: HardwareFeatures::TOUCHSCREEN_WITH_POINTING,
            x_pixels: 480,
            y_pixels: 480,
        });
        self.settle();
        assert_eq!(self.client.state(), ConnectionState::UploadObjectPool);

        let assembled = self.pump_transport(true);
        assert_eq!(assembled[0], 0x11);
        assert_eq!(&assembled[1..], pool);
        self.settle();
        assert_eq!(
            self.client.state(),
            ConnectionState::WaitForEndOfObjectPoolResponse
        );

        self.inject(Event::EndOfObjectPoolResponse {
            success: true,
            parent_object_id: 0,
            object_id: 0,
            error_codes: 0,
        });
        assert!(self.client.is_connected());
        self.network.clear_frames();
    }
}

// ── End-to-end handshake ─────────────────────────────────────────

#[test]
fn full_handshake_reaches_connected() {
    let h = Harness::new();
    assert!(h
        .client
        .set_object_pool(0, VtVersion::Version3, vec![0xA1, 0xB2, 0xC3]));
    h.client.initialize(false);
    assert!(h.client.is_initialized());
    assert_eq!(h.client.state(), ConnectionState::WaitForPartnerVTStatus);

    // First VT status starts the announcement.
    h.inject(h.vt_status());
    h.settle();

    let master_frames = h.network.frames_on(WORKING_SET_MASTER_PGN);
    assert_eq!(master_frames.len(), 1);
    assert_eq!(
        master_frames[0],
        vec![0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
    );

    // Get memory carries the aggregate pool size (3 bytes).
    let ecu_frames = h.network.frames_on(ECU_TO_VT_PGN);
    assert_eq!(
        ecu_frames.last().unwrap(),
        &vec![0xC0, 0xFF, 0x03, 0x00, 0x00, 0x00, 0xFF, 0xFF]
    );
    assert_eq!(h.client.state(), ConnectionState::WaitForGetMemoryResponse);

    h.inject(Event::GetMemoryResponse {
        version: 4,
        enough_memory: true,
    });
    h.settle();
    assert_eq!(
        h.network.frames_on(ECU_TO_VT_PGN).last().unwrap()[0],
        0xC2
    );

    h.inject(Event::GetNumberOfSoftkeysResponse {
        x_pixels: 60,
        y_pixels: 40,
        virtual_keys: 64,
        physical_keys: 12,
    });
    h.settle();
    assert_eq!(
        h.network.frames_on(ECU_TO_VT_PGN).last().unwrap()[0],
        0xC3
    );

    h.inject(Event::GetTextFontDataResponse {
        small_sizes: 0b0111_1111,
        large_sizes: 0b0000_0000,
        styles: 0b0000_0011,
    });
    h.settle();
    assert_eq!(
        h.network.frames_on(ECU_TO_VT_PGN).last().unwrap()[0],
        0xC7
    );

    h.inject(Event::GetHardwareResponse {
        boot_time_s: 10,
        graphic_mode: GraphicMode::SixteenColour,
        features: HardwareFeatures::POINTING_DEVICE_WITH_POINTING,
        x_pixels: 240,
        y_pixels: 200,
    });
    h.settle();

    // The pool streams through the transport with the multiplexor
    // prepended on the fly.
    let assembled = h.pump_transport(true);
    assert_eq!(assembled, vec![0x11, 0xA1, 0xB2, 0xC3]);
    h.settle();

    let end_of_pool = h.network.frames_on(ECU_TO_VT_PGN);
    assert_eq!(
        end_of_pool.last().unwrap(),
        &vec![0x12, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
    );

    h.inject(Event::EndOfObjectPoolResponse {
        success: true,
        parent_object_id: 0,
        object_id: 0,
        error_codes: 0,
    });
    assert!(h.client.is_connected());

    // Capability getters return exactly the injected handshake bytes.
    assert_eq!(h.client.connected_vt_version(), VtVersion::Version4);
    assert_eq!(h.client.softkey_x_axis_pixels(), 60);
    assert_eq!(h.client.softkey_y_axis_pixels(), 40);
    assert_eq!(h.client.number_virtual_softkeys(), 64);
    assert_eq!(h.client.number_physical_softkeys(), 12);
    assert!(h.client.font_size_supported(FontSize::Size6x8));
    assert!(!h.client.font_size_supported(FontSize::Size32x48));
    assert!(h.client.font_style_supported(FontStyle::Bold));
    assert!(h.client.font_style_supported(FontStyle::CrossedOut));
    assert!(!h.client.font_style_supported(FontStyle::Italic));
    assert_eq!(h.client.graphic_mode(), GraphicMode::SixteenColour);
    assert!(h
        .client
        .hardware_features()
        .contains(HardwareFeatures::POINTING_DEVICE_WITH_POINTING));
    assert_eq!(h.client.number_x_pixels(), 240);
    assert_eq!(h.client.number_y_pixels(), 200);
}

#[test]
fn rx_registration_delivers_through_network_manager() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);

    let handler = h.network.rx.lock().unwrap().clone().expect("rx registered");
    handler(&CanMessage {
        pgn: VT_TO_ECU_PGN,
        source_address: VT_ADDRESS,
        destination_address: ECU_ADDRESS,
        data: h.vt_status().encode().unwrap(),
    });
    h.settle();
    assert!(h.client.vt_status().is_some());
    assert_ne!(h.client.state(), ConnectionState::WaitForPartnerVTStatus);
}

#[test]
fn frames_from_other_sources_are_ignored() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);

    h.client.process_rx_message(&CanMessage {
        pgn: VT_TO_ECU_PGN,
        source_address: VT_ADDRESS.wrapping_add(1),
        destination_address: ECU_ADDRESS,
        data: h.vt_status().encode().unwrap(),
    });
    h.settle();
    assert_eq!(h.client.state(), ConnectionState::WaitForPartnerVTStatus);
}

// ── Failure paths ────────────────────────────────────────────────

#[test]
fn handshake_timeout_fails_the_machine() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();
    assert_eq!(h.client.state(), ConnectionState::WaitForGetMemoryResponse);

    h.clock.advance(vtlink_core::STATE_MACHINE_TIMEOUT_MS + 1);
    h.client.update();
    assert_eq!(h.client.state(), ConnectionState::Failed);
    assert!(matches!(
        h.client.last_error(),
        Some(VtError::ProtocolTimeout {
            state: ConnectionState::WaitForGetMemoryResponse
        })
    ));

    // Failed is terminal until re-initialization.
    h.clock.advance(10_000);
    h.settle();
    assert_eq!(h.client.state(), ConnectionState::Failed);
}

#[test]
fn insufficient_memory_fails_the_machine() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();

    h.inject(Event::GetMemoryResponse {
        version: 4,
        enough_memory: false,
    });
    assert_eq!(h.client.state(), ConnectionState::Failed);
    assert!(matches!(
        h.client.last_error(),
        Some(VtError::InsufficientMemory)
    ));
}

#[test]
fn rejected_end_of_pool_fails_the_machine() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();
    h.inject(Event::GetMemoryResponse {
        version: 3,
        enough_memory: true,
    });
    h.settle();
    h.inject(Event::GetNumberOfSoftkeysResponse {
        x_pixels: 60,
        y_pixels: 60,
        virtual_keys: 6,
        physical_keys: 6,
    });
    h.settle();
    h.inject(Event::GetTextFontDataResponse {
        small_sizes: 1,
        large_sizes: 0,
        styles: 0,
    });
    h.settle();
    h.inject(Event::GetHardwareResponse {
        boot_time_s: 0xFF,
        graphic_mode: GraphicMode::Monochrome,
        features: HardwareFeatures::empty(),
        x_pixels: 128,
        y_pixels: 64,
    });
    h.settle();
    h.pump_transport(true);
    h.settle();

    h.inject(Event::EndOfObjectPoolResponse {
        success: false,
        parent_object_id: 0x0001,
        object_id: 0x0002,
        error_codes: 0x04,
    });
    assert_eq!(h.client.state(), ConnectionState::Failed);
    assert!(matches!(
        h.client.last_error(),
        Some(VtError::EndOfObjectPoolRejected {
            object_id: 0x0002,
            ..
        })
    ));
}

#[test]
fn failed_upload_fails_the_machine() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();
    h.inject(Event::GetMemoryResponse {
        version: 3,
        enough_memory: true,
    });
    h.settle();
    h.inject(Event::GetNumberOfSoftkeysResponse {
        x_pixels: 60,
        y_pixels: 60,
        virtual_keys: 6,
        physical_keys: 6,
    });
    h.settle();
    h.inject(Event::GetTextFontDataResponse {
        small_sizes: 1,
        large_sizes: 0,
        styles: 0,
    });
    h.settle();
    h.inject(Event::GetHardwareResponse {
        boot_time_s: 0xFF,
        graphic_mode: GraphicMode::Monochrome,
        features: HardwareFeatures::empty(),
        x_pixels: 128,
        y_pixels: 64,
    });
    h.settle();

    // Transport reports failure.
    h.pump_transport(false);
    h.settle();
    assert_eq!(h.client.state(), ConnectionState::Failed);
    assert!(matches!(
        h.client.last_error(),
        Some(VtError::UploadAborted { pool_index: 0 })
    ));
}

// ── Pool registration rules ──────────────────────────────────────

#[test]
fn version_mismatch_blocks_in_ready_for_object_pool() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2]);
    h.client
        .set_object_pool(1, VtVersion::Version4, vec![3, 4]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();
    h.settle();
    assert_eq!(h.client.state(), ConnectionState::ReadyForObjectPool);
}

#[test]
fn late_pool_registration_is_rejected() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();
    assert_eq!(h.client.state(), ConnectionState::WaitForGetMemoryResponse);

    assert!(!h.client.set_object_pool(1, VtVersion::Version3, vec![9]));
    let fetch: DataChunkCallback = Box::new(|_, _, _, _| true);
    assert!(!h
        .client
        .register_object_pool_data_chunk_callback(1, VtVersion::Version3, 10, fetch));
}

#[test]
fn empty_pool_is_rejected() {
    let h = Harness::new();
    assert!(!h
        .client
        .set_object_pool(0, VtVersion::Version3, Vec::<u8>::new()));
    let fetch: DataChunkCallback = Box::new(|_, _, _, _| true);
    assert!(!h
        .client
        .register_object_pool_data_chunk_callback(0, VtVersion::Version3, 0, fetch));
}

#[test]
fn chunked_pool_uploads_through_callback() {
    let h = Harness::new();
    let pool: Vec<u8> = (0u8..40).collect();
    let backing = pool.clone();
    let fetch: DataChunkCallback = Box::new(move |_, offset, requested, out| {
        let start = offset as usize;
        let end = start + requested as usize;
        if end > backing.len() {
            return false;
        }
        out[..requested as usize].copy_from_slice(&backing[start..end]);
        true
    });
    assert!(h.client.register_object_pool_data_chunk_callback(
        0,
        VtVersion::Version3,
        pool.len() as u32,
        fetch
    ));

    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();
    // Aggregate size reflects the declared chunked size.
    let get_memory = h.network.frames_on(ECU_TO_VT_PGN).pop().unwrap();
    assert_eq!(get_memory[2], pool.len() as u8);

    h.inject(Event::GetMemoryResponse {
        version: 3,
        enough_memory: true,
    });
    h.settle();
    h.inject(Event::GetNumberOfSoftkeysResponse {
        x_pixels: 60,
        y_pixels: 60,
        virtual_keys: 6,
        physical_keys: 6,
    });
    h.settle();
    h.inject(Event::GetTextFontDataResponse {
        small_sizes: 1,
        large_sizes: 0,
        styles: 0,
    });
    h.settle();
    h.inject(Event::GetHardwareResponse {
        boot_time_s: 0xFF,
        graphic_mode: GraphicMode::Monochrome,
        features: HardwareFeatures::empty(),
        x_pixels: 128,
        y_pixels: 64,
    });
    h.settle();

    let assembled = h.pump_transport(true);
    assert_eq!(assembled[0], 0x11);
    assert_eq!(&assembled[1..], &pool[..]);
}

#[test]
fn multiple_pools_upload_in_index_order() {
    let h = Harness::new();
    h.client
        .set_object_pool(1, VtVersion::Version3, vec![0xBB; 4]);
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![0xAA; 3]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();

    // Aggregate memory request covers both pools.
    let get_memory = h.network.frames_on(ECU_TO_VT_PGN).pop().unwrap();
    assert_eq!(get_memory[2], 7);

    h.inject(Event::GetMemoryResponse {
        version: 3,
        enough_memory: true,
    });
    h.settle();
    h.inject(Event::GetNumberOfSoftkeysResponse {
        x_pixels: 60,
        y_pixels: 60,
        virtual_keys: 6,
        physical_keys: 6,
    });
    h.settle();
    h.inject(Event::GetTextFontDataResponse {
        small_sizes: 1,
        large_sizes: 0,
        styles: 0,
    });
    h.settle();
    h.inject(Event::GetHardwareResponse {
        boot_time_s: 0xFF,
        graphic_mode: GraphicMode::Monochrome,
        features: HardwareFeatures::empty(),
        x_pixels: 128,
        y_pixels: 64,
    });
    h.settle();

    // Pool 0 first.
    let first = h.pump_transport(true);
    assert_eq!(&first[1..], &[0xAA, 0xAA, 0xAA]);
    h.settle();
    let second = h.pump_transport(true);
    assert_eq!(&second[1..], &[0xBB, 0xBB, 0xBB, 0xBB]);
    h.settle();
    assert_eq!(
        h.client.state(),
        ConnectionState::WaitForEndOfObjectPoolResponse
    );
}

// ── Steady state ─────────────────────────────────────────────────

#[test]
fn maintenance_heartbeat_runs_on_schedule() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    // Keep the status fresh while time advances.
    h.clock.advance(1000);
    h.inject(h.vt_status());
    h.client.update();

    let frames = h.network.frames_on(ECU_TO_VT_PGN);
    let maintenance: Vec<_> = frames.iter().filter(|f| f[0] == 0xFF).collect();
    assert_eq!(maintenance.len(), 1);
    // First heartbeat carries the initiating bit and the declared version.
    assert_eq!(maintenance[0][1], 0x01);
    assert_eq!(maintenance[0][2], 0x03);

    // No second heartbeat until the cadence elapses.
    h.client.update();
    let count = h
        .network
        .frames_on(ECU_TO_VT_PGN)
        .iter()
        .filter(|f| f[0] == 0xFF)
        .count();
    assert_eq!(count, 1);

    h.clock.advance(1000);
    h.inject(h.vt_status());
    h.client.update();
    let frames = h.network.frames_on(ECU_TO_VT_PGN);
    let maintenance: Vec<_> = frames.iter().filter(|f| f[0] == 0xFF).collect();
    assert_eq!(maintenance.len(), 2);
    // Subsequent heartbeats clear the initiating bit.
    assert_eq!(maintenance[1][1], 0x00);
}

#[test]
fn failed_maintenance_send_is_retried_next_tick() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    h.clock.advance(1000);
    h.inject(h.vt_status());
    h.network.set_reject_sends(true);
    h.client.update();
    assert!(h.network.frames_on(ECU_TO_VT_PGN).is_empty());

    // The retry flag drains on the next tick even though the cadence
    // has not elapsed again.
    h.network.set_reject_sends(false);
    h.client.update();
    let maintenance = h
        .network
        .frames_on(ECU_TO_VT_PGN)
        .iter()
        .filter(|f| f[0] == 0xFF)
        .count();
    assert_eq!(maintenance, 1);
}

#[test]
fn status_silence_disconnects_and_rehandshakes() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    h.clock.advance(vtlink_core::VT_STATUS_TIMEOUT_MS + 1);
    h.client.update();
    assert_eq!(h.client.state(), ConnectionState::Disconnected);

    // Next tick re-enters the handshake and waits for a server again.
    h.client.update();
    assert_eq!(h.client.state(), ConnectionState::WaitForPartnerVTStatus);
    // The old capability record is gone.
    assert_eq!(h.client.number_physical_softkeys(), 0);

    // A returning server triggers a full re-handshake including a fresh
    // pool upload.
    h.inject(h.vt_status());
    h.settle();
    h.inject(Event::GetMemoryResponse {
        version: 4,
        enough_memory: true,
    });
    h.settle();
    h.inject(Event::GetNumberOfSoftkeysResponse {
        x_pixels: 60,
        y_pixels: 60,
        virtual_keys: 6,
        physical_keys: 8,
    });
    h.settle();
    h.inject(Event::GetTextFontDataResponse {
        small_sizes: 1,
        large_sizes: 0,
        styles: 0,
    });
    h.settle();
    h.inject(Event::GetHardwareResponse {
        boot_time_s: 0xFF,
        graphic_mode: GraphicMode::Monochrome,
        features: HardwareFeatures::empty(),
        x_pixels: 128,
        y_pixels: 64,
    });
    h.settle();
    let assembled = h.pump_transport(true);
    assert_eq!(assembled, vec![0x11, 1, 2, 3]);
    h.settle();
    h.inject(Event::EndOfObjectPoolResponse {
        success: true,
        parent_object_id: 0,
        object_id: 0,
        error_codes: 0,
    });
    assert!(h.client.is_connected());
    assert_eq!(h.client.number_physical_softkeys(), 8);
}

#[test]
fn vt_status_snapshot_tracks_the_last_message() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    h.inject(Event::VtStatus {
        working_set_master_address: ECU_ADDRESS,
        data_mask_object_id: 1000,
        soft_key_mask_object_id: 2000,
        busy_flags: BusyFlags::PARSING_OBJECT_POOL,
        command_function: 0xA8,
    });
    let status = h.client.vt_status().expect("status seen");
    assert_eq!(status.active_working_set_master_address, ECU_ADDRESS);
    assert_eq!(status.active_data_mask_id, 1000);
    assert_eq!(status.active_softkey_mask_id, 2000);
    assert!(status.busy_flags.contains(BusyFlags::PARSING_OBJECT_POOL));
    assert_eq!(status.current_command_function, 0xA8);
}

// ── Command facade ───────────────────────────────────────────────

#[test]
fn commands_require_connected() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);

    assert!(!h
        .client
        .send_hide_show_object(0x1234, HideShowState::ShowObject));
    assert!(h.network.frames_on(ECU_TO_VT_PGN).is_empty());
}

#[test]
fn connected_commands_hit_the_wire() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    assert!(h
        .client
        .send_hide_show_object(0x1234, HideShowState::ShowObject));
    assert!(h.client.send_change_numeric_value(0x00AB, 0x0000FFFF));
    assert!(h.client.send_change_string_value(0x0030, "HI"));
    assert!(h.client.send_zoom_viewport(0x0040, 2.0));

    let frames = h.network.frames_on(ECU_TO_VT_PGN);
    assert_eq!(
        frames,
        vec![
            vec![0xA0, 0x34, 0x12, 0x01, 0xFF, 0xFF, 0xFF, 0xFF],
            vec![0xA8, 0xAB, 0x00, 0xFF, 0xFF, 0xFF, 0x00, 0x00],
            vec![0xB3, 0x30, 0x00, 0x02, 0x00, 0x48, 0x49, 0x00],
            vec![0xB8, 0x40, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x40],
        ]
    );
}

#[test]
fn invalid_zoom_returns_false_without_sending() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    assert!(!h.client.send_zoom_viewport(0x0040, 40.0));
    assert!(h.network.frames_on(ECU_TO_VT_PGN).is_empty());
    assert!(h.client.is_connected());
}

#[test]
fn long_command_routes_through_transport() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    assert!(h.client.send_change_child_position(0x0010, 0x0020, 300, 400));
    assert_eq!(h.network.transport_count(), 1);
    let payload = h.pump_transport(true);
    assert_eq!(payload[0], 0xB4);
    assert_eq!(payload.len(), 9);
}

#[test]
fn command_rejection_surfaces_as_false() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    h.network.set_reject_sends(true);
    assert!(!h
        .client
        .send_hide_show_object(0x1234, HideShowState::ShowObject));
}

// ── Event dispatch ───────────────────────────────────────────────

#[test]
fn dispatch_order_matches_registration_order() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b", "c"] {
        let order = Arc::clone(&order);
        h.client.register_button_event_callback(move |_| {
            order.lock().unwrap().push(tag);
        });
    }

    h.inject(Event::ButtonActivation(KeyEvent {
        activation: KeyActivationCode::ButtonPressedOrLatched,
        object_id: 100,
        parent_object_id: 1000,
        key_number: 1,
    }));
    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn all_four_event_kinds_dispatch() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    let soft_key = Arc::new(AtomicBool::new(false));
    let button = Arc::new(AtomicBool::new(false));
    let pointing = Arc::new(AtomicBool::new(false));
    let select = Arc::new(AtomicBool::new(false));

    {
        let hit = Arc::clone(&soft_key);
        h.client.register_soft_key_event_callback(move |event| {
            assert_eq!(event.key_number, 4);
            hit.store(true, Ordering::SeqCst);
        });
    }
    {
        let hit = Arc::clone(&button);
        h.client
            .register_button_event_callback(move |_| hit.store(true, Ordering::SeqCst));
    }
    {
        let hit = Arc::clone(&pointing);
        h.client.register_pointing_event_callback(move |event| {
            // Old servers omit the touch state; presses are assumed.
            assert_eq!(event.activation, KeyActivationCode::ButtonPressedOrLatched);
            assert_eq!((event.x, event.y), (120, 80));
            hit.store(true, Ordering::SeqCst);
        });
    }
    {
        let hit = Arc::clone(&select);
        h.client
            .register_select_input_object_event_callback(move |event| {
                assert!(event.selected);
                assert!(event.open_for_input);
                hit.store(true, Ordering::SeqCst);
            });
    }

    h.inject(Event::SoftKeyActivation(KeyEvent {
        activation: KeyActivationCode::ButtonPressedOrLatched,
        object_id: 1,
        parent_object_id: 2,
        key_number: 4,
    }));
    h.inject(Event::ButtonActivation(KeyEvent {
        activation: KeyActivationCode::ButtonUnlatchedOrReleased,
        object_id: 3,
        parent_object_id: 4,
        key_number: 5,
    }));
    h.inject(Event::Pointing {
        x: 120,
        y: 80,
        touch_state: None,
    });
    h.inject(Event::SelectInputObject(vtlink_core::SelectInputEvent {
        object_id: 9,
        selected: true,
        open_for_input: true,
    }));

    assert!(soft_key.load(Ordering::SeqCst));
    assert!(button.load(Ordering::SeqCst));
    assert!(pointing.load(Ordering::SeqCst));
    assert!(select.load(Ordering::SeqCst));
}

#[test]
fn handlers_can_send_follow_up_commands() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    let weak: Weak<VirtualTerminalClient> = Arc::downgrade(&h.client);
    h.client.register_button_event_callback(move |event| {
        if let Some(client) = weak.upgrade() {
            assert!(client.send_change_numeric_value(event.object_id, 1));
        }
    });

    h.inject(Event::ButtonActivation(KeyEvent {
        activation: KeyActivationCode::ButtonPressedOrLatched,
        object_id: 0x00AB,
        parent_object_id: 1000,
        key_number: 1,
    }));

    let frames = h.network.frames_on(ECU_TO_VT_PGN);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0][0], 0xA8);
}

#[test]
fn removed_handler_stops_receiving() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    let count = Arc::new(Mutex::new(0u32));
    let id = {
        let count = Arc::clone(&count);
        h.client
            .register_soft_key_event_callback(move |_| *count.lock().unwrap() += 1)
    };

    let event = Event::SoftKeyActivation(KeyEvent {
        activation: KeyActivationCode::ButtonPressedOrLatched,
        object_id: 1,
        parent_object_id: 2,
        key_number: 1,
    });
    h.inject(event.clone());
    assert!(h.client.remove_soft_key_event_callback(id));
    h.inject(event);
    assert_eq!(*count.lock().unwrap(), 1);
}

// ── Termination ──────────────────────────────────────────────────

#[test]
fn terminate_is_idempotent_and_stops_updates() {
    let h = Harness::new();
    h.connect(&[1, 2, 3]);

    h.client.terminate();
    assert!(!h.client.is_initialized());
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    h.client.terminate();

    // Updates are no-ops after terminate.
    h.clock.advance(10_000);
    h.settle();
    assert_eq!(h.client.state(), ConnectionState::Disconnected);

    // Re-initialization restarts the handshake.
    h.client.initialize(false);
    assert_eq!(h.client.state(), ConnectionState::WaitForPartnerVTStatus);
}

#[test]
fn late_transport_completion_after_terminate_is_tolerated() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(false);
    h.inject(h.vt_status());
    h.settle();
    h.inject(Event::GetMemoryResponse {
        version: 3,
        enough_memory: true,
    });
    h.settle();
    h.inject(Event::GetNumberOfSoftkeysResponse {
        x_pixels: 60,
        y_pixels: 60,
        virtual_keys: 6,
        physical_keys: 6,
    });
    h.settle();
    h.inject(Event::GetTextFontDataResponse {
        small_sizes: 1,
        large_sizes: 0,
        styles: 0,
    });
    h.settle();
    h.inject(Event::GetHardwareResponse {
        boot_time_s: 0xFF,
        graphic_mode: GraphicMode::Monochrome,
        features: HardwareFeatures::empty(),
        x_pixels: 128,
        y_pixels: 64,
    });
    h.settle();

    h.client.terminate();
    // The pending completion fires afterwards and must be a no-op.
    h.pump_transport(true);
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
}

#[test]
fn worker_thread_drives_the_handshake() {
    let h = Harness::new();
    h.client
        .set_object_pool(0, VtVersion::Version3, vec![1, 2, 3]);
    h.client.initialize(true);
    h.inject(h.vt_status());

    // The internal thread ticks every 50 ms of real time.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while h.client.state() != ConnectionState::WaitForGetMemoryResponse {
        assert!(
            std::time::Instant::now() < deadline,
            "worker thread made no progress"
        );
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    h.client.terminate();
    assert!(!h.client.is_initialized());
}
