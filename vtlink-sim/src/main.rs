//! vtlink-sim — run a VT client against a scripted in-process server.
//!
//! No CAN hardware involved: a loopback "bus" carries frames between the
//! client and a minimal VT server that answers the capability handshake,
//! swallows the object pool, and acknowledges it. Once the client reports
//! Connected, the sim issues a handful of display commands and fires a
//! synthetic button press back at the client.
//!
//! ```text
//! vtlink-sim                      Default 512-byte demo pool
//! vtlink-sim --pool-size 40960   Bigger pool (more transport chunks)
//! vtlink-sim --server-memory 256 Force the insufficient-memory path
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vtlink_core::{
    BusyFlags, CanMessage, Command, ControlFunction, DataChunkCallback, Event, GraphicMode,
    HardwareFeatures, HideShowState, KeyActivationCode, KeyEvent, NetworkManager, RxHandler,
    TxCompleteCallback, VirtualTerminalClient, VtVersion, ECU_TO_VT_PGN, VT_TO_ECU_PGN,
};

const VT_ADDRESS: u8 = 0x26;
const ECU_ADDRESS: u8 = 0x81;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "vtlink-sim", about = "Drive a VT client against a scripted server")]
struct Cli {
    /// Size of the generated demo object pool in bytes.
    #[arg(long, default_value = "512")]
    pool_size: u32,

    /// Object pool memory the simulated server claims to have.
    #[arg(long, default_value = "1048576")]
    server_memory: u32,

    /// Give up if the client has not connected after this many seconds.
    #[arg(long, default_value = "10")]
    timeout_s: u64,
}

// ── Loopback bus ─────────────────────────────────────────────────

struct PendingTransport {
    total_size: u32,
    fetch: DataChunkCallback,
    on_complete: TxCompleteCallback,
}

/// Carries frames between the client and the scripted server.
///
/// Client sends are queued and only handed to the server from
/// [`SimBus::deliver`], outside the client's lock, so server responses can
/// re-enter the client safely.
#[derive(Default)]
struct SimBus {
    rx: Mutex<Option<RxHandler>>,
    to_server: Mutex<VecDeque<Vec<u8>>>,
    transports: Mutex<Vec<PendingTransport>>,
}

impl NetworkManager for SimBus {
    fn send_frame(
        &self,
        pgn: u32,
        _source: &ControlFunction,
        _destination: Option<&ControlFunction>,
        payload: &[u8],
        _on_complete: Option<TxCompleteCallback>,
    ) -> bool {
        if pgn == ECU_TO_VT_PGN {
            self.to_server.lock().unwrap().push_back(payload.to_vec());
        }
        // Broadcasts (working set master) have no listener in the sim.
        true
    }

    fn send_transport(
        &self,
        _pgn: u32,
        _source: &ControlFunction,
        _destination: Option<&ControlFunction>,
        total_size: u32,
        fetch: DataChunkCallback,
        on_complete: TxCompleteCallback,
    ) -> bool {
        self.transports.lock().unwrap().push(PendingTransport {
            total_size,
            fetch,
            on_complete,
        });
        true
    }

    fn register_rx(&self, _pgn: u32, handler: RxHandler) {
        *self.rx.lock().unwrap() = Some(handler);
    }
}

impl SimBus {
    /// Move queued traffic: assemble pending transports, let the server
    /// process everything, and push its responses back to the client.
    fn deliver(&self, server: &mut VtServer) {
        let transports = std::mem::take(&mut *self.transports.lock().unwrap());
        for mut transport in transports {
            let mut payload = Vec::with_capacity(transport.total_size as usize);
            let mut offset = 0u32;
            let mut invocation = 0u32;
            let mut ok = true;
            while offset < transport.total_size {
                let requested = (transport.total_size - offset).min(7);
                let mut buffer = vec![0u8; requested as usize];
                if !(transport.fetch)(invocation, offset, requested, &mut buffer) {
                    ok = false;
                    break;
                }
                payload.extend_from_slice(&buffer);
                offset += requested;
                invocation += 1;
            }
            (transport.on_complete)(ok);
            if ok {
                for response in server.receive(&payload) {
                    self.to_client(response);
                }
            }
        }

        loop {
            let Some(frame) = self.to_server.lock().unwrap().pop_front() else {
                break;
            };
            for response in server.receive(&frame) {
                self.to_client(response);
            }
        }
    }

    fn to_client(&self, data: Vec<u8>) {
        let handler = self.rx.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(&CanMessage {
                pgn: VT_TO_ECU_PGN,
                source_address: VT_ADDRESS,
                destination_address: ECU_ADDRESS,
                data,
            });
        }
    }
}

// ── Scripted server ──────────────────────────────────────────────

struct VtServer {
    memory_bytes: u32,
    pool: Vec<u8>,
    maintenance_seen: u32,
    commands_seen: u32,
}

impl VtServer {
    fn new(memory_bytes: u32) -> Self {
        Self {
            memory_bytes,
            pool: Vec::new(),
            maintenance_seen: 0,
            commands_seen: 0,
        }
    }

    fn status(&self) -> Vec<u8> {
        let status = Event::VtStatus {
            working_set_master_address: ECU_ADDRESS,
            data_mask_object_id: 0xFFFF,
            soft_key_mask_object_id: 0xFFFF,
            busy_flags: BusyFlags::empty(),
            command_function: 0xFF,
        };
        status.encode().expect("status frame")
    }

    /// Process one client message and produce zero or more responses.
    fn receive(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let command = match Command::decode(data) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "server could not parse client message");
                return Vec::new();
            }
        };

        let response = match command {
            Command::GetMemory { required_bytes } => {
                info!(required_bytes, "server: get memory");
                Some(Event::GetMemoryResponse {
                    version: 4,
                    enough_memory: required_bytes <= self.memory_bytes,
                })
            }
            Command::GetNumberOfSoftkeys => Some(Event::GetNumberOfSoftkeysResponse {
                x_pixels: 60,
                y_pixels: 60,
                virtual_keys: 64,
                physical_keys: 12,
            }),
            Command::GetTextFontData => Some(Event::GetTextFontDataResponse {
                small_sizes: 0x7F,
                large_sizes: 0x7F,
                styles: 0x0F,
            }),
            Command::GetHardware => Some(Event::GetHardwareResponse {
                boot_time_s: 0xFF,
                graphic_mode: GraphicMode::TwoHundredFiftySixColour,
                features: HardwareFeatures::TOUCHSCREEN_WITH_POINTING
                    | HardwareFeatures::ADJUSTABLE_VOLUME,
                x_pixels: 480,
                y_pixels: 480,
            }),
            Command::ObjectPoolTransfer { data } => {
                info!(bytes = data.len(), "server: received object pool");
                self.pool = data;
                None
            }
            Command::EndOfObjectPool => Some(Event::EndOfObjectPoolResponse {
                success: !self.pool.is_empty(),
                parent_object_id: 0,
                object_id: 0,
                error_codes: 0,
            }),
            Command::WorkingSetMaintenance { initializing, .. } => {
                self.maintenance_seen += 1;
                if initializing {
                    info!("server: working set maintenance (initiating)");
                }
                None
            }
            other => {
                self.commands_seen += 1;
                info!(command = ?other, "server: command received");
                None
            }
        };

        response
            .map(|event| vec![event.encode().expect("response frame")])
            .unwrap_or_default()
    }
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let bus = Arc::new(SimBus::default());
    let mut server = VtServer::new(cli.server_memory);

    let partner = Arc::new(ControlFunction::new(0xA002840000123456, VT_ADDRESS));
    let source = Arc::new(ControlFunction::new(0xA000840000654321, ECU_ADDRESS));
    let client = VirtualTerminalClient::new(
        Arc::clone(&bus) as Arc<dyn NetworkManager>,
        partner,
        source,
    );

    // A demo pool: opaque bytes as far as the client is concerned.
    let pool: Vec<u8> = (0..cli.pool_size).map(|i| (i % 251) as u8).collect();
    client.set_object_pool(0, VtVersion::Version3, pool);

    client.register_button_event_callback(|event: &KeyEvent| {
        info!(
            object_id = event.object_id,
            activation = ?event.activation,
            "client: button event"
        );
    });
    client.register_soft_key_event_callback(|event: &KeyEvent| {
        info!(object_id = event.object_id, key = event.key_number, "client: soft key event");
    });

    client.initialize(false);
    info!(pool_size = cli.pool_size, "client initialized; starting handshake");

    let deadline = Instant::now() + Duration::from_secs(cli.timeout_s);
    while !client.is_connected() {
        if Instant::now() > deadline {
            warn!(last_error = ?client.last_error(), state = %client.state(), "did not connect");
            std::process::exit(1);
        }
        bus.to_client(server.status());
        client.update();
        bus.deliver(&mut server);
        std::thread::sleep(Duration::from_millis(10));
    }

    info!(
        version = ?client.connected_vt_version(),
        softkeys = client.number_physical_softkeys(),
        screen_x = client.number_x_pixels(),
        screen_y = client.number_y_pixels(),
        "connected"
    );

    // A few display commands; the server logs each as it arrives.
    client.send_hide_show_object(1000, HideShowState::ShowObject);
    client.send_change_numeric_value(1200, 5400);
    client.send_change_string_value(1201, "READY");
    client.send_zoom_viewport(1300, 2.0);
    bus.deliver(&mut server);

    // The "user" presses a button on the terminal.
    let press = Event::ButtonActivation(KeyEvent {
        activation: KeyActivationCode::ButtonPressedOrLatched,
        object_id: 1000,
        parent_object_id: 0xFFFF,
        key_number: 1,
    });
    bus.to_client(press.encode().expect("button frame"));

    // Let a couple of maintenance heartbeats through before shutdown.
    let settle_until = Instant::now() + Duration::from_millis(2500);
    while Instant::now() < settle_until {
        bus.to_client(server.status());
        client.update();
        bus.deliver(&mut server);
        std::thread::sleep(Duration::from_millis(50));
    }

    client.terminate();
    info!(
        commands = server.commands_seen,
        heartbeats = server.maintenance_seen,
        "simulation complete"
    );
}
