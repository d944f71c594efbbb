//! Client for an ISOBUS virtual terminal (VT) display, per ISO 11783-6.
//!
//! The client attaches to a VT server on the bus, negotiates capabilities,
//! uploads one or more binary object pools, and then mediates runtime
//! interaction in both directions: the application issues display
//! commands (show/hide, numeric/string values, graphics context drawing)
//! and receives soft key, button, pointing, and input-selection events.
//!
//! The CAN stack itself is external; see [`network::NetworkManager`] for
//! the seam this crate consumes.
//!
//! ```no_run
//! use std::sync::Arc;
//! use vtlink_core::{ControlFunction, HideShowState, VirtualTerminalClient, VtVersion};
//! # fn network_manager() -> Arc<dyn vtlink_core::NetworkManager> { unimplemented!() }
//!
//! let partner = Arc::new(ControlFunction::new(0xA00284000F123456, 0x26));
//! let source = Arc::new(ControlFunction::new(0xA00084000F654321, 0x81));
//! let client = VirtualTerminalClient::new(network_manager(), partner, source);
//!
//! client.set_object_pool(0, VtVersion::Version3, std::fs::read("pool.iop").unwrap());
//! client.register_button_event_callback(|event| {
//!     println!("button {} -> {:?}", event.object_id, event.activation);
//! });
//! client.initialize(true);
//! // ... once connected:
//! client.send_hide_show_object(1000, HideShowState::ShowObject);
//! ```

mod capabilities;
mod client;
mod codec;
mod dispatch;
mod error;
mod function;
mod network;
mod pool;
mod state;
mod status;
mod time;
mod types;

pub use capabilities::{Capabilities, HardwareFeatures};
pub use client::{
    VirtualTerminalClient, STATE_MACHINE_TIMEOUT_MS, VT_STATUS_TIMEOUT_MS,
    WORKING_SET_MAINTENANCE_TIMEOUT_MS,
};
pub use codec::{Command, Event, GraphicsContextCommand, KeyEvent, PointingEvent, SelectInputEvent};
pub use dispatch::SubscriptionId;
pub use error::VtError;
pub use function::{Function, GraphicsContextSubCommand};
pub use network::{
    CanMessage, ControlFunction, DataChunkCallback, NetworkManager, RxHandler,
    TxCompleteCallback, ECU_TO_VT_PGN, GLOBAL_ADDRESS, VT_TO_ECU_PGN, WORKING_SET_MASTER_PGN,
};
pub use state::ConnectionState;
pub use status::{BusyFlags, VtStatus};
pub use time::{Clock, ManualClock, MonotonicClock};
pub use types::{
    AlarmMaskPriority, EnableDisableState, FillType, FontSize, FontStyle, GraphicMode,
    HideShowState, KeyActivationCode, LineDirection, MaskLockState, MaskType, SelectInputOption,
    VtVersion, NULL_OBJECT_ID,
};
