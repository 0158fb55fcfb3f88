//! Serial command protocol.
//!
//! Newline-delimited JSON over the UART.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      RPC Stack                             │
//! │                                                            │
//! │  ┌───────────┐  ┌──────────┐  ┌────────┐  ┌────────────┐  │
//! │  │ RX bytes  │─▶│  Codec   │─▶│ Queue  │─▶│  Engine    │  │
//! │  │ (UART cb) │  │ (lines)  │  │(embassy)│ │ → Router   │  │
//! │  └───────────┘  └──────────┘  └────────┘  └─────┬──────┘  │
//! │       ▲                                         │         │
//! │       │            ┌──────────┐                 │         │
//! │       └────────────│  Wire    │◀────────────────┘         │
//! │        TX (UART)   │ (encode) │◀── alarm events           │
//! │                    └──────────┘                           │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod codec;
pub mod command;
pub mod engine;
pub mod router;
pub mod wire;
