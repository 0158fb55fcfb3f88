//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | LightPort          | ESP32 LEDC, ADC1         |
//! | `uart`         | SerialPort         | ESP-IDF UART driver      |
//! | `rpc_adapter`  | EventSink          | Alarm event frames (UART)|
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `nvs`          | StoragePort        | NVS / in-memory store    |
//! | `error_log`    | ErrorLogPort       | Ring buffer over storage |
//! | `time`         | Clock, SystemPort  | ESP32 system timer       |

pub mod error_log;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod rpc_adapter;
pub mod time;
pub mod uart;
