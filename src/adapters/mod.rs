//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements         | Connects to                   |
//! |------------------|--------------------|-------------------------------|
//! | `device_id`      | (identity source)  | eFuse factory MAC             |
//! | `display`        | StatusSurface      | SSD1306 OLED over I2C         |
//! | `http_transport` | TelemetryTransport | ESP-IDF HTTP(S) client        |
//! | `log_sink`       | EventSink          | Serial log output             |
//! | `nvs`            | StoragePort        | NVS / in-memory store         |
//! | `portal_server`  | PortalPort         | ESP-IDF httpd                 |
//! | `system`         | SystemPort         | `esp_restart()`               |
//! | `time`           | Clock, DelayNs     | ESP32 system timer / FreeRTOS |
//! | `wifi`           | RadioPort          | ESP-IDF WiFi (AP + STA)       |

pub mod device_id;
pub mod display;
pub mod http_transport;
pub mod log_sink;
pub mod nvs;
pub mod portal_server;
pub mod system;
pub mod time;
pub mod wifi;
