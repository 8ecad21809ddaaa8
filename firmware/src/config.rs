pub const UART_BAUDRATE: u32 = 57_600; // Modem link baud rate

pub const UART_RX_BUFFER_SIZE: usize = 256; // Interrupt-drained RX buffer
pub const UART_TX_BUFFER_SIZE: usize = 256; // Holds at least one full frame

// Bytes buffered between the UART reader and the frame decoder. Sized for
// several maximum-length frames arriving back to back.
pub const RX_RING_CAPACITY: usize = 512;

pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const FLASH_ERASE_BLOCK_SIZE: usize = 4096;

// Start of the staging partition, see memory.x. For diagnostics only; the
// partition geometry itself comes from the linker file.
pub const DFU_REGION_ADDRESS: u32 = 0x1008_7000;

// Update proposals carry `<product-tag>/<build-number>` as app data.
pub const DFU_PRODUCT_TAG: &str = "meshbridge";
pub const BUILD_NUMBER: &str = "0.1.0";

pub const FIRMWARE_MARK_BOOTED_DELAY_MS: u32 = 30_000; // Delay before marking firmware as booted
