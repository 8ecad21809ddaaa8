pub mod mark_firmware_booted;
pub mod mesh;
pub mod uart_link;
