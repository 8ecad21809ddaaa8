#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_sync::blocking_mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

mod config;
mod flash_bank;
mod tasks;

use flash_bank::{FlashMutex, FlashType};

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

static FLASH: StaticCell<FlashMutex> = StaticCell::new();
static UART_TX_BUF: StaticCell<[u8; config::UART_TX_BUFFER_SIZE]> = StaticCell::new();
static UART_RX_BUF: StaticCell<[u8; config::UART_RX_BUFFER_SIZE]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    info!("meshbridge {} starting", config::BUILD_NUMBER);

    let flash: FlashType = embassy_rp::flash::Flash::new_blocking(p.FLASH);
    let flash = FLASH.init(Mutex::new(RefCell::new(flash)));

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config::UART_BAUDRATE;
    let tx_buf = &mut UART_TX_BUF.init([0; config::UART_TX_BUFFER_SIZE])[..];
    let rx_buf = &mut UART_RX_BUF.init([0; config::UART_RX_BUFFER_SIZE])[..];
    let uart = BufferedUart::new(p.UART0, p.PIN_0, p.PIN_1, Irqs, tx_buf, rx_buf, uart_config);
    let (tx, rx) = uart.split();

    spawner
        .spawn(tasks::uart_link::uart_link_task(rx, tx, flash))
        .unwrap();

    spawner
        .spawn(tasks::mark_firmware_booted::mark_firmware_booted_task(
            flash,
        ))
        .unwrap();
}
