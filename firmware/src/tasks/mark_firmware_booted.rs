use defmt::{error, info};
use embassy_time::{Duration, Timer};

use crate::{config, flash_bank::FlashMutex};

#[embassy_executor::task]
pub async fn mark_firmware_booted_task(flash: &'static FlashMutex) {
    // Give a freshly swapped image time to prove itself before telling the
    // bootloader to keep it. A crash before this point reverts on next boot.
    Timer::after(Duration::from_millis(
        config::FIRMWARE_MARK_BOOTED_DELAY_MS as u64,
    ))
    .await;

    let config = embassy_boot_rp::FirmwareUpdaterConfig::from_linkerfile_blocking(flash, flash);
    let mut aligned = embassy_boot_rp::AlignedBuffer([0; 4]);
    let mut updater = embassy_boot_rp::BlockingFirmwareUpdater::new(config, &mut aligned.0);

    match updater.get_state() {
        Ok(embassy_boot_rp::State::Swap) => {
            info!("marking swapped firmware as booted");
            if let Err(e) = updater.mark_booted() {
                error!(
                    "failed to mark firmware as booted: {:?}",
                    defmt::Debug2Format(&e)
                );
            }
        }
        Ok(_) => {}
        Err(e) => error!(
            "failed to read bootloader state: {:?}",
            defmt::Debug2Format(&e)
        ),
    }
}
