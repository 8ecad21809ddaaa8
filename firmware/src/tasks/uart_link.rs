//! The serial link to the modem: received bytes go UART -> ring buffer ->
//! frame decoder -> dispatch. DFU commands drive the update engine, pings
//! are answered in place, everything else goes to the mesh collaborator.

use defmt::{debug, info, warn};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io::Write;
use embedded_io_async::Read;
use meshbridge_dfu::{DfuEngine, FirmwareIdentity};
use meshbridge_protocol::{
    encode_frame, poll_frame, Frame, FrameDecoder, FrameSink, Opcode, RingBuffer,
};

use crate::config;
use crate::flash_bank::{DfuFlashBank, FlashMutex};
use crate::tasks::mesh;

/// Frame transmitter over the buffered TX half. The buffered writer hands
/// bytes to an interrupt-drained buffer, so `send` returns quickly unless
/// the link is badly backlogged.
pub struct UartSink {
    tx: BufferedUartTx,
}

impl FrameSink for UartSink {
    fn send(&mut self, command: Opcode, payload: &[u8]) {
        match encode_frame(command as u8, payload) {
            Ok(frame) => {
                if let Err(e) = self.tx.write_all(&frame) {
                    warn!("uart tx failed: {}", e);
                }
            }
            Err(_) => warn!("oversized payload for {}", command),
        }
    }
}

#[embassy_executor::task]
pub async fn uart_link_task(
    mut rx: BufferedUartRx,
    tx: BufferedUartTx,
    flash: &'static FlashMutex,
) -> ! {
    let identity = FirmwareIdentity {
        product: config::DFU_PRODUCT_TAG,
        build: config::BUILD_NUMBER,
    };
    let mut engine = DfuEngine::new(DfuFlashBank::new(flash), identity);
    let mut sink = UartSink { tx };

    let mut ring: RingBuffer<{ config::RX_RING_CAPACITY }> = RingBuffer::new();
    let mut decoder = FrameDecoder::new();

    info!(
        "modem link up, staging region {=u32:#x} ({} bytes)",
        engine.region_address(),
        engine.region_size()
    );

    // Detect a transfer left dangling across a reset on either side.
    engine.send_state_check(&mut sink);

    let mut chunk = [0u8; 64];
    loop {
        match rx.read(&mut chunk).await {
            Ok(0) => {}
            Ok(n) => {
                if !ring.queue(&chunk[..n]) {
                    warn!("rx ring full, dropping {} bytes", n);
                }
                while let Some(frame) = poll_frame(&mut ring, &mut decoder) {
                    dispatch(&frame, &mut engine, &mut sink);
                }
            }
            Err(e) => warn!("uart rx error: {}", e),
        }
    }
}

fn dispatch(frame: &Frame, engine: &mut DfuEngine<DfuFlashBank>, sink: &mut UartSink) {
    let Some(opcode) = Opcode::from_u8(frame.command) else {
        debug!("unknown command {=u8:#x}", frame.command);
        return;
    };

    if opcode.is_dfu() {
        engine.on_command(opcode, &frame.payload, sink);
        return;
    }

    match opcode {
        Opcode::PingRequest => sink.send(Opcode::PongResponse, &frame.payload),
        other => mesh::handle(other, &frame.payload),
    }
}
