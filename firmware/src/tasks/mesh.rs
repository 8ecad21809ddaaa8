//! Mesh application collaborator. Instance setup and model state are owned
//! by the host application; here the commands are only surfaced in the log.

use defmt::{debug, info, warn};
use meshbridge_protocol::Opcode;

pub fn handle(opcode: Opcode, payload: &[u8]) {
    match opcode {
        Opcode::InitDeviceEvent => info!("modem requests device init"),
        Opcode::InitNodeEvent => info!("modem requests node init"),
        Opcode::AttentionEvent => {
            info!("attention {}", payload.first().copied().unwrap_or(0))
        }
        Opcode::FactoryResetEvent => info!("modem reports factory reset"),
        Opcode::Error => warn!(
            "modem error code {}",
            payload.first().copied().unwrap_or(0)
        ),
        other => debug!("unhandled command {} ({} bytes)", other, payload.len()),
    }
}
