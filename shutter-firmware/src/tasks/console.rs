//! Console UART receive task
//!
//! Collects bytes from the serial console into lines and dispatches the
//! parsed commands.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use shutter_core::console::{Command, LineBuffer};

use crate::channels::{SchedulerCommand, CONTROL_CMD, MEASURE_STOP, SCHEDULER_CMD};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Console RX task - receives and parses command lines
#[embassy_executor::task]
pub async fn console_task(mut rx: BufferedUartRx) {
    info!("Console task started");

    let mut lines = LineBuffer::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    match lines.feed(byte) {
                        Some(Ok(cmd)) => dispatch(cmd).await,
                        Some(Err(e)) => warn!("Rejected command: {}", e),
                        None => {}
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Route a command to the task that owns its resource
async fn dispatch(cmd: Command) {
    debug!("Command: {}", cmd);
    match cmd {
        // The control task is busy measuring, so the stop goes around it
        Command::Stop => MEASURE_STOP.signal(()),
        Command::SetClock(time) => SCHEDULER_CMD.send(SchedulerCommand::SetClock(time)).await,
        Command::Preview => SCHEDULER_CMD.send(SchedulerCommand::Preview).await,
        other => {
            if CONTROL_CMD.try_send(other).is_err() {
                warn!("Control busy, dropping command");
            }
        }
    }
}
