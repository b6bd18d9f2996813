//! This module is responsible for driving acquisition cycles and handing
//! calibrated frames to the output boundary
//!
//! One cycle = one blocking receive, one dispatch on the current mode.
//! Cycles are paced by an external tick channel; transition requests are
//! drained between cycles, never mid-cycle.

use std::time::Instant;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, warn};

use crate::calibration::CalibrationWindow;
use crate::error::CycleError;
use crate::process;
use crate::receiver::TaxelReceiver;
use crate::state::{Mode, ModeMachine, TransitionReply};
use crate::TAXELS;

/// Label stamped on every published frame
const FRAME_ID: &str = "world";

/// One calibrated frame, published once per successful recording cycle
#[derive(Clone, Debug)]
pub struct TaxelFrame {
    pub frame_id: &'static str,
    pub stamp: DateTime<Utc>,
    /// Sender of the raw datagram, as "ip:port"
    pub addr: String,
    pub data: [i32; TAXELS],
}

/// A mode change submitted over the control boundary.
/// The outcome goes back over the bundled reply channel.
pub struct ControlRequest {
    pub target: u8,
    pub reply: Sender<TransitionReply>,
}

/// Whether the driver should schedule another cycle
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CycleStatus {
    Continue,
    Stop,
}

pub struct Publisher {
    receiver: TaxelReceiver,
    window: CalibrationWindow,
    machine: ModeMachine,
    frames: Sender<TaxelFrame>,
    control: Receiver<ControlRequest>,
    received: u64,
    published: u64,
}

impl Publisher {
    pub fn new(
        receiver: TaxelReceiver,
        calibration_size: usize,
        frames: Sender<TaxelFrame>,
        control: Receiver<ControlRequest>,
    ) -> Self {
        Self {
            receiver,
            window: CalibrationWindow::new(calibration_size),
            machine: ModeMachine::new(),
            frames,
            control,
            received: 0,
            published: 0,
        }
    }

    /// Apply pending transition requests. Runs between cycles only, so a
    /// mode change is never observed while a frame is in flight.
    fn drain_control(&mut self) {
        while let Ok(req) = self.control.try_recv() {
            let reply = self.machine.request(req.target);
            let _ = req.reply.send(reply);
        }
    }

    /// Run one receive-decode-dispatch cycle
    pub fn cycle(&mut self) -> Result<CycleStatus, CycleError> {
        let (sample, addr) = self.receiver.recv_frame()?;
        self.received += 1;

        match self.machine.mode() {
            Mode::Calibrating => {
                let was_ready = self.window.is_ready();
                self.window.observe(&sample);
                if !was_ready && self.window.is_ready() {
                    info!("calibration window filled");
                }
                Ok(CycleStatus::Continue)
            }
            Mode::Recording => {
                if !self.window.is_ready() {
                    error!("uncalibrated sensor!");
                    return Err(CycleError::Uncalibrated);
                }
                // Recompute the baseline fresh each cycle; the window only
                // mutates while calibrating
                let reference = self.window.reference();
                match process::calibrate(&sample, &reference) {
                    Ok(data) => {
                        let frame = TaxelFrame {
                            frame_id: FRAME_ID,
                            stamp: Utc::now(),
                            addr: addr.to_string(),
                            data,
                        };
                        // A lagging consumer drops frames, it doesn't stall us
                        let _ = self.frames.try_send(frame);
                        self.published += 1;
                    }
                    Err(e) => error!("dropping frame: {}", e),
                }
                Ok(CycleStatus::Continue)
            }
            Mode::Terminating => {
                warn!("tactile publisher terminated");
                Ok(CycleStatus::Stop)
            }
        }
    }

    /// Drive cycles off the tick channel until told to stop or a cycle
    /// fails. Precondition failures and socket errors both land here.
    pub fn run(&mut self, tick: &Receiver<Instant>) -> Result<(), CycleError> {
        for _ in tick.iter() {
            self.drain_control();
            if self.cycle()? == CycleStatus::Stop {
                break;
            }
        }
        info!(
            "{} frames received, {} published",
            self.received, self.published
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::net::UdpSocket;

    struct Rig {
        publisher: Publisher,
        sender: UdpSocket,
        dest: std::net::SocketAddr,
        frames: Receiver<TaxelFrame>,
        control: Sender<ControlRequest>,
    }

    fn rig(calibration_size: usize) -> Rig {
        let receiver = TaxelReceiver::bind("127.0.0.1", 0).unwrap();
        let dest = receiver.local_addr().unwrap();
        let (frame_tx, frames) = bounded(10);
        let (control, control_rx) = bounded(4);
        Rig {
            publisher: Publisher::new(receiver, calibration_size, frame_tx, control_rx),
            sender: UdpSocket::bind("127.0.0.1:0").unwrap(),
            dest,
            frames,
            control,
        }
    }

    fn send_taxels(rig: &Rig, values: &[u16]) {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        rig.sender.send_to(&payload, rig.dest).unwrap();
    }

    fn transition(rig: &mut Rig, target: u8) -> TransitionReply {
        let (reply_tx, reply_rx) = bounded(1);
        rig.control
            .send(ControlRequest {
                target,
                reply: reply_tx,
            })
            .unwrap();
        rig.publisher.drain_control();
        reply_rx.recv().unwrap()
    }

    #[test]
    fn calibrates_then_publishes() {
        let mut rig = rig(2);

        send_taxels(&rig, &[100u16; TAXELS]);
        send_taxels(&rig, &[100u16; TAXELS]);
        assert_eq!(rig.publisher.cycle().unwrap(), CycleStatus::Continue);
        assert_eq!(rig.publisher.cycle().unwrap(), CycleStatus::Continue);
        // Calibration never publishes
        assert!(rig.frames.try_recv().is_err());

        assert!(transition(&mut rig, 1).success);

        send_taxels(&rig, &[105u16; TAXELS]);
        assert_eq!(rig.publisher.cycle().unwrap(), CycleStatus::Continue);

        let frame = rig.frames.try_recv().unwrap();
        assert_eq!(frame.frame_id, "world");
        assert_eq!(frame.data, [5i32; TAXELS]);
        assert_eq!(frame.addr, rig.sender.local_addr().unwrap().to_string());
    }

    #[test]
    fn recording_before_calibration_is_fatal() {
        let mut rig = rig(3);
        assert!(transition(&mut rig, 1).success);

        send_taxels(&rig, &[100u16; TAXELS]);
        assert!(matches!(
            rig.publisher.cycle(),
            Err(CycleError::Uncalibrated)
        ));
        assert!(rig.frames.try_recv().is_err());
    }

    #[test]
    fn terminating_stops_the_driver() {
        let mut rig = rig(1);
        assert!(transition(&mut rig, 99).success);

        send_taxels(&rig, &[0u16; TAXELS]);
        assert_eq!(rig.publisher.cycle().unwrap(), CycleStatus::Stop);
    }

    #[test]
    fn short_frames_do_not_calibrate() {
        let mut rig = rig(1);
        send_taxels(&rig, &[1u16; 4]);
        assert_eq!(rig.publisher.cycle().unwrap(), CycleStatus::Continue);
        assert!(!rig.publisher.window.is_ready());
    }

    #[test]
    fn short_frames_while_recording_skip_the_cycle() {
        let mut rig = rig(1);
        send_taxels(&rig, &[100u16; TAXELS]);
        rig.publisher.cycle().unwrap();
        assert!(transition(&mut rig, 1).success);

        send_taxels(&rig, &[1u16; 4]);
        assert_eq!(rig.publisher.cycle().unwrap(), CycleStatus::Continue);
        assert!(rig.frames.try_recv().is_err());
    }

    #[test]
    fn run_exits_cleanly_on_terminate() {
        let mut rig = rig(1);
        let (tick_tx, tick_rx) = bounded(1);
        tick_tx.send(Instant::now()).unwrap();

        let (reply_tx, _reply_rx) = bounded(1);
        rig.control
            .send(ControlRequest {
                target: 99,
                reply: reply_tx,
            })
            .unwrap();
        send_taxels(&rig, &[0u16; TAXELS]);

        rig.publisher.run(&tick_rx).unwrap();
    }
}
