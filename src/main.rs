use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::bounded;
use taxel_stream::args::{convert_filter, Args};
use taxel_stream::error::CycleError;
use taxel_stream::publisher::{ControlRequest, Publisher, TaxelFrame};
use taxel_stream::receiver::TaxelReceiver;
use tracing::{error, info};

fn main() -> Result<(), CycleError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(convert_filter(args.verbose.log_level_filter()))
        .init();

    let receiver = TaxelReceiver::bind(&args.ip, args.port)?;
    info!("listening on {}:{}", args.ip, args.port);

    // Frame channel to the output boundary and the operator control channel
    let (frame_tx, frame_rx) = bounded::<TaxelFrame>(10);
    let (control_tx, control_rx) = bounded::<ControlRequest>(4);

    // Ctrl-C requests the same clean shutdown an operator transition does;
    // nobody waits on the reply
    ctrlc::set_handler(move || {
        let (reply_tx, _reply_rx) = bounded(1);
        let _ = control_tx.try_send(ControlRequest {
            target: 99,
            reply: reply_tx,
        });
    })
    .expect("failed to install ctrl-c handler");

    // Stand-in consumer at the output boundary: log what would be published
    let consumer = thread::spawn(move || {
        for frame in frame_rx {
            let peak = frame.data.iter().copied().max().unwrap_or(0);
            info!(
                "{} {} peak={} data={:?}",
                frame.stamp, frame.addr, peak, frame.data
            );
        }
    });

    let mut publisher = Publisher::new(receiver, args.calibration_size, frame_tx, control_rx);
    info!("node started in state: calibration");

    let tick = crossbeam_channel::tick(Duration::from_millis(args.period_ms));
    let result = publisher.run(&tick);

    // Dropping the publisher closes the frame channel so the consumer drains
    drop(publisher);
    let _ = consumer.join();

    if let Err(ref e) = result {
        if e.is_precondition() {
            error!("stopping cycles: {}", e);
        }
    }
    result
}
