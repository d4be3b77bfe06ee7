use log::{debug, error, info, warn};
use tokio::spawn;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::brush::state::BrushState;
use crate::device::sample::Sample;
use crate::device::source::SampleSource;
use crate::error::DeviceError;

/// Turns raw reports into brush movement and publishes the latest brush state.
pub struct InputDecoder {
    width: u32,
    height: u32,
    brush: BrushState,
    brush_sender: watch::Sender<BrushState>,
}

impl InputDecoder {
    /// Starts from whatever brush state is currently in the mailbox.
    pub fn new(width: u32, height: u32, brush_sender: watch::Sender<BrushState>) -> Self {
        let brush = *brush_sender.borrow();
        InputDecoder { width, height, brush, brush_sender }
    }

    /// Applies one payload. Payloads that are too short are dropped without a trace.
    pub fn handle_payload(&mut self, data: &[u8]) {
        let sample = match Sample::parse(data) {
            Some(sample) => sample,
            None => return,
        };

        self.brush.apply(sample.delta(self.width, self.height), sample.painting(), self.width, self.height);
        self.brush_sender.send_replace(self.brush);
    }

    /// Runs until cancelled or until the source fails in a way that ends the connection.
    pub async fn run<S: SampleSource>(mut self, cancel: CancellationToken, mut source: S) -> Result<(), DeviceError> {
        'mainloop: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                result = source.next_payload() => match result {
                    Ok(data) => self.handle_payload(&data),
                    Err(err) if err.is_fatal() => {
                        error!("Lost the gamepad, no more input will be read: {}", err);
                        return Err(err);
                    },
                    Err(err) => {
                        warn!("Failed to process gamepad data: {}", err);
                    },
                },
            }
        }

        debug!("Input decoder cancelled");
        Ok(())
    }
}

pub fn spawn_input_decoder<S>(
    cancel: CancellationToken,
    source: S,
    width: u32,
    height: u32,
    brush_sender: watch::Sender<BrushState>,
) -> JoinHandle<Result<(), DeviceError>>
where
    S: SampleSource + Send + 'static,
{
    info!("Starting input decoder for a {}x{} canvas", width, height);
    let decoder = InputDecoder::new(width, height, brush_sender);
    spawn(decoder.run(cancel, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::pending;

    /// Replays a script, then blocks forever like an idle peripheral.
    struct ScriptedSource {
        script: VecDeque<Result<Vec<u8>, DeviceError>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<u8>, DeviceError>>) -> Self {
            ScriptedSource { script: script.into() }
        }
    }

    impl SampleSource for ScriptedSource {
        async fn next_payload(&mut self) -> Result<Vec<u8>, DeviceError> {
            match self.script.pop_front() {
                Some(item) => item,
                None => pending().await,
            }
        }
    }

    fn payload(x: i16, y: i16, buttons: i8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&x.to_le_bytes());
        data.extend_from_slice(&y.to_le_bytes());
        data.push(buttons as u8);
        data.push(0);
        data
    }

    fn mailbox() -> (watch::Sender<BrushState>, watch::Receiver<BrushState>) {
        watch::channel(BrushState::centered(900, 900))
    }

    #[test]
    fn sample_moves_the_brush_and_sets_painting() {
        let (tx, rx) = mailbox();
        let mut decoder = InputDecoder::new(900, 900, tx);

        decoder.handle_payload(&payload(16383, -16383, 1));
        assert_eq!(*rx.borrow(), BrushState { x: 600, y: 300, painting: true });

        decoder.handle_payload(&payload(0, 0, 0));
        assert_eq!(*rx.borrow(), BrushState { x: 600, y: 300, painting: false });
    }

    #[test]
    fn short_payload_changes_nothing() {
        let (tx, rx) = mailbox();
        let mut decoder = InputDecoder::new(900, 900, tx);

        decoder.handle_payload(&[0xFF, 0x7F, 0xFF, 0x7F, 0x01]);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), BrushState::centered(900, 900));
    }

    #[test]
    fn repeated_full_deflection_stays_on_the_canvas() {
        let (tx, rx) = mailbox();
        let mut decoder = InputDecoder::new(900, 900, tx);

        for _ in 0..5 {
            decoder.handle_payload(&payload(i16::MAX, i16::MAX, 0));
        }
        let brush = *rx.borrow();
        assert_eq!((brush.x, brush.y), (900, 900));

        for _ in 0..5 {
            decoder.handle_payload(&payload(i16::MIN, i16::MIN, 0));
        }
        let brush = *rx.borrow();
        assert_eq!((brush.x, brush.y), (0, 0));
    }

    #[tokio::test]
    async fn recoverable_errors_do_not_stop_the_loop() {
        let (tx, mut rx) = mailbox();
        let source = ScriptedSource::new(vec![
            Err(DeviceError::from(btleplug::Error::RuntimeError("busy".to_string()))),
            Ok(vec![1, 2]),
            Ok(payload(32767, 0, 1)),
        ]);
        let cancel = CancellationToken::new();
        let handle = spawn_input_decoder(cancel.clone(), source, 900, 900, tx);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), BrushState { x: 750, y: 450, painting: true });

        cancel.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn fatal_error_ends_the_task() {
        let (tx, rx) = mailbox();
        let source = ScriptedSource::new(vec![
            Ok(payload(0, 3277, 0)),
            Err(DeviceError::from(btleplug::Error::NotConnected)),
            Ok(payload(32767, 32767, 1)),
        ]);
        let handle = spawn_input_decoder(CancellationToken::new(), source, 900, 900, tx);

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(DeviceError::Btle { source: btleplug::Error::NotConnected })));
        // nothing after the disconnect was applied
        assert_eq!(*rx.borrow(), BrushState { x: 450, y: 480, painting: false });
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_pending_read() {
        let (tx, _rx) = mailbox();
        let cancel = CancellationToken::new();
        let handle = spawn_input_decoder(cancel.clone(), ScriptedSource::new(vec![]), 900, 900, tx);

        cancel.cancel();
        assert!(handle.await.unwrap().is_ok());
    }
}
