use std::env;
use std::path::PathBuf;
use std::time::Duration;
use log::info;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::brush::state::BrushState;
use crate::config::io::ConfigIO;
use crate::config::types::{Config, InputMode};
use crate::device::connection::connect;
use crate::device::decoder::spawn_input_decoder;
use crate::device::source::{CharacteristicReader, NotifiedSource, Paced};
use crate::error::AppRunError;
use crate::gui::application::{run_application, ApplicationFlags};

pub mod brush;
pub mod config;
pub mod device;
pub mod error;
pub mod gui;

pub fn init_logging() {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

/// Overrides given on the command line; `None` keeps the configured value.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub address: Option<String>,
}

pub fn run(options: RunOptions) -> Result<(), AppRunError> {
    // without a usable config file the defaults apply and there is no instance lock
    let mut config_io = ConfigIO::open(options.config_path.as_deref())?;
    let mut config_locker = match &mut config_io {
        Some(config_io) => Some(config_io.locker()?),
        None => None,
    };
    let _lock_guard = match &mut config_locker {
        Some(locker) => Some(locker.lock()?),
        None => None,
    };

    let runtime = Runtime::new().map_err(|source| AppRunError::Runtime { source })?;

    let mut config: Config = match &config_io {
        Some(config_io) => runtime.block_on(config_io.read_or_init())?,
        None => Config::default(),
    };
    if let Some(address) = options.address {
        config.device.address = address;
    }
    config.validate()?;
    let characteristic_uuid = config.device.characteristic_uuid()?;

    let connection = runtime.block_on(connect(&config.device, characteristic_uuid))?;
    info!("Connected to the gamepad");
    let subscribed = config.device.mode == InputMode::Notify;

    let (brush_sender, brush_receiver) = watch::channel(BrushState::centered(config.canvas.width, config.canvas.height));
    let input_cancel = CancellationToken::new();
    let (width, height) = (config.canvas.width, config.canvas.height);

    let input_task = match config.device.mode {
        InputMode::Poll => {
            // the poll interval is bound to the runtime it is created in
            let _enter = runtime.enter();
            let source = Paced::new(
                CharacteristicReader::new(connection.peripheral.clone(), connection.characteristic.clone()),
                Duration::from_millis(config.device.poll_interval_ms),
            );
            spawn_input_decoder(input_cancel.clone(), source, width, height, brush_sender)
        },
        InputMode::Notify => {
            let source = match runtime.block_on(NotifiedSource::subscribe(&connection.peripheral, connection.characteristic.clone())) {
                Ok(source) => source,
                Err(err) => {
                    runtime.block_on(connection.disconnect(false));
                    runtime.shutdown_background();
                    return Err(err.into());
                },
            };
            let _enter = runtime.enter();
            spawn_input_decoder(input_cancel.clone(), source, width, height, brush_sender)
        },
    };
    info!("Reading gamepad input in {} mode", config.device.mode);

    let result = run_application(ApplicationFlags {
        canvas: config.canvas,
        brush_receiver,
        input_cancel: input_cancel.clone(),
        input_task,
    });

    // also covers startup errors of the window
    input_cancel.cancel();
    runtime.block_on(connection.disconnect(subscribed));
    runtime.shutdown_background();
    result
}
