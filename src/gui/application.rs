use iced::{Application, Command, ContentFit, Element, Length, Settings, Size, Subscription, executor, window};
use iced::event::{self, Event};
use iced::time::{every as iced_time_every};
use iced::theme::Theme;
use iced::widget::{container, image};
use std::time::Duration;
use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::brush::scene::Scene;
use crate::brush::state::BrushState;
use crate::config::types::CanvasConfig;
use crate::error::{AppRunError, DeviceError};
use crate::gui::types::Message;

pub struct ApplicationFlags {
    pub canvas: CanvasConfig,
    pub brush_receiver: watch::Receiver<BrushState>,
    pub input_cancel: CancellationToken,
    pub input_task: JoinHandle<Result<(), DeviceError>>,
}

pub struct PaintApplication {
    title: String,
    frame_interval: Duration,

    // cancelling this token stops the input decoder
    input_cancel: CancellationToken,
    input_task: JoinHandle<Result<(), DeviceError>>,
    input_stopped: bool,

    // latest brush state, published by the input decoder
    brush_receiver: watch::Receiver<BrushState>,
    scene: Scene,
    frame: image::Handle,
}

impl PaintApplication {
    fn before_close(&mut self) {
        self.input_cancel.cancel();
    }

    fn next_frame(&mut self) {
        if !self.input_stopped && self.input_task.is_finished() {
            warn!("The input decoder has stopped; the brush will no longer move");
            self.input_stopped = true;
        }

        let brush = *self.brush_receiver.borrow();
        let frame = self.scene.render(&brush);
        self.frame = image::Handle::from_pixels(frame.width(), frame.height(), frame.pixels().to_vec());
    }
}

impl Application for PaintApplication {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (PaintApplication, Command<Self::Message>) {
        let mut scene = Scene::new(&flags.canvas);
        let brush = *flags.brush_receiver.borrow();
        let first = scene.render(&brush);
        let frame = image::Handle::from_pixels(first.width(), first.height(), first.pixels().to_vec());

        let app = PaintApplication {
            title: flags.canvas.title.clone(),
            frame_interval: Duration::from_secs(1) / flags.canvas.frame_rate.max(1),
            input_cancel: flags.input_cancel,
            input_task: flags.input_task,
            input_stopped: false,
            brush_receiver: flags.brush_receiver,
            scene,
            frame,
        };

        (app, Command::none())
    }

    fn title(&self) -> String {
        if self.input_stopped {
            format!("{} (gamepad disconnected)", self.title)
        }
        else {
            self.title.clone()
        }
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::Frame(_) => {
                self.next_frame();
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                return window::close(id);
            },
            Message::EventOccurred(_) => {},
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen().map(Message::EventOccurred),
            iced_time_every(self.frame_interval).map(Message::Frame),
        ])
    }

    fn view(&self) -> Element<Message> {
        container(
            image(self.frame.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }
}

pub fn run_application(flags: ApplicationFlags) -> Result<(), AppRunError> {
    let size = Size::new(flags.canvas.width as f32, flags.canvas.height as f32);
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("tapete-brush".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = size;
    settings.window.resizable = false;

    PaintApplication::run(settings)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;
    use crate::config::types::Rgb;

    fn flags(input_task: JoinHandle<Result<(), DeviceError>>) -> (ApplicationFlags, watch::Sender<BrushState>, CancellationToken) {
        let canvas = CanvasConfig {
            width: 100,
            height: 100,
            background: Rgb(255, 255, 255),
            brush_color: Rgb(255, 0, 0),
            ..CanvasConfig::default()
        };
        let (brush_sender, brush_receiver) = watch::channel(BrushState::centered(100, 100));
        let input_cancel = CancellationToken::new();

        let flags = ApplicationFlags {
            canvas,
            brush_receiver,
            input_cancel: input_cancel.clone(),
            input_task,
        };
        (flags, brush_sender, input_cancel)
    }

    #[tokio::test]
    async fn close_request_cancels_the_input_decoder() {
        let (flags, _brush_sender, input_cancel) = flags(tokio::spawn(pending()));
        let (mut app, _) = PaintApplication::new(flags);

        let _ = app.update(Message::EventOccurred(Event::Window(window::Id::MAIN, window::Event::CloseRequested)));
        assert!(input_cancel.is_cancelled());
    }

    #[tokio::test]
    async fn frames_follow_the_mailbox() {
        let (flags, brush_sender, _) = flags(tokio::spawn(pending()));
        let (mut app, _) = PaintApplication::new(flags);

        brush_sender.send_replace(BrushState { x: 10, y: 10, painting: true });
        app.next_frame();
        brush_sender.send_replace(BrushState { x: 90, y: 90, painting: false });
        app.next_frame();

        assert!(app.scene.canvas().pixel(10, 10).is_some_and(|p| p.3 == 255));
        assert!(app.scene.canvas().pixel(90, 90).is_some_and(|p| p.3 == 0));
    }

    #[tokio::test]
    async fn finished_decoder_marks_the_title() {
        let task = tokio::spawn(async { Err(DeviceError::NotificationsEnded) });
        while !task.is_finished() {
            tokio::task::yield_now().await;
        }

        let (flags, _brush_sender, _) = flags(task);
        let (mut app, _) = PaintApplication::new(flags);
        assert_eq!(app.title(), "Tapete Corpus Christi - Pincel Virtual");

        app.next_frame();
        assert_eq!(app.title(), "Tapete Corpus Christi - Pincel Virtual (gamepad disconnected)");
    }
}
