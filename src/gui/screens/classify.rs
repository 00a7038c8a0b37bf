use std::convert::Infallible;
use std::path::PathBuf;

use iced::{
    Alignment::Center,
    Element, Length, Task,
    widget::{button, column, container, image::Handle, text},
};
use rfd::AsyncFileDialog;

use crate::acquisition::{self, AcquiredImage, IMAGE_EXTENSIONS, ImageSource, PICKER_TITLE};
use crate::config::AppConfig;
use crate::display::ResultFormatter;
use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
    widgets::{result_label, source_prompt},
};
use crate::models::InferenceReport;

/// The single screen of the app: pick a photo, see both scores.
#[derive(Debug, Clone)]
pub struct ClassifyScreen {
    formatter: ResultFormatter,
    preview: Option<Handle>,
    prompt_open: bool,
    camera_available: bool,
    model_count: usize,
    notice: Option<String>,
}

/// An acquired photo plus its upright preview, both prepared off the UI thread
#[derive(Debug, Clone)]
pub struct Picked {
    acquired: AcquiredImage,
    preview: Handle,
}

#[derive(Debug, Clone)]
pub enum ClassifyMessage {
    TakePicture,
    SourceChosen(ImageSource),
    PromptCancelled,
    FileChosen(PathBuf),
    PickerClosed,
    ImageAcquired(Result<Picked, String>),
    Classified(InferenceReport),
}

impl ClassifyScreen {
    pub fn new(config: &AppConfig, model_count: usize) -> Self {
        Self {
            formatter: ResultFormatter::new(config.merge_policy, config.precision),
            preview: None,
            prompt_open: false,
            camera_available: config.camera_available(),
            model_count,
            notice: None,
        }
    }

    fn acquire(&self, source: ImageSource, state: &AppState) -> Task<ScreenMessage<Self>> {
        match source {
            ImageSource::Library => Task::perform(
                AsyncFileDialog::new()
                    .set_title(PICKER_TITLE)
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file(),
                |handle| match handle {
                    Some(file) => ScreenMessage::ScreenMessage(ClassifyMessage::FileChosen(
                        file.path().to_path_buf(),
                    )),
                    None => ScreenMessage::ScreenMessage(ClassifyMessage::PickerClosed),
                },
            ),
            ImageSource::Camera => {
                let command = state.config.camera_command.clone().unwrap_or_default();
                Task::perform(
                    prepare(move || acquisition::capture_with_command(&command)),
                    |picked| ScreenMessage::ScreenMessage(ClassifyMessage::ImageAcquired(picked)),
                )
            }
        }
    }

    fn classify(&mut self, picked: Picked, state: &AppState) -> Task<ScreenMessage<Self>> {
        self.preview = Some(picked.preview);

        let Some(runner) = state.runner.as_ref() else {
            self.formatter.reset();
            self.notice = Some("Classification models are not loaded".to_string());
            return Task::none();
        };

        match runner.submit(picked.acquired.into_request()) {
            Ok(submission) => {
                // Shows "Classifying..." before any model has run
                self.formatter.begin(submission.request);
                let timeout = state.config.result_timeout;
                Task::batch(submission.handles.into_iter().map(|handle| {
                    log::debug!("Waiting for '{}' on request {}", handle.tag(), handle.request());
                    Task::perform(handle.outcome_within(timeout), |report| {
                        ScreenMessage::ScreenMessage(ClassifyMessage::Classified(report))
                    })
                }))
            }
            Err(e) => {
                log::error!("Could not submit image: {:#}", e);
                // The preview already shows the new photo, so old scores must go
                self.formatter.reset();
                self.notice = Some(e.to_string());
                Task::none()
            }
        }
    }
}

impl Screen for ClassifyScreen {
    type Message = ClassifyMessage;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let mut content = column![text("OtoFind").size(32)]
            .spacing(20)
            .padding(20)
            .align_x(Center);

        if let Some(preview) = &self.preview {
            content = content.push(iced::widget::image(preview.clone()).height(Length::Fixed(320.0)));
        }

        content = content.push(result_label(self.formatter.render()));

        if let Some(notice) = &self.notice {
            content = content.push(text(notice.as_str()));
        }

        if self.prompt_open {
            content = content.push(source_prompt(
                &acquisition::source_choices(self.camera_available),
                |source| ScreenMessage::ScreenMessage(ClassifyMessage::SourceChosen(source)),
                ScreenMessage::ScreenMessage(ClassifyMessage::PromptCancelled),
            ));
        } else {
            content = content.push(
                button("Take Picture")
                    .on_press(ScreenMessage::ScreenMessage(ClassifyMessage::TakePicture)),
            );
        }

        container(content)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match message {
            ClassifyMessage::TakePicture => {
                if self.camera_available {
                    self.prompt_open = true;
                    Task::none()
                } else {
                    self.acquire(ImageSource::Library, state)
                }
            }
            ClassifyMessage::SourceChosen(source) => {
                self.prompt_open = false;
                self.acquire(source, state)
            }
            ClassifyMessage::PromptCancelled => {
                self.prompt_open = false;
                Task::none()
            }
            ClassifyMessage::FileChosen(path) => Task::perform(
                prepare(move || acquisition::decode_file(&path)),
                |picked| ScreenMessage::ScreenMessage(ClassifyMessage::ImageAcquired(picked)),
            ),
            ClassifyMessage::PickerClosed => Task::none(),
            ClassifyMessage::ImageAcquired(Ok(picked)) => {
                self.notice = None;
                self.classify(picked, state)
            }
            ClassifyMessage::ImageAcquired(Err(error)) => {
                log::warn!("Could not acquire image: {}", error);
                self.notice = Some(error);
                Task::none()
            }
            ClassifyMessage::Classified(report) => {
                if self.formatter.apply(report) && self.formatter.is_settled(self.model_count) {
                    log::debug!("Classification finished: {:?}", self.formatter.state());
                }
                Task::none()
            }
        }
    }
}

/// Decode on a blocking thread and build the upright preview there too
async fn prepare<F>(acquire: F) -> Result<Picked, String>
where
    F: FnOnce() -> anyhow::Result<AcquiredImage> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> anyhow::Result<Picked> {
        let acquired = acquire()?;
        let rgba = acquired.upright().to_rgba8();
        let preview = Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw());
        Ok(Picked { acquired, preview })
    })
    .await
    .map_err(|e| e.to_string())?
    .map_err(|e: anyhow::Error| format!("{:#}", e))
}
