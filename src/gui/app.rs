use iced::{Element, Task};

use super::{AppState, Message};
use crate::classification::{LoadError, ModelSet, ModelSpec};
use crate::config::AppConfig;
use crate::gui::screens::{Screen, ScreenData, ScreenMessage, loading_page::LoadingPageScreen};

pub struct OtoFindApp {
    state: AppState,
    screen: ScreenData,
}

impl OtoFindApp {
    pub fn new(config: AppConfig) -> (Self, Task<Message>) {
        let specs = config.models.clone();
        let screen = ScreenData::LoadingPage(LoadingPageScreen::new(&specs));
        (
            Self {
                state: AppState::new(config),
                screen,
            },
            load_models(specs),
        )
    }

    pub fn title(&self) -> String {
        "OtoFind - Otitis Media Screening".to_string()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        self.screen
            .update(message, &mut self.state)
            .map(unwrap_screen_message)
    }

    pub fn view(&self) -> Element<'_, Message> {
        self.screen.view().map(unwrap_screen_message)
    }
}

fn unwrap_screen_message(message: ScreenMessage<ScreenData>) -> Message {
    match message {
        ScreenMessage::ScreenMessage(message) => message,
        ScreenMessage::ParentMessage(never) => match never {},
    }
}

/// Load the models on a blocking thread
pub fn load_models(specs: Vec<ModelSpec>) -> Task<Message> {
    Task::perform(
        async move {
            tokio::task::spawn_blocking(move || ModelSet::load(&specs))
                .await
                .unwrap_or_else(|e| Err(LoadError::Interrupted(e.to_string())))
        },
        Message::ModelsLoaded,
    )
}
