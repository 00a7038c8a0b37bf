pub mod classify;
pub mod loading_page;
pub mod setup_error;

use iced::{Element, Task};

use crate::gui::{AppState, Message, app::load_models};
use crate::inference::InferenceRunner;

#[derive(Debug, Clone)]
pub enum ScreenMessage<S: Screen> {
    ScreenMessage(S::Message),
    ParentMessage(S::ParentMessage),
}

pub trait Screen: Sized {
    type Message: std::fmt::Debug;
    type ParentMessage: std::fmt::Debug;
    fn view(&self) -> Element<'_, ScreenMessage<Self>>;
    fn update(&mut self, message: Self::Message, state: &mut AppState)
    -> Task<ScreenMessage<Self>>;
}

#[derive(Debug, Clone)]
pub enum ScreenData {
    LoadingPage(loading_page::LoadingPageScreen),
    ClassifyPage(classify::ClassifyScreen),
    SetupErrorPage(setup_error::SetupErrorScreen),
}

impl Screen for ScreenData {
    type Message = Message;
    type ParentMessage = std::convert::Infallible;
    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        match self {
            ScreenData::LoadingPage(screen) => screen.view().map(Message::LoadingPage),
            ScreenData::ClassifyPage(screen) => screen.view().map(Message::ClassifyPage),
            ScreenData::SetupErrorPage(screen) => screen.view().map(Message::SetupErrorPage),
        }
        .map(ScreenMessage::ScreenMessage)
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match (self, message) {
            (x, Message::ChangeScreen(screen)) => {
                *x = screen;
                Task::none()
            }
            (x, Message::ModelsLoaded(result)) => {
                let runner = result
                    .map_err(|e| e.to_string())
                    .and_then(|models| InferenceRunner::new(models).map_err(|e| e.to_string()));

                match runner {
                    Ok(runner) => {
                        log::info!("Models ready: {}", runner.tags().join(", "));
                        let screen = classify::ClassifyScreen::new(&state.config, runner.tags().len());
                        state.runner = Some(runner);
                        *x = ScreenData::ClassifyPage(screen);
                    }
                    Err(error) => {
                        log::error!("Setup failed: {}", error);
                        state.runner = None;
                        *x = ScreenData::SetupErrorPage(setup_error::SetupErrorScreen::new(error));
                    }
                }
                Task::none()
            }
            (ScreenData::ClassifyPage(page), Message::ClassifyPage(msg)) => match msg {
                ScreenMessage::ScreenMessage(msg) => page
                    .update(msg, state)
                    .map(Message::ClassifyPage)
                    .map(ScreenMessage::ScreenMessage),
                ScreenMessage::ParentMessage(never) => match never {},
            },
            (ScreenData::SetupErrorPage(page), Message::SetupErrorPage(msg)) => match msg {
                ScreenMessage::ScreenMessage(msg) => page
                    .update(msg, state)
                    .map(Message::SetupErrorPage)
                    .map(ScreenMessage::ScreenMessage),
                ScreenMessage::ParentMessage(setup_error::ParentMessage::Retry) => {
                    Task::done(ScreenMessage::ScreenMessage(Message::ChangeScreen(
                        ScreenData::LoadingPage(loading_page::LoadingPageScreen::new(
                            &state.config.models,
                        )),
                    )))
                    .chain(load_models(state.config.models.clone()).map(ScreenMessage::ScreenMessage))
                }
            },
            _ => Task::none(),
        }
    }
}
