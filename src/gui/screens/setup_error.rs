use iced::{
    Alignment::Center,
    Element, Task,
    widget::{button, column, container, text},
};

use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
};

/// Shown when the models could not be loaded at start-up
#[derive(Debug, Clone)]
pub struct SetupErrorScreen {
    error: String,
}

impl SetupErrorScreen {
    pub fn new(error: String) -> Self {
        Self { error }
    }
}

#[derive(Debug, Clone)]
pub enum SetupErrorMessage {
    Retry,
}

#[derive(Debug, Clone)]
pub enum ParentMessage {
    Retry,
}

impl Screen for SetupErrorScreen {
    type Message = SetupErrorMessage;
    type ParentMessage = ParentMessage;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let content = column![
            text("Could not load the classification models").size(24),
            text(self.error.as_str()),
            button("Retry").on_press(ScreenMessage::ScreenMessage(SetupErrorMessage::Retry)),
        ]
        .spacing(20)
        .padding(20)
        .align_x(Center);

        container(content)
            .center_x(iced::Length::Fill)
            .center_y(iced::Length::Fill)
            .into()
    }

    fn update(
        &mut self,
        message: Self::Message,
        _state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match message {
            SetupErrorMessage::Retry => {
                Task::done(ScreenMessage::ParentMessage(ParentMessage::Retry))
            }
        }
    }
}
