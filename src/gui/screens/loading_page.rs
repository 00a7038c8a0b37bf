use std::convert::Infallible;

use iced::{
    Element, Length, Task,
    widget::{column, container, text},
};

use crate::classification::ModelSpec;
use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
};

/// Shown while the model files are read and parsed
#[derive(Debug, Clone)]
pub struct LoadingPageScreen {
    pending: Vec<String>,
}

impl LoadingPageScreen {
    pub fn new(specs: &[ModelSpec]) -> Self {
        Self {
            pending: specs
                .iter()
                .map(|spec| format!("{} ({})", spec.tag, spec.path.display()))
                .collect(),
        }
    }
}

impl Screen for LoadingPageScreen {
    type Message = Infallible;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let mut content = column![text("Loading classification models...").size(20)].spacing(6);
        for model in &self.pending {
            content = content.push(text(model.as_str()).size(14));
        }

        container(content)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn update(
        &mut self,
        message: Self::Message,
        _state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match message {}
    }
}
