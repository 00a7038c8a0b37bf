use crate::classification::{LoadError, ModelSet};
use crate::gui::screens::{
    ScreenData, ScreenMessage, classify::ClassifyScreen, loading_page::LoadingPageScreen,
    setup_error::SetupErrorScreen,
};

#[derive(Debug, Clone)]
pub enum Message {
    LoadingPage(ScreenMessage<LoadingPageScreen>),
    ClassifyPage(ScreenMessage<ClassifyScreen>),
    SetupErrorPage(ScreenMessage<SetupErrorScreen>),
    ChangeScreen(ScreenData),
    ModelsLoaded(Result<ModelSet, LoadError>),
}
