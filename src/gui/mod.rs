mod app;
mod message;
mod screens;
mod state;
mod widgets;

pub use app::OtoFindApp;
pub use message::Message;
pub use state::AppState;

use crate::config::AppConfig;

/// Open the classification window and block until it is closed
pub fn run(config: AppConfig) -> iced::Result {
    iced::application(
        move || OtoFindApp::new(config.clone()),
        OtoFindApp::update,
        OtoFindApp::view,
    )
    .title(OtoFindApp::title)
    .run()
}
