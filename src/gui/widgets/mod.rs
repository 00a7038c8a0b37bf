use iced::{
    Element, Length,
    widget::{button, column, container, row, text},
};
use iced_widget::container::bordered_box;

use crate::acquisition::{ImageSource, PICKER_MESSAGE, PICKER_TITLE};

/// The classification label: idle prompt, progress, scores or the error
pub fn result_label<'a, Message: 'a>(content: String) -> Element<'a, Message> {
    container(text(content).size(18))
        .style(bordered_box)
        .padding(15)
        .width(Length::Fill)
        .into()
}

/// Camera-or-library choice, with a cancel button
pub fn source_prompt<'a, Message: Clone + 'a>(
    choices: &[ImageSource],
    on_choose: impl Fn(ImageSource) -> Message,
    on_cancel: Message,
) -> Element<'a, Message> {
    let mut buttons = row![].spacing(10);
    for &source in choices {
        buttons = buttons.push(button(source.label()).on_press(on_choose(source)));
    }
    buttons = buttons.push(button("Cancel").on_press(on_cancel));

    container(
        column![text(PICKER_TITLE).size(20), text(PICKER_MESSAGE), buttons].spacing(10),
    )
    .style(bordered_box)
    .padding(20)
    .max_width(480.0)
    .into()
}
