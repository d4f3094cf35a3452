//! send_key primitive

use tracing::debug;

use crate::{
    errors::ActionError,
    host::KeyPhase,
    interpreter::ActionInterpreter,
    primitives::Outcome,
    types::KeyInput,
};

/// Apply a key to the focused text field.
///
/// `Enter` dispatches the keydown/keypress/keyup triad, `Backspace` drops the
/// last character, anything else is appended verbatim. Every branch ends
/// with one `input` event. Without a focused text field the literal text is
/// shown as a notification instead.
pub(crate) async fn execute_send_keys(
    interpreter: &ActionInterpreter,
    input: Option<&KeyInput>,
) -> Result<Outcome, ActionError> {
    let Some(input) = input else {
        return Ok(Outcome::skipped("no key given"));
    };
    let host = interpreter.host();

    let Some(field) = host.focused_text_field().await? else {
        debug!(key = %input.literal(), "no focused text field; showing notification");
        let toast = interpreter
            .config()
            .toast(format!("Type: \"{}\"", input.literal()));
        host.show_toast(&toast).await?;
        return Ok(Outcome::Performed);
    };

    match input {
        KeyInput::Enter => {
            for phase in KeyPhase::TRIAD {
                host.dispatch_key(&field, phase, "Enter").await?;
            }
        }
        KeyInput::Backspace => {
            let mut value = host.field_value(&field).await?;
            value.pop();
            host.set_field_value(&field, &value).await?;
        }
        KeyInput::Text(text) => {
            let mut value = host.field_value(&field).await?;
            value.push_str(text);
            host.set_field_value(&field, &value).await?;
        }
    }

    host.dispatch_input(&field).await?;
    Ok(Outcome::Performed)
}
