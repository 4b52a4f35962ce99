use crate::calculator::{Calculator, Key};
use crate::commands::Out;
use crate::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CalcOutput {
    /// The display as shown, possibly in exponential form.
    pub display: String,
}

/// Feeds `keys` to a fresh calculator and shows the resulting display. Each argument may hold
/// several keys, e.g. `12+3=`.
pub fn calc(keys: &[String]) -> Result<Out<CalcOutput>> {
    let mut calculator = Calculator::new();
    for arg in keys {
        calculator.press_all(Key::parse_all(arg)?);
    }
    let display = calculator.shown();
    Ok(Out::new(
        format!("Pressed {} key group(s)", keys.len()),
        CalcOutput {
            display: display.clone(),
        },
    )
    .with_output(display))
}
