//! A four-function pocket calculator driven one key at a time.
//!
//! It holds at most one pending operation: pressing an operator while another is pending applies
//! the pending one first, so `2 + 3 * 4 =` shows `20`.

use crate::error::validation;
use crate::Result;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// The longest display shown as is. Longer values are shown in exponential form.
const MAX_DISPLAY: usize = 9;
const ERROR: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// `None` when the result is not a finite number, e.g. division by zero.
    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        let value = match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide if rhs == 0.0 => return None,
            Operator::Divide => lhs / rhs,
        };
        value.is_finite().then_some(value)
    }
}

/// One calculator button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Decimal,
    Op(Operator),
    Equals,
    Clear,
}

impl Key {
    pub fn from_char(c: char) -> Option<Key> {
        Some(match c {
            '0'..='9' => Key::Digit(c as u8 - b'0'),
            '.' => Key::Decimal,
            '+' => Key::Op(Operator::Add),
            '-' => Key::Op(Operator::Subtract),
            '*' | 'x' | '×' => Key::Op(Operator::Multiply),
            '/' | '÷' => Key::Op(Operator::Divide),
            '=' => Key::Equals,
            'c' | 'C' => Key::Clear,
            _ => return None,
        })
    }

    /// Parses every non-whitespace character of `input` as a key, e.g. `"12+3="`.
    pub fn parse_all(input: &str) -> Result<Vec<Key>> {
        input
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| Key::from_char(c).ok_or_else(|| validation(format!("Unknown key '{c}'"))))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calculator {
    display: String,
    accumulator: Option<f64>,
    operator: Option<Operator>,
    waiting_for_operand: bool,
}

impl Default for Calculator {
    fn default() -> Self {
        Self {
            display: "0".to_string(),
            accumulator: None,
            operator: None,
            waiting_for_operand: true,
        }
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw display text.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The display as the user sees it: values longer than nine characters are shown in
    /// exponential form with three fractional digits.
    pub fn shown(&self) -> String {
        if self.display.len() <= MAX_DISPLAY {
            return self.display.clone();
        }
        match self.display.parse::<f64>() {
            Ok(value) => exponential(value),
            Err(_) => self.display.clone(),
        }
    }

    pub fn press(&mut self, key: Key) {
        match key {
            Key::Digit(d) => {
                let digit = char::from(b'0' + d.min(9));
                if self.waiting_for_operand || self.display == ERROR {
                    self.display = digit.to_string();
                    self.waiting_for_operand = false;
                } else if self.display == "0" {
                    self.display = digit.to_string();
                } else {
                    self.display.push(digit);
                }
            }
            Key::Decimal => {
                if self.waiting_for_operand || self.display == ERROR {
                    self.display = "0.".to_string();
                    self.waiting_for_operand = false;
                } else if !self.display.contains('.') {
                    self.display.push('.');
                }
            }
            Key::Op(op) => {
                if self.waiting_for_operand && self.operator.is_some() {
                    // Consecutive operators: the last one wins.
                    self.operator = Some(op);
                    return;
                }
                let input = self.input();
                match (self.accumulator, self.operator) {
                    (Some(lhs), Some(pending)) => match pending.apply(lhs, input) {
                        Some(result) => {
                            self.accumulator = Some(result);
                            self.display = format_number(result);
                        }
                        None => return self.fail(),
                    },
                    _ => self.accumulator = Some(input),
                }
                self.operator = Some(op);
                self.waiting_for_operand = true;
            }
            Key::Equals => {
                if let (Some(lhs), Some(pending)) = (self.accumulator, self.operator) {
                    match pending.apply(lhs, self.input()) {
                        Some(result) => {
                            self.display = format_number(result);
                            self.accumulator = None;
                            self.operator = None;
                            self.waiting_for_operand = true;
                        }
                        None => self.fail(),
                    }
                }
            }
            Key::Clear => *self = Self::default(),
        }
    }

    /// Presses every key in order and returns the shown display.
    pub fn press_all(&mut self, keys: impl IntoIterator<Item = Key>) -> String {
        for key in keys {
            self.press(key);
        }
        self.shown()
    }

    fn input(&self) -> f64 {
        self.display.parse().unwrap_or(0.0)
    }

    /// Shows `Error` and forgets the pending operation.
    fn fail(&mut self) {
        *self = Self {
            display: ERROR.to_string(),
            ..Self::default()
        };
    }
}

impl Display for Calculator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.shown())
    }
}

fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoids showing "-0".
        return "0".to_string();
    }
    value.to_string()
}

/// `1234567890.0` becomes `1.235e+9`.
fn exponential(value: f64) -> String {
    let formatted = format!("{value:.3e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}
