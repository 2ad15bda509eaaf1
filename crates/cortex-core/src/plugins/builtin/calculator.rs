//! Floating pocket calculator.
//!
//! Keys are fed one at a time (`0`-`9`, `.`, `+ - * /`, parentheses, `C`,
//! `=`). The display is capped at 10 characters; anything unevaluable
//! shows `Error`.

use crate::error::Result;
use crate::plugins::{
    slots, EventBus, Plugin, PluginContext, PluginEvent, PluginManifest, SlotWidget,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const PLUGIN_ID: &str = "cortex.calculator";
const DISPLAY_CAP: usize = 10;

struct CalcState {
    open: AtomicBool,
    display: Mutex<String>,
}

impl CalcState {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(false),
            display: Mutex::new("0".to_string()),
        }
    }

    fn press(&self, key: &str) {
        let mut display = self.display.lock().expect("calculator lock poisoned");
        match key {
            "C" => *display = "0".to_string(),
            "=" => {
                *display = match evaluate(&display) {
                    Some(value) => format_result(value),
                    None => "Error".to_string(),
                };
            }
            _ => {
                if *display == "0" || *display == "Error" {
                    *display = key.to_string();
                } else {
                    display.push_str(key);
                }
            }
        }
    }

    fn display(&self) -> String {
        self.display.lock().expect("calculator lock poisoned").clone()
    }
}

fn format_result(value: f64) -> String {
    if !value.is_finite() {
        return "Error".to_string();
    }
    let mut text = if value == value.trunc() && value.abs() < 1e10 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    };
    text.truncate(DISPLAY_CAP);
    text
}

/// Evaluate a `+ - * /` expression with parentheses. Returns `None` on
/// malformed input or division by zero.
fn evaluate(expr: &str) -> Option<f64> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return None;
    }
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(literal.parse().ok()?));
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '/' {
                if rhs == 0.0 {
                    return None;
                }
                value /= rhs;
            } else {
                value *= rhs;
            }
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<f64> {
        match self.peek().cloned()? {
            Token::Number(n) => {
                self.pos += 1;
                Some(n)
            }
            Token::Op('-') => {
                self.pos += 1;
                Some(-self.factor()?)
            }
            Token::Open => {
                self.pos += 1;
                let value = self.expression()?;
                match self.peek() {
                    Some(Token::Close) => {
                        self.pos += 1;
                        Some(value)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

struct CalculatorWidget {
    state: Arc<CalcState>,
}

impl SlotWidget for CalculatorWidget {
    fn title(&self) -> &str {
        "Calculator"
    }

    fn interactive(&self) -> bool {
        true
    }

    fn on_event(&self, event: &PluginEvent) {
        if matches!(event, PluginEvent::ToggleWidget { plugin_id } if plugin_id == PLUGIN_ID) {
            self.state.open.fetch_xor(true, Ordering::SeqCst);
        }
    }

    fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
        if !self.state.open.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(vec![
            format!("[{:>width$}]", self.state.display(), width = DISPLAY_CAP),
            "7 8 9 /".to_string(),
            "4 5 6 *".to_string(),
            "1 2 3 -".to_string(),
            "C 0 = +".to_string(),
        ])
    }
}

struct CalculatorTrigger {
    bus: EventBus,
}

impl SlotWidget for CalculatorTrigger {
    fn title(&self) -> &str {
        "Calculator"
    }

    fn interactive(&self) -> bool {
        true
    }

    fn activate(&self) {
        self.bus.emit(PluginEvent::ToggleWidget {
            plugin_id: PLUGIN_ID.to_string(),
        });
    }

    fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
        Ok(vec!["Open calculator".to_string()])
    }
}

/// Floating calculator plugin.
pub struct CalculatorPlugin {
    manifest: PluginManifest,
    state: Arc<CalcState>,
}

impl CalculatorPlugin {
    pub fn new() -> Self {
        Self {
            manifest: PluginManifest::new(PLUGIN_ID, "Calculator Pro", "1.0")
                .with_description("Floating calculator"),
            state: Arc::new(CalcState::new()),
        }
    }

    /// Feed one key press; the shell routes input here while the panel is
    /// open.
    pub fn press(&self, key: &str) {
        self.state.press(key);
    }

    pub fn display(&self) -> String {
        self.state.display()
    }
}

impl Default for CalculatorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for CalculatorPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn init(&self, context: &mut PluginContext) -> Result<()> {
        context.register_slot(
            slots::GLOBAL_OVERLAY,
            Arc::new(CalculatorWidget {
                state: self.state.clone(),
            }),
        );
        context.register_slot(
            slots::SIDEBAR_ITEM,
            Arc::new(CalculatorTrigger {
                bus: context.events().clone(),
            }),
        );
        Ok(())
    }
}
